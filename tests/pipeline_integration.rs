//! パイプライン統合テスト
//!
//! モックアダプタで全ステージを通し、1サイクルの観測から
//! 経済状態が組み上がるまでを検証する。

use tablesight::application::pipeline::PipelineRunner;
use tablesight::application::stage::Stage;
use tablesight::application::stages::{
    CaptureStage, DetectorStage, OcrFusionStage, SelfCheckStage, WindowLocatorStage,
};
use tablesight::domain::config::{
    DetectorConfig, LocatorConfig, OcrConfig, PipelineConfig, SelfCheckConfig,
};
use tablesight::domain::types::{
    labels, BoundingBox, Detection, Frame, TableFormat, WindowDescriptor, WindowRect,
};
use tablesight::infrastructure::mock_capture::{MockFrameSource, MockWindowEnumerator};
use tablesight::infrastructure::mock_detect::MockDetectionModel;
use tablesight::infrastructure::mock_ocr::MockRecognizer;

const FRAME_SIZE: u32 = 400;

/// 輝度128の一様フレーム（セルフチェックを通過する）
fn lit_frame() -> Frame {
    Frame::new(
        vec![128u8; (FRAME_SIZE * FRAME_SIZE * 4) as usize],
        FRAME_SIZE,
        FRAME_SIZE,
    )
}

fn table_window() -> WindowDescriptor {
    WindowDescriptor {
        title: "NL Holdem Table #7".to_string(),
        rect: WindowRect::new(0, 0, FRAME_SIZE, FRAME_SIZE),
    }
}

fn det(label: &str, bbox: BoundingBox) -> Detection {
    Detection {
        label: label.to_string(),
        confidence: 0.9,
        bbox,
    }
}

fn locator_config() -> LocatorConfig {
    LocatorConfig {
        scan_interval_ms: 1,
        ..LocatorConfig::default()
    }
}

fn self_check_config() -> SelfCheckConfig {
    SelfCheckConfig {
        interval_ms: 0,
        black_threshold: 5.0,
    }
}

fn build_runner(
    enumerator: MockWindowEnumerator,
    source: MockFrameSource,
    model: MockDetectionModel,
    recognizer: MockRecognizer,
) -> PipelineRunner {
    let stages: Vec<Box<dyn Stage>> = vec![
        Box::new(WindowLocatorStage::new(enumerator, &locator_config())),
        Box::new(CaptureStage::new(source)),
        Box::new(SelfCheckStage::new(&self_check_config())),
        Box::new(DetectorStage::new(Some(model), &DetectorConfig::default())),
        Box::new(OcrFusionStage::new(Some(recognizer), &OcrConfig::default())),
    ];
    PipelineRunner::new(stages, &PipelineConfig::default())
}

#[test]
fn test_full_cycle_extracts_pot_and_hero_turn() {
    let enumerator = MockWindowEnumerator::new(vec![Ok(vec![table_window()])]);
    let source = MockFrameSource::repeating(lit_frame(), 10);
    let model = MockDetectionModel::fixed(vec![
        det(labels::POT_TEXT, BoundingBox::new(180.0, 120.0, 220.0, 140.0)),
        det(
            labels::HERO_ACTIVE,
            BoundingBox::new(180.0, 320.0, 220.0, 360.0),
        ),
        // ヒーロー席アンカー(0.5, 0.68)付近のスタック表示
        det(
            labels::STACK_TEXT,
            BoundingBox::new(190.0, 265.0, 210.0, 280.0),
        ),
    ]);
    let recognizer = MockRecognizer::new(vec!["1.2k"]);

    let mut runner = build_runner(enumerator, source, model, recognizer);
    runner.run_cycle();

    let ctx = runner.context();
    assert_eq!(ctx.window_title.as_deref(), Some("NL Holdem Table #7"));
    assert!(ctx.system_checked);
    assert!(ctx.vision_ok);
    assert!(ctx.hero_active);
    assert_eq!(ctx.economy.pot, 1200.0);
    // スクリプト切れのレコグナイザは最後のテキストを繰り返す
    assert_eq!(ctx.economy.stacks.get(&0), Some(&1200.0));
}

#[test]
fn test_blinds_parsed_from_tracked_title() {
    let titled = WindowDescriptor {
        title: "NL Holdem $0.50/$1.00 - Table 3".to_string(),
        rect: WindowRect::new(0, 0, FRAME_SIZE, FRAME_SIZE),
    };
    let enumerator = MockWindowEnumerator::new(vec![Ok(vec![titled])]);
    let source = MockFrameSource::repeating(lit_frame(), 10);
    let model = MockDetectionModel::fixed(vec![]);
    let recognizer = MockRecognizer::new(vec!["0"]);

    let mut runner = build_runner(enumerator, source, model, recognizer);
    runner.run_cycle();

    let blinds = runner.context().blinds.unwrap();
    assert_eq!(blinds.small, 0.5);
    assert_eq!(blinds.big, 1.0);
}

#[test]
fn test_median_fusion_rejects_ocr_outlier() {
    let enumerator = MockWindowEnumerator::new(vec![Ok(vec![table_window()])]);
    let source = MockFrameSource::repeating(lit_frame(), 10);
    let model = MockDetectionModel::fixed(vec![det(
        labels::POT_TEXT,
        BoundingBox::new(180.0, 120.0, 220.0, 140.0),
    )]);
    // 4サイクル目だけ誤読（1000）
    let recognizer = MockRecognizer::new(vec!["10", "10", "10", "1000", "10"]);

    let mut runner = build_runner(enumerator, source, model, recognizer);
    for _ in 0..5 {
        runner.run_cycle();
    }

    assert_eq!(runner.context().economy.pot, 10.0);
}

#[test]
fn test_stack_routed_to_hero_seat() {
    let enumerator = MockWindowEnumerator::new(vec![Ok(vec![table_window()])]);
    let source = MockFrameSource::repeating(lit_frame(), 10);
    let model = MockDetectionModel::fixed(vec![det(
        labels::STACK_TEXT,
        // 正規化中心 ≈ (0.5, 0.68) = シート0（ヒーロー）
        BoundingBox::new(190.0, 265.0, 210.0, 280.0),
    )]);
    let recognizer = MockRecognizer::new(vec!["2500"]);

    let mut runner = build_runner(enumerator, source, model, recognizer);
    runner.run_cycle();

    assert_eq!(runner.context().economy.stacks.get(&0), Some(&2500.0));
}

#[test]
fn test_window_loss_keeps_tracking_state() {
    let enumerator = MockWindowEnumerator::new(vec![
        Ok(vec![table_window()]),
        Ok(vec![]),
        Ok(vec![]),
    ]);
    let source = MockFrameSource::repeating(lit_frame(), 10);
    let model = MockDetectionModel::fixed(vec![]);
    let recognizer = MockRecognizer::new(vec!["0"]);

    let mut runner = build_runner(enumerator, source, model, recognizer);
    runner.run_cycle();
    assert!(runner.context().window_title.is_some());

    // ウィンドウ消失後もタイトルと矩形は前回値のまま
    std::thread::sleep(std::time::Duration::from_millis(5));
    runner.run_cycle();
    std::thread::sleep(std::time::Duration::from_millis(5));
    runner.run_cycle();

    let ctx = runner.context();
    assert_eq!(ctx.window_title.as_deref(), Some("NL Holdem Table #7"));
    assert!(ctx.window_rect.is_some());
}

#[test]
fn test_capture_cache_miss_retains_stale_frame() {
    let enumerator = MockWindowEnumerator::new(vec![Ok(vec![table_window()])]);
    // 1フレームだけ供給し、以後はキャッシュミス
    let source = MockFrameSource::new(vec![Some(lit_frame()), None, None]);
    let model = MockDetectionModel::fixed(vec![]);
    let recognizer = MockRecognizer::new(vec!["0"]);

    let mut runner = build_runner(enumerator, source, model, recognizer);
    runner.run_cycle();
    let stale = runner.context().frame.as_ref().unwrap().captured_at;

    runner.run_cycle();
    runner.run_cycle();

    let frame = runner.context().frame.as_ref().unwrap();
    assert_eq!(frame.captured_at, stale);
}

#[test]
fn test_zone_stack_classifies_nine_max() {
    let enumerator = MockWindowEnumerator::new(vec![Ok(vec![table_window()])]);
    let source = MockFrameSource::repeating(lit_frame(), 10);
    // 正規化中心 ≈ (0.17, 0.75) = 左サイドゾーン内
    let model = MockDetectionModel::fixed(vec![det(
        labels::STACK_TEXT,
        BoundingBox::new(60.0, 290.0, 76.0, 310.0),
    )]);
    let recognizer = MockRecognizer::new(vec!["100"]);

    let mut runner = build_runner(enumerator, source, model, recognizer);
    runner.run_cycle();

    assert_eq!(runner.context().table_format, Some(TableFormat::NineMax));
}

#[test]
fn test_black_frame_fails_vision_check() {
    let enumerator = MockWindowEnumerator::new(vec![Ok(vec![table_window()])]);
    let black = Frame::new(
        vec![0u8; (FRAME_SIZE * FRAME_SIZE * 4) as usize],
        FRAME_SIZE,
        FRAME_SIZE,
    );
    let source = MockFrameSource::repeating(black, 10);
    let model = MockDetectionModel::fixed(vec![]);
    let recognizer = MockRecognizer::new(vec!["0"]);

    let mut runner = build_runner(enumerator, source, model, recognizer);
    runner.run_cycle();

    let ctx = runner.context();
    assert!(ctx.system_checked);
    assert!(!ctx.vision_ok);
}
