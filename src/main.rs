mod application;
mod domain;
mod infrastructure;
mod logging;

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use crate::application::pipeline::PipelineRunner;
use crate::application::stage::Stage;
use crate::application::stages::{
    CaptureStage, DetectorStage, OcrFusionStage, SelfCheckStage, WindowLocatorStage,
};
use crate::domain::config::AppConfig;
use crate::infrastructure::capture::create_frame_source;
use crate::infrastructure::detect::create_detection_model;
use crate::infrastructure::tesseract_ocr::TesseractRecognizer;
use crate::infrastructure::window_enum::XcapWindowEnumerator;
use crate::logging::init_logging;

fn main() {
    // ログシステムの初期化（非同期ファイル出力）
    let log_dir = PathBuf::from("logs");
    let _guard = init_logging("info", false, Some(log_dir));
    // 注意: _guardはmain終了まで保持する必要がある（Dropでログスレッドが終了）

    tracing::info!("tablesight starting...");

    match run() {
        Ok(_) => {
            tracing::info!("tablesight terminated gracefully.");
        }
        Err(e) => {
            tracing::error!("Fatal error: {:?}", e);
            std::process::exit(1);
        }
    }
}

/// アプリケーションのメイン処理
fn run() -> Result<(), Box<dyn std::error::Error>> {
    // 設定ファイルの読み込み（存在しない場合はデフォルト設定を使用）
    let config = match AppConfig::from_file("config.toml") {
        Ok(config) => {
            tracing::info!("Loaded configuration from config.toml");
            config
        }
        Err(e) => {
            tracing::warn!("Failed to load config.toml: {:?}, using defaults", e);
            AppConfig::default()
        }
    };

    // 設定の検証
    config.validate()?;

    tracing::info!("Configuration validated successfully");
    tracing::info!(
        "Pipeline cadence: idle={}fps, active={}fps",
        config.pipeline.fps_idle,
        config.pipeline.fps_active
    );

    // ウィンドウ列挙アダプタ
    tracing::info!("Initializing window enumerator...");
    let enumerator = XcapWindowEnumerator::new();

    // キャプチャセッションの開始（アクティブケイデンスで取得）
    tracing::info!("Initializing capture session...");
    let frame_source = create_frame_source(&config.capture, config.pipeline.active_interval())?;

    // 検出モデル（model_path未設定なら検出なしで続行）
    let model = create_detection_model(&config.detector)?;

    // OCRバックエンド（見つからなければ認識なしで続行）
    let recognizer = match TesseractRecognizer::probe(&config.ocr) {
        Ok(recognizer) => Some(recognizer),
        Err(e) => {
            tracing::warn!(error = %e, "OCR backend unavailable; amounts will not be read");
            None
        }
    };

    // ステージは固定順: locator → capture → self_check → detector → ocr_fusion
    let stages: Vec<Box<dyn Stage>> = vec![
        Box::new(WindowLocatorStage::new(enumerator, &config.locator)),
        Box::new(CaptureStage::new(frame_source)),
        Box::new(SelfCheckStage::new(&config.self_check)),
        Box::new(DetectorStage::new(model, &config.detector)),
        Box::new(OcrFusionStage::new(recognizer, &config.ocr)),
    ];

    // パイプラインの起動（ブロッキング）
    let running = AtomicBool::new(true);
    let mut runner = PipelineRunner::new(stages, &config.pipeline);
    runner.run(&running);

    Ok(())
}
