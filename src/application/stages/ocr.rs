//! OCR融合ステージ
//!
//! 金額テキスト領域（pot/stack/bet）を前処理してOCRにかけ、
//! 数値化した結果を空間バケットの中央値フィルタで平滑化し、
//! 経済状態（ポット・シート別スタック/ベット）へルーティングする。
//!
//! # 前処理
//! 切り出し（クランプ済み）→ 拡大 → グレースケール → Otsu二値化 →
//! 前景過多なら反転（常に「明背景に暗文字」へ正規化）→ 白枠パディング。
//!
//! # 失敗の隔離
//! - OCRバックエンドが起動時に見つからない場合、ステージは恒久的no-op
//! - 1領域の認識失敗は他領域の処理を妨げない
//! - 解析不能テキストは0.0としてバッファに積む（中央値が外れ値として吸収）

use image::{imageops, GrayImage, RgbaImage};

use crate::application::context::PipelineContext;
use crate::application::stage::{Stage, StageResult, StageStatus};
use crate::domain::amount::parse_amount;
use crate::domain::config::OcrConfig;
use crate::domain::ports::TextRecognizer;
use crate::domain::smoothing::SmoothingBank;
use crate::domain::table;
use crate::domain::types::{labels, Frame, Roi, TableFormat};

/// 二値化後に付加する白枠の幅（ピクセル）
const BORDER_PX: u32 = 10;

pub struct OcrFusionStage<R: TextRecognizer> {
    recognizer: Option<R>,
    bank: SmoothingBank,
    upscale_factor: u32,
}

impl<R: TextRecognizer> OcrFusionStage<R> {
    pub fn new(recognizer: Option<R>, config: &OcrConfig) -> Self {
        if recognizer.is_none() {
            tracing::info!("No OCR backend available; ocr stage disabled");
        }
        Self {
            recognizer,
            bank: SmoothingBank::new(config.buffer_len, config.bucket_cell_px),
            upscale_factor: config.upscale_factor,
        }
    }
}

impl<R: TextRecognizer> Stage for OcrFusionStage<R> {
    fn name(&self) -> &'static str {
        "ocr_fusion"
    }

    fn process(&mut self, ctx: &mut PipelineContext) -> StageResult {
        let Some(recognizer) = self.recognizer.as_mut() else {
            return Ok(StageStatus::Skipped);
        };
        let Some(frame) = ctx.frame.as_ref() else {
            return Ok(StageStatus::Skipped);
        };
        if ctx.detections.is_empty() {
            return Ok(StageStatus::Skipped);
        }

        // フォーマット未確定の間は6-maxレイアウトで対応付ける
        let format = ctx.table_format.unwrap_or(TableFormat::SixMax);

        for det in ctx
            .detections
            .iter()
            .filter(|d| labels::is_money_text(&d.label))
        {
            let Some(roi) = det.bbox.to_roi_clamped(frame.width, frame.height) else {
                continue;
            };
            let Some(binary) = preprocess_region(frame, &roi, self.upscale_factor) else {
                continue;
            };

            let text = match recognizer.recognize(binary.as_raw(), binary.width(), binary.height())
            {
                Ok(text) => text,
                Err(e) => {
                    // 1領域の失敗はその領域のみスキップ
                    tracing::debug!(label = %det.label, error = %e, "OCR failed for region");
                    continue;
                }
            };

            let value = parse_amount(&text);
            let fused = self.bank.observe(&det.label, &det.bbox, value);

            match det.label.as_str() {
                labels::POT_TEXT => ctx.economy.pot = fused,
                labels::STACK_TEXT | labels::BET_TEXT => {
                    let (cx, cy) = det.bbox.center();
                    let nx = cx / frame.width as f32;
                    let ny = cy / frame.height as f32;
                    let Some(seat) = table::nearest_seat(nx, ny, format) else {
                        tracing::debug!(label = %det.label, nx, ny, "Money text not near any seat anchor");
                        continue;
                    };
                    if det.label == labels::STACK_TEXT {
                        ctx.economy.stacks.insert(seat, fused);
                    } else {
                        ctx.economy.bets.insert(seat, fused);
                    }
                }
                _ => {}
            }
        }

        Ok(StageStatus::Completed)
    }
}

/// 1領域分のOCR前処理
///
/// 拡大・グレースケール・Otsu二値化・反転正規化・白枠パディングを行い、
/// 明背景に暗文字の二値画像を返す。
fn preprocess_region(frame: &Frame, roi: &Roi, upscale: u32) -> Option<GrayImage> {
    let crop = frame.crop(roi)?;
    let rgba = RgbaImage::from_raw(crop.width, crop.height, crop.data)?;

    let upscale = upscale.max(1);
    let scaled = imageops::resize(
        &rgba,
        crop.width * upscale,
        crop.height * upscale,
        imageops::FilterType::Triangle,
    );

    let mut gray = imageops::grayscale(&scaled);
    let threshold = otsu_threshold(&gray);
    for p in gray.pixels_mut() {
        p.0[0] = if p.0[0] > threshold { 255 } else { 0 };
    }

    // 前景（暗ピクセル）が過半なら「暗背景に明文字」なので反転する
    let dark = gray.pixels().filter(|p| p.0[0] == 0).count() as u64;
    let total = gray.width() as u64 * gray.height() as u64;
    if dark * 2 > total {
        for p in gray.pixels_mut() {
            p.0[0] = 255 - p.0[0];
        }
    }

    Some(pad_with_border(&gray, BORDER_PX, 255))
}

/// Otsu法による二値化閾値の算出
fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut hist = [0u64; 256];
    for p in gray.pixels() {
        hist[p.0[0] as usize] += 1;
    }
    let total = gray.width() as u64 * gray.height() as u64;
    if total == 0 {
        return 127;
    }

    let sum_all: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut sum_bg = 0.0;
    let mut weight_bg = 0u64;
    let mut best_variance = 0.0;
    let mut threshold = 0u8;

    for t in 0..256usize {
        weight_bg += hist[t];
        if weight_bg == 0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0 {
            break;
        }
        sum_bg += t as f64 * hist[t] as f64;

        let mean_bg = sum_bg / weight_bg as f64;
        let mean_fg = (sum_all - sum_bg) / weight_fg as f64;
        let variance = weight_bg as f64 * weight_fg as f64 * (mean_bg - mean_fg).powi(2);
        if variance > best_variance {
            best_variance = variance;
            threshold = t as u8;
        }
    }

    threshold
}

/// 画像の周囲に一様な枠を付加する
fn pad_with_border(gray: &GrayImage, border: u32, value: u8) -> GrayImage {
    let mut padded = GrayImage::from_pixel(
        gray.width() + border * 2,
        gray.height() + border * 2,
        image::Luma([value]),
    );
    imageops::overlay(&mut padded, gray, border as i64, border as i64);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{BoundingBox, Detection};
    use crate::domain::{DomainError, DomainResult};
    use std::collections::VecDeque;

    struct ScriptedRecognizer {
        texts: VecDeque<DomainResult<String>>,
        last: Option<String>,
    }

    impl ScriptedRecognizer {
        fn new(texts: Vec<&str>) -> Self {
            Self {
                texts: texts.into_iter().map(|t| Ok(t.to_string())).collect(),
                last: None,
            }
        }
    }

    impl TextRecognizer for ScriptedRecognizer {
        fn recognize(&mut self, _pixels: &[u8], _w: u32, _h: u32) -> DomainResult<String> {
            match self.texts.pop_front() {
                Some(Ok(t)) => {
                    self.last = Some(t.clone());
                    Ok(t)
                }
                Some(Err(e)) => Err(e),
                None => self
                    .last
                    .clone()
                    .ok_or_else(|| DomainError::Recognition("script exhausted".to_string())),
            }
        }
    }

    fn frame_1000() -> Frame {
        // 128の一様なフレーム（前処理が常に成功する）
        Frame::new(vec![128u8; 1000 * 1000 * 4], 1000, 1000)
    }

    fn pot_detection() -> Detection {
        Detection {
            label: labels::POT_TEXT.to_string(),
            confidence: 0.9,
            bbox: BoundingBox::new(450.0, 300.0, 550.0, 330.0),
        }
    }

    fn ctx_with(detections: Vec<Detection>) -> PipelineContext {
        PipelineContext {
            frame: Some(frame_1000()),
            detections,
            ..Default::default()
        }
    }

    #[test]
    fn test_pot_value_extracted() {
        let recognizer = ScriptedRecognizer::new(vec!["1.2k"]);
        let mut stage = OcrFusionStage::new(Some(recognizer), &OcrConfig::default());
        let mut ctx = ctx_with(vec![pot_detection()]);

        stage.process(&mut ctx).unwrap();

        assert_eq!(ctx.economy.pot, 1200.0);
    }

    #[test]
    fn test_median_rejects_outlier() {
        let recognizer = ScriptedRecognizer::new(vec!["10", "10", "10", "1000", "10"]);
        let mut stage = OcrFusionStage::new(Some(recognizer), &OcrConfig::default());
        let mut ctx = ctx_with(vec![pot_detection()]);

        for _ in 0..5 {
            stage.process(&mut ctx).unwrap();
        }

        assert_eq!(ctx.economy.pot, 10.0);
    }

    #[test]
    fn test_unparseable_text_pushes_zero() {
        // 4回目の"??"は0.0としてバッファに入るが中央値は10のまま
        let recognizer = ScriptedRecognizer::new(vec!["10", "10", "10", "??", "10"]);
        let mut stage = OcrFusionStage::new(Some(recognizer), &OcrConfig::default());
        let mut ctx = ctx_with(vec![pot_detection()]);

        for _ in 0..5 {
            stage.process(&mut ctx).unwrap();
        }

        assert_eq!(ctx.economy.pot, 10.0);
    }

    #[test]
    fn test_steady_state_idempotent() {
        let recognizer = ScriptedRecognizer::new(vec!["250"]);
        let mut stage = OcrFusionStage::new(Some(recognizer), &OcrConfig::default());
        let mut ctx = ctx_with(vec![pot_detection()]);

        for _ in 0..6 {
            stage.process(&mut ctx).unwrap();
        }
        let first = ctx.economy.pot;
        stage.process(&mut ctx).unwrap();

        // 定常状態では再実行しても値が変わらない
        assert_eq!(ctx.economy.pot, first);
        assert_eq!(first, 250.0);
    }

    #[test]
    fn test_stack_routed_to_hero_seat() {
        let recognizer = ScriptedRecognizer::new(vec!["500"]);
        let mut stage = OcrFusionStage::new(Some(recognizer), &OcrConfig::default());
        // 正規化中心(0.5, 0.68) = ヒーロー席アンカー
        let stack = Detection {
            label: labels::STACK_TEXT.to_string(),
            confidence: 0.9,
            bbox: BoundingBox::new(480.0, 670.0, 520.0, 690.0),
        };
        let mut ctx = ctx_with(vec![stack]);

        stage.process(&mut ctx).unwrap();

        assert_eq!(ctx.economy.stacks.get(&0), Some(&500.0));
    }

    #[test]
    fn test_disabled_without_backend() {
        let mut stage: OcrFusionStage<ScriptedRecognizer> =
            OcrFusionStage::new(None, &OcrConfig::default());
        let mut ctx = ctx_with(vec![pot_detection()]);

        assert_eq!(stage.process(&mut ctx).unwrap(), StageStatus::Skipped);
        assert_eq!(ctx.economy.pot, 0.0);
    }

    #[test]
    fn test_skips_without_detections() {
        let recognizer = ScriptedRecognizer::new(vec!["100"]);
        let mut stage = OcrFusionStage::new(Some(recognizer), &OcrConfig::default());
        let mut ctx = ctx_with(vec![]);

        assert_eq!(stage.process(&mut ctx).unwrap(), StageStatus::Skipped);
    }

    #[test]
    fn test_preprocess_dimensions() {
        let frame = frame_1000();
        let roi = Roi::new(0, 0, 40, 20);
        let out = preprocess_region(&frame, &roi, 3).unwrap();

        // 3倍拡大 + 両側10pxの枠
        assert_eq!(out.width(), 40 * 3 + BORDER_PX * 2);
        assert_eq!(out.height(), 20 * 3 + BORDER_PX * 2);
    }

    #[test]
    fn test_preprocess_normalizes_to_light_background() {
        // 暗背景に明るい文字列領域 → 反転されて明背景になる
        let mut data = vec![0u8; 60 * 20 * 4];
        for x in 20..40u32 {
            for y in 5..15u32 {
                let off = ((y * 60 + x) * 4) as usize;
                data[off] = 230;
                data[off + 1] = 230;
                data[off + 2] = 230;
            }
        }
        let frame = Frame::new(data, 60, 20);

        let out = preprocess_region(&frame, &Roi::new(0, 0, 60, 20), 3).unwrap();
        let light = out.pixels().filter(|p| p.0[0] == 255).count();
        let total = (out.width() * out.height()) as usize;
        assert!(light * 2 > total, "background should be light after normalization");
    }

    #[test]
    fn test_otsu_separates_bimodal() {
        // 半分が輝度50、半分が輝度200のバイモーダル画像
        let mut gray = GrayImage::new(10, 10);
        for (i, p) in gray.pixels_mut().enumerate() {
            p.0[0] = if i % 2 == 0 { 50 } else { 200 };
        }
        let t = otsu_threshold(&gray);
        assert!((50..200).contains(&t), "threshold {} should split the modes", t);
    }
}
