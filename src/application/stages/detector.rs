//! 物体検出ステージ
//!
//! 検出モデルの生出力を信頼度フィルタとクラス別NMSで整理し、
//! ヒーロー手番・ディーラー位置・テーブルフォーマットを導出する。
//!
//! モデルが構成されていない場合（model_path空、またはビルドに
//! 推論バックエンドが含まれない場合）は恒久的にno-op。

use crate::application::context::PipelineContext;
use crate::application::stage::{Stage, StageResult, StageStatus};
use crate::domain::config::DetectorConfig;
use crate::domain::ports::DetectionModel;
use crate::domain::table;
use crate::domain::types::{labels, Detection};

pub struct DetectorStage<M: DetectionModel> {
    model: Option<M>,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl<M: DetectionModel> DetectorStage<M> {
    pub fn new(model: Option<M>, config: &DetectorConfig) -> Self {
        if model.is_none() {
            tracing::info!("No detection model configured; detector stage disabled");
        }
        Self {
            model,
            confidence_threshold: config.confidence_threshold,
            iou_threshold: config.iou_threshold,
        }
    }
}

/// クラス別の貪欲NMS
///
/// 信頼度降順に採用し、同一ラベルで採用済みボックスとのIoUが
/// 閾値を超えるものを抑制する。
fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        let suppressed = kept
            .iter()
            .any(|k| k.label == det.label && k.bbox.iou(&det.bbox) > iou_threshold);
        if !suppressed {
            kept.push(det);
        }
    }
    kept
}

impl<M: DetectionModel> Stage for DetectorStage<M> {
    fn name(&self) -> &'static str {
        "detector"
    }

    fn process(&mut self, ctx: &mut PipelineContext) -> StageResult {
        let Some(model) = &mut self.model else {
            return Ok(StageStatus::Skipped);
        };
        let Some(frame) = &ctx.frame else {
            return Ok(StageStatus::Skipped);
        };

        let raw = model.infer(frame)?;

        let confidence_threshold = self.confidence_threshold;
        let filtered: Vec<Detection> = raw
            .into_iter()
            .filter(|d| d.confidence >= confidence_threshold)
            .collect();
        let detections = non_max_suppression(filtered, self.iou_threshold);

        ctx.hero_active = detections.iter().any(|d| d.label == labels::HERO_ACTIVE);
        ctx.dealer_pos = detections
            .iter()
            .find(|d| d.label == labels::DEALER)
            .map(|d| d.bbox.center());

        // stack_textが無いサイクルでは前回のフォーマットを保持
        if let Some(format) = table::classify_format(&detections, frame.width, frame.height) {
            if ctx.table_format != Some(format) {
                tracing::info!(format = %format, "Table format classified");
            }
            ctx.table_format = Some(format);
        }

        ctx.detections = detections;

        Ok(StageStatus::Completed)
    }
}
