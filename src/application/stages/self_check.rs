//! セルフチェックステージ
//!
//! フレームの平均輝度から黒画面（キャプチャ異常・最小化など）を検出し、
//! vision_okフラグを更新する。チェックはスロットリングされる。

use std::time::Instant;

use crate::application::context::PipelineContext;
use crate::application::stage::{Stage, StageResult, StageStatus};
use crate::domain::config::SelfCheckConfig;
use crate::domain::types::Frame;

pub struct SelfCheckStage {
    interval: std::time::Duration,
    black_threshold: f64,
    last_check: Option<Instant>,
}

impl SelfCheckStage {
    pub fn new(config: &SelfCheckConfig) -> Self {
        Self {
            interval: config.interval(),
            black_threshold: config.black_threshold,
            last_check: None,
        }
    }

    /// フレームの平均輝度（BT.601近似）
    fn mean_luminance(frame: &Frame) -> f64 {
        if frame.data.is_empty() {
            return 0.0;
        }
        let mut sum = 0u64;
        let mut count = 0u64;
        for px in frame.data.chunks_exact(Frame::BYTES_PER_PIXEL) {
            let luma = (px[0] as u32 * 299 + px[1] as u32 * 587 + px[2] as u32 * 114) / 1000;
            sum += luma as u64;
            count += 1;
        }
        if count == 0 {
            return 0.0;
        }
        sum as f64 / count as f64
    }
}

impl Stage for SelfCheckStage {
    fn name(&self) -> &'static str {
        "self_check"
    }

    fn process(&mut self, ctx: &mut PipelineContext) -> StageResult {
        if let Some(last) = self.last_check {
            if last.elapsed() < self.interval {
                return Ok(StageStatus::Skipped);
            }
        }
        self.last_check = Some(Instant::now());
        ctx.system_checked = true;

        let Some(frame) = &ctx.frame else {
            ctx.vision_ok = false;
            return Ok(StageStatus::Completed);
        };

        let mean = Self::mean_luminance(frame);
        let ok = mean > self.black_threshold;
        if !ok {
            tracing::warn!(mean_luminance = mean, "Frame appears black; vision check failed");
        }
        ctx.vision_ok = ok;

        Ok(StageStatus::Completed)
    }
}
