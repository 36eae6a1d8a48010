//! パイプライン制御モジュール
//!
//! 全ステージを単一スレッドで固定順に実行する。
//! 順序: window_locator → capture → self_check → detector → ocr_fusion
//!
//! - ステージのErrはログに記録して次のステージへ進む（サイクルは止めない）
//! - ヒーローの手番中はアクティブケイデンス、それ以外はアイドルケイデンス
//! - サイクル所要時間を差し引いてスリープする

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::application::context::PipelineContext;
use crate::application::stage::Stage;
use crate::application::stats::{StatKind, StatsCollector};
use crate::domain::config::PipelineConfig;
use crate::measure_span;

pub struct PipelineRunner {
    stages: Vec<Box<dyn Stage>>,
    ctx: PipelineContext,
    idle_interval: Duration,
    active_interval: Duration,
    stats: StatsCollector,
}

impl PipelineRunner {
    pub fn new(stages: Vec<Box<dyn Stage>>, config: &PipelineConfig) -> Self {
        Self {
            stages,
            ctx: PipelineContext::default(),
            idle_interval: config.idle_interval(),
            active_interval: config.active_interval(),
            stats: StatsCollector::new(config.stats_interval()),
        }
    }

    /// 現在のコンテキストに応じたサイクル間隔
    fn cycle_interval(&self) -> Duration {
        if self.ctx.hero_active {
            self.active_interval
        } else {
            self.idle_interval
        }
    }

    /// 1サイクル実行する
    ///
    /// 各ステージの失敗は隔離される。失敗したステージの出力は
    /// コンテキストに前回値のまま残り、後続ステージはそれを読む。
    pub fn run_cycle(&mut self) {
        for stage in &mut self.stages {
            let start = Instant::now();
            if let Err(e) = stage.process(&mut self.ctx) {
                tracing::warn!(stage = stage.name(), error = %e, "Stage failed; continuing cycle");
            }
            let elapsed = start.elapsed();
            if let Some(kind) = StatKind::from_stage_name(stage.name()) {
                self.stats.record_duration(kind, elapsed);
            }
            #[cfg(feature = "performance-timing")]
            tracing::trace!(
                stage = stage.name(),
                elapsed_us = elapsed.as_micros() as u64,
                "Stage timing"
            );
        }
    }

    /// パイプラインを起動（ブロッキング）
    ///
    /// `running`がfalseになるまでサイクルを繰り返す。
    pub fn run(&mut self, running: &AtomicBool) {
        tracing::info!(
            stages = self.stages.len(),
            idle_ms = self.idle_interval.as_millis() as u64,
            active_ms = self.active_interval.as_millis() as u64,
            "Pipeline started"
        );

        while running.load(Ordering::Relaxed) {
            let cycle_start = Instant::now();

            self.run_cycle();

            let elapsed = cycle_start.elapsed();
            self.stats.record_cycle();
            self.stats.record_duration(StatKind::Cycle, elapsed);

            measure_span!("stats_report", {
                if self.stats.should_report() {
                    self.stats.report_and_reset();
                }
            });

            // サイクル所要時間を差し引いたスリープでケイデンスを維持
            let interval = self.cycle_interval();
            if let Some(remaining) = interval.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }

        tracing::info!("Pipeline stopped");
    }

    /// 現在のパイプラインコンテキスト
    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }
}
