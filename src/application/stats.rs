//! 統計情報管理モジュール
//!
//! サイクルFPSと各ステージのレイテンシを収集・出力します。

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// 統計情報の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    /// ウィンドウロケータ処理時間
    Locate,
    /// キャプチャ・切り出し処理時間
    Capture,
    /// セルフチェック処理時間
    SelfCheck,
    /// 物体検出処理時間
    Detect,
    /// OCR・融合処理時間
    Ocr,
    /// 1サイクル全体の処理時間
    Cycle,
}

impl StatKind {
    /// ステージ名から統計種別へ
    pub fn from_stage_name(name: &str) -> Option<Self> {
        match name {
            "window_locator" => Some(Self::Locate),
            "capture" => Some(Self::Capture),
            "self_check" => Some(Self::SelfCheck),
            "detector" => Some(Self::Detect),
            "ocr_fusion" => Some(Self::Ocr),
            _ => None,
        }
    }
}

/// パーセンタイル統計値
#[derive(Debug, Clone)]
pub struct PercentileStats {
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub count: usize,
}

/// 統計情報コレクター
#[derive(Debug)]
pub struct StatsCollector {
    /// FPS計測用のサイクルタイムスタンプ（直近数秒分保持）
    cycle_times: VecDeque<Instant>,
    /// 各ステージの所要時間（最大1000サンプル保持）
    durations: std::collections::HashMap<StatKind, VecDeque<Duration>>,
    /// 最後の統計出力時刻
    last_report: Instant,
    /// 統計出力間隔
    report_interval: Duration,
}

impl StatsCollector {
    /// FPS計算の時間範囲（秒）
    ///
    /// アイドル時は5fps程度までサイクルが落ちるため、
    /// 数サンプル確保できるよう数秒のウィンドウを取る。
    const FPS_WINDOW_SECS: u64 = 3;

    /// 最大サンプル保持数（パーセンタイル計算用）
    const MAX_DURATION_SAMPLES: usize = 1000;

    /// 新しいStatsCollectorを作成
    ///
    /// # Arguments
    /// * `report_interval` - 統計出力間隔（例: 10秒）
    pub fn new(report_interval: Duration) -> Self {
        Self {
            cycle_times: VecDeque::new(),
            durations: std::collections::HashMap::new(),
            last_report: Instant::now(),
            report_interval,
        }
    }

    /// サイクル完了を記録（FPS計測用）
    pub fn record_cycle(&mut self) {
        let now = Instant::now();
        self.cycle_times.push_back(now);

        let window = Duration::from_secs(Self::FPS_WINDOW_SECS);
        while let Some(&front) = self.cycle_times.front() {
            if now.duration_since(front) > window {
                self.cycle_times.pop_front();
            } else {
                break;
            }
        }
    }

    /// 処理時間を記録
    pub fn record_duration(&mut self, kind: StatKind, duration: Duration) {
        let queue = self.durations.entry(kind).or_default();
        queue.push_back(duration);

        if queue.len() > Self::MAX_DURATION_SAMPLES {
            queue.pop_front();
        }
    }

    /// 現在のサイクルFPSを計算
    pub fn current_fps(&self) -> f64 {
        if self.cycle_times.len() < 2 {
            return 0.0;
        }

        let count = self.cycle_times.len() as f64;
        if let (Some(&first), Some(&last)) = (self.cycle_times.front(), self.cycle_times.back()) {
            let elapsed = last.duration_since(first).as_secs_f64();
            if elapsed > 0.0 {
                return (count - 1.0) / elapsed;
            }
        }
        0.0
    }

    /// パーセンタイル統計を計算
    ///
    /// # Returns
    /// パーセンタイル統計値。データがない場合は None
    pub fn percentile_stats(&self, kind: StatKind) -> Option<PercentileStats> {
        let queue = self.durations.get(&kind)?;
        if queue.is_empty() {
            return None;
        }

        let mut sorted: Vec<Duration> = queue.iter().copied().collect();
        sorted.sort();

        let count = sorted.len();
        let p50 = sorted[count * 50 / 100];
        let p95 = sorted[count * 95 / 100];
        let p99 = sorted[count * 99 / 100];

        Some(PercentileStats {
            p50,
            p95,
            p99,
            count,
        })
    }

    /// 統計レポートを出力すべきか判定
    pub fn should_report(&self) -> bool {
        self.last_report.elapsed() >= self.report_interval
    }

    /// 統計レポートを出力してタイマーをリセット
    #[cfg(debug_assertions)]
    pub fn report_and_reset(&mut self) {
        use tracing::info;

        info!("=== Pipeline Statistics ===");
        info!("Cycle FPS: {:.1}", self.current_fps());

        for kind in [
            StatKind::Locate,
            StatKind::Capture,
            StatKind::SelfCheck,
            StatKind::Detect,
            StatKind::Ocr,
            StatKind::Cycle,
        ] {
            if let Some(stats) = self.percentile_stats(kind) {
                info!(
                    "{:?}: p50={:.2}ms, p95={:.2}ms, p99={:.2}ms (n={})",
                    kind,
                    stats.p50.as_secs_f64() * 1000.0,
                    stats.p95.as_secs_f64() * 1000.0,
                    stats.p99.as_secs_f64() * 1000.0,
                    stats.count
                );
            }
        }

        info!("===========================");

        self.last_report = Instant::now();
    }

    /// Release build用のダミー実装
    #[cfg(not(debug_assertions))]
    pub fn report_and_reset(&mut self) {
        self.last_report = Instant::now();
    }
}
