//! Capture実装: 画面キャプチャの具体実装
//!
//! xcapによるモニタキャプチャを提供。キャプチャは専用スレッドで行い、
//! 最新フレームのみをbounded(1)チャンネルでパイプラインへ渡す。

pub mod monitor;

#[allow(unused_imports)]
pub use monitor::MonitorFrameSource;

use std::time::Duration;

use crate::domain::config::{CaptureConfig, CaptureSource};
use crate::domain::error::DomainResult;

/// 設定からフレームソースを構築する
pub fn create_frame_source(
    config: &CaptureConfig,
    interval: Duration,
) -> DomainResult<MonitorFrameSource> {
    match config.source {
        CaptureSource::Monitor => MonitorFrameSource::start(config.monitor_index, interval),
    }
}
