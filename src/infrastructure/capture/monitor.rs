//! モニタキャプチャアダプタ（xcap）
//!
//! キャプチャセッションスレッドが指定間隔でモニタ全体を取得し、
//! bounded(1)チャンネルへ「最新のみ」ポリシーで送信する。
//! パイプライン側の`latest_frame()`は非ブロッキングで、
//! 新フレームが無ければNone（キャッシュミス）を返す。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use xcap::Monitor;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::ports::{FrameSource, SourceInfo};
use crate::domain::types::Frame;

/// 最新のみ上書きポリシーで送信
///
/// キューが満杯なら送信をあきらめる。受信側が次に読むのは
/// キューに残っている直近のフレームで、遅延の蓄積を防ぐ。
fn send_latest_only<T>(tx: &Sender<T>, value: T) {
    match tx.try_send(value) {
        Ok(_) => {}
        Err(TrySendError::Full(_)) => {
            // キューが満杯。受信側が消費するまで新しい値は捨てる
        }
        Err(TrySendError::Disconnected(_)) => {
            // 受信側が終了済み
        }
    }
}

pub struct MonitorFrameSource {
    rx: Receiver<Frame>,
    info: SourceInfo,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl MonitorFrameSource {
    /// キャプチャセッションを開始する
    ///
    /// `monitor_index`が範囲外ならプライマリモニタにフォールバックする。
    pub fn start(monitor_index: u32, interval: Duration) -> DomainResult<Self> {
        let mut monitors = Monitor::all()
            .map_err(|e| DomainError::ResourceUnavailable(format!("monitor enumeration: {e}")))?;
        if monitors.is_empty() {
            return Err(DomainError::ResourceUnavailable(
                "no monitors available".to_string(),
            ));
        }

        let monitor = if (monitor_index as usize) < monitors.len() {
            monitors.swap_remove(monitor_index as usize)
        } else {
            tracing::warn!(monitor_index, "Monitor index out of range; using primary");
            let primary = monitors.iter().position(|m| m.is_primary()).unwrap_or(0);
            monitors.swap_remove(primary)
        };

        let info = SourceInfo {
            name: monitor.name().to_string(),
            width: monitor.width(),
            height: monitor.height(),
            origin_x: monitor.x(),
            origin_y: monitor.y(),
        };
        tracing::info!(
            monitor = %info.name,
            width = info.width,
            height = info.height,
            origin_x = info.origin_x,
            origin_y = info.origin_y,
            interval_ms = interval.as_millis() as u64,
            "Capture session starting"
        );

        let (tx, rx) = bounded::<Frame>(1);
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);

        let handle = std::thread::Builder::new()
            .name("capture-session".to_string())
            .spawn(move || {
                Self::capture_loop(monitor, tx, thread_running, interval);
            })
            .map_err(|e| DomainError::Initialization(format!("capture thread spawn: {e}")))?;

        Ok(Self {
            rx,
            info,
            running,
            handle: Some(handle),
        })
    }

    fn capture_loop(
        monitor: Monitor,
        tx: Sender<Frame>,
        running: Arc<AtomicBool>,
        interval: Duration,
    ) {
        while running.load(Ordering::Relaxed) {
            match monitor.capture_image() {
                Ok(image) => {
                    let (width, height) = (image.width(), image.height());
                    send_latest_only(&tx, Frame::new(image.into_raw(), width, height));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Monitor capture failed");
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
            std::thread::sleep(interval);
        }
    }
}

impl FrameSource for MonitorFrameSource {
    fn latest_frame(&mut self) -> DomainResult<Option<Frame>> {
        // 溜まっていれば一番新しいものだけ返す
        let mut latest = None;
        while let Ok(frame) = self.rx.try_recv() {
            latest = Some(frame);
        }
        Ok(latest)
    }

    fn source_info(&self) -> SourceInfo {
        self.info.clone()
    }
}

impl Drop for MonitorFrameSource {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
