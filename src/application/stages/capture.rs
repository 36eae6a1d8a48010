//! キャプチャステージ
//!
//! フレームソースから最新フレームを取得し、追跡中のウィンドウ矩形で
//! 切り出してコンテキストに書き込む。
//!
//! - `latest_frame()`のNoneはキャッシュミスであってエラーではない。
//!   その場合は前回フレームを保持する（captured_atも進まない）
//! - ウィンドウ矩形はグローバルスクリーン座標なので、ソース原点を
//!   引いてフレームローカル座標に変換してから切り出す
//! - 変換後の矩形はフレーム境界にクランプして切り出す。
//!   矩形が完全に画面外ならフレーム全体を使う

use crate::application::context::PipelineContext;
use crate::application::stage::{Stage, StageResult, StageStatus};
use crate::domain::ports::FrameSource;
use crate::domain::types::{Frame, WindowRect};

pub struct CaptureStage<S: FrameSource> {
    source: S,
    origin_x: i32,
    origin_y: i32,
}

impl<S: FrameSource> CaptureStage<S> {
    pub fn new(source: S) -> Self {
        let info = source.source_info();
        Self {
            source,
            origin_x: info.origin_x,
            origin_y: info.origin_y,
        }
    }

    /// ウィンドウ矩形でフレームを切り出す
    fn crop_to_window(&self, frame: Frame, ctx: &PipelineContext) -> Frame {
        let Some(rect) = ctx.window_rect else {
            return frame;
        };
        // セカンダリモニタは非ゼロ原点を持つ
        let local = WindowRect::new(
            rect.x - self.origin_x,
            rect.y - self.origin_y,
            rect.width,
            rect.height,
        );
        match local
            .to_roi_clamped(frame.width, frame.height)
            .and_then(|roi| frame.crop(&roi))
        {
            Some(cropped) => cropped,
            None => {
                // 矩形が完全に画面外。フレーム全体にフォールバック
                tracing::debug!("Window rect outside frame bounds; using full frame");
                frame
            }
        }
    }
}

impl<S: FrameSource> Stage for CaptureStage<S> {
    fn name(&self) -> &'static str {
        "capture"
    }

    fn process(&mut self, ctx: &mut PipelineContext) -> StageResult {
        match self.source.latest_frame()? {
            Some(frame) => {
                ctx.frame = Some(self.crop_to_window(frame, ctx));
                Ok(StageStatus::Completed)
            }
            None => {
                // キャッシュミス: 前回フレームをそのまま保持
                Ok(StageStatus::Skipped)
            }
        }
    }
}
