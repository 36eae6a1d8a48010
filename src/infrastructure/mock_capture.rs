//! キャプチャ系モック実装
//!
//! 実画面やウィンドウシステムなしでパイプラインを動かすための
//! スクリプト駆動アダプタ。統合テストとヘッドレス環境での確認に使う。

use std::collections::VecDeque;

use crate::domain::error::DomainResult;
use crate::domain::ports::{FrameSource, SourceInfo, WindowEnumerator};
use crate::domain::types::{Frame, WindowDescriptor};

/// スクリプトされたフレーム列を返すフレームソース
///
/// スクリプトを消費し尽くすとキャッシュミス（None）を返し続ける。
pub struct MockFrameSource {
    frames: VecDeque<Option<Frame>>,
    info: SourceInfo,
}

impl MockFrameSource {
    pub fn new(frames: Vec<Option<Frame>>) -> Self {
        let (width, height) = frames
            .iter()
            .flatten()
            .next()
            .map(|f| (f.width, f.height))
            .unwrap_or((0, 0));
        Self {
            frames: frames.into(),
            info: SourceInfo {
                name: "mock".to_string(),
                width,
                height,
                origin_x: 0,
                origin_y: 0,
            },
        }
    }

    /// 同一フレームをn回返すソース
    pub fn repeating(frame: Frame, n: usize) -> Self {
        Self::new(std::iter::repeat_with(|| Some(frame.clone())).take(n).collect())
    }
}

impl FrameSource for MockFrameSource {
    fn latest_frame(&mut self) -> DomainResult<Option<Frame>> {
        Ok(self.frames.pop_front().flatten())
    }

    fn source_info(&self) -> SourceInfo {
        self.info.clone()
    }
}

/// スクリプトされた列挙結果を返すウィンドウ列挙器
///
/// スクリプトを消費し尽くすと最後の結果を繰り返す。
pub struct MockWindowEnumerator {
    responses: VecDeque<DomainResult<Vec<WindowDescriptor>>>,
    last: Vec<WindowDescriptor>,
}

impl MockWindowEnumerator {
    pub fn new(responses: Vec<DomainResult<Vec<WindowDescriptor>>>) -> Self {
        Self {
            responses: responses.into(),
            last: Vec::new(),
        }
    }
}

impl WindowEnumerator for MockWindowEnumerator {
    fn enumerate(&mut self) -> DomainResult<Vec<WindowDescriptor>> {
        match self.responses.pop_front() {
            Some(Ok(windows)) => {
                self.last = windows.clone();
                Ok(windows)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last.clone()),
        }
    }
}
