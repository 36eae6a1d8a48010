//! ウィンドウ列挙アダプタ（xcap）
//!
//! トップレベルウィンドウのタイトルと矩形をドメイン型に写す。
//! 列挙自体が失敗する環境（ヘッドレス等）ではResourceUnavailableを返し、
//! ロケータステージが恒久的no-opへ移行する。

use xcap::Window;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::ports::WindowEnumerator;
use crate::domain::types::{WindowDescriptor, WindowRect};

pub struct XcapWindowEnumerator;

impl XcapWindowEnumerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for XcapWindowEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowEnumerator for XcapWindowEnumerator {
    fn enumerate(&mut self) -> DomainResult<Vec<WindowDescriptor>> {
        let windows = Window::all()
            .map_err(|e| DomainError::ResourceUnavailable(format!("window enumeration: {e}")))?;

        Ok(windows
            .iter()
            .map(|w| WindowDescriptor {
                title: w.title().to_string(),
                rect: WindowRect::new(w.x(), w.y(), w.width(), w.height()),
            })
            .collect())
    }
}
