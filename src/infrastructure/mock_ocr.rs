//! テキスト認識のモック実装

use std::collections::VecDeque;

use crate::domain::error::DomainResult;
use crate::domain::ports::TextRecognizer;

/// スクリプトされた認識結果を返すレコグナイザ
///
/// スクリプトを消費し尽くすと最後のテキストを繰り返す。
pub struct MockRecognizer {
    script: VecDeque<String>,
    last: String,
}

impl MockRecognizer {
    pub fn new<S: Into<String>>(script: Vec<S>) -> Self {
        Self {
            script: script.into_iter().map(Into::into).collect(),
            last: String::new(),
        }
    }
}

impl TextRecognizer for MockRecognizer {
    fn recognize(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> DomainResult<String> {
        if let Some(text) = self.script.pop_front() {
            self.last = text;
        }
        Ok(self.last.clone())
    }
}
