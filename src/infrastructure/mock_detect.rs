//! 検出モデルのモック実装

use std::collections::VecDeque;

use crate::domain::error::DomainResult;
use crate::domain::ports::DetectionModel;
use crate::domain::types::{Detection, Frame};

/// スクリプトされた検出結果を返すモデル
///
/// スクリプトを消費し尽くすと最後の結果を繰り返す。
pub struct MockDetectionModel {
    script: VecDeque<Vec<Detection>>,
    last: Vec<Detection>,
}

impl MockDetectionModel {
    pub fn new(script: Vec<Vec<Detection>>) -> Self {
        Self {
            script: script.into(),
            last: Vec::new(),
        }
    }

    /// 常に同じ検出結果を返すモデル
    pub fn fixed(detections: Vec<Detection>) -> Self {
        Self {
            script: VecDeque::new(),
            last: detections,
        }
    }
}

impl DetectionModel for MockDetectionModel {
    fn infer(&mut self, _frame: &Frame) -> DomainResult<Vec<Detection>> {
        match self.script.pop_front() {
            Some(detections) => {
                self.last = detections.clone();
                Ok(detections)
            }
            None => Ok(self.last.clone()),
        }
    }
}
