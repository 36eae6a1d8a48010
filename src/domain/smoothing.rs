//! OCR値の平滑化
//!
//! 同一表示領域に対するOCR結果のちらつきを吸収するため、
//! 空間バケットごとにFIFOバッファを持ち、中央値で融合する。
//!
//! バケットキーは（ラベル, 量子化した左上座標）。検出ボックスが
//! 数ピクセル揺れても同じバケットに落ちるよう、セル単位で量子化する。

use std::collections::{HashMap, VecDeque};

use crate::domain::types::BoundingBox;

/// 空間バケットのキー
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketKey {
    pub label: String,
    pub cell_x: u32,
    pub cell_y: u32,
}

impl BucketKey {
    /// 検出ボックスの左上をセルサイズで量子化してキーを作る
    pub fn from_detection(label: &str, bbox: &BoundingBox, cell_px: u32) -> Self {
        let cell = cell_px.max(1);
        Self {
            label: label.to_string(),
            cell_x: (bbox.x1.max(0.0) as u32) / cell,
            cell_y: (bbox.y1.max(0.0) as u32) / cell,
        }
    }
}

/// 直近N値のFIFOバッファ
#[derive(Debug, Clone)]
pub struct SmoothingBuffer {
    samples: VecDeque<f64>,
    cap: usize,
}

impl SmoothingBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(cap),
            cap: cap.max(1),
        }
    }

    /// 値を追加する。満杯なら最古値を破棄（FIFO）
    pub fn push(&mut self, value: f64) {
        if self.samples.len() == self.cap {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// バッファの中央値を返す。偶数個なら中央2値の平均
    pub fn median(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 1 {
            Some(sorted[mid])
        } else {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        }
    }
}

/// バケットキー → 平滑化バッファの集合
#[derive(Debug)]
pub struct SmoothingBank {
    buffers: HashMap<BucketKey, SmoothingBuffer>,
    buffer_len: usize,
    cell_px: u32,
}

impl SmoothingBank {
    pub fn new(buffer_len: usize, cell_px: u32) -> Self {
        Self {
            buffers: HashMap::new(),
            buffer_len,
            cell_px,
        }
    }

    /// 観測値をバケットに投入し、融合値（中央値）を返す
    pub fn observe(&mut self, label: &str, bbox: &BoundingBox, value: f64) -> f64 {
        let key = BucketKey::from_detection(label, bbox, self.cell_px);
        let buffer = self
            .buffers
            .entry(key)
            .or_insert_with(|| SmoothingBuffer::new(self.buffer_len));
        buffer.push(value);
        // pushした直後なのでバッファは空にならない
        buffer.median().unwrap_or(value)
    }

    #[allow(dead_code)]
    pub fn bucket_count(&self) -> usize {
        self.buffers.len()
    }
}
