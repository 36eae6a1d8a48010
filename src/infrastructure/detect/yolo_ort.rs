//! YOLOv8系ONNXモデルの推論アダプタ（ONNX Runtime）
//!
//! 入力はレターボックスで正方形に収め、出力[1, 4+クラス数, N]を
//! デコードしてフレーム座標のDetectionに戻す。
//! 信頼度フィルタとNMSは検出ステージ側の責務。

use image::{imageops, RgbaImage};
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::TensorRef;

use crate::domain::config::DetectorConfig;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::ports::DetectionModel;
use crate::domain::types::{BoundingBox, Detection, Frame};

/// レターボックスの充填輝度
const PAD_VALUE: u8 = 114;

pub struct OrtYoloModel {
    session: Session,
    input_size: u32,
    class_names: Vec<String>,
}

impl OrtYoloModel {
    pub fn load(config: &DetectorConfig) -> DomainResult<Self> {
        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.commit_from_file(&config.model_path))
            .map_err(|e| {
                DomainError::Initialization(format!(
                    "model load failed ({}): {e}",
                    config.model_path
                ))
            })?;

        tracing::info!(
            model_path = %config.model_path,
            input_size = config.input_size,
            classes = config.class_names.len(),
            "Detection model loaded"
        );

        Ok(Self {
            session,
            input_size: config.input_size,
            class_names: config.class_names.clone(),
        })
    }

    /// レターボックス変換した正規化テンソルと逆変換パラメータを返す
    fn letterbox(&self, frame: &Frame) -> DomainResult<(Array4<f32>, f32, f32, f32)> {
        let rgba = RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| DomainError::Detection("frame buffer size mismatch".to_string()))?;

        let size = self.input_size;
        let scale = (size as f32 / frame.width as f32).min(size as f32 / frame.height as f32);
        let new_w = ((frame.width as f32 * scale) as u32).max(1);
        let new_h = ((frame.height as f32 * scale) as u32).max(1);
        let pad_x = (size - new_w) as f32 / 2.0;
        let pad_y = (size - new_h) as f32 / 2.0;

        let resized = imageops::resize(&rgba, new_w, new_h, imageops::FilterType::Triangle);
        let mut canvas = RgbaImage::from_pixel(
            size,
            size,
            image::Rgba([PAD_VALUE, PAD_VALUE, PAD_VALUE, 255]),
        );
        imageops::overlay(&mut canvas, &resized, pad_x as i64, pad_y as i64);

        let mut input = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
        for (x, y, pixel) in canvas.enumerate_pixels() {
            for c in 0..3 {
                input[[0, c, y as usize, x as usize]] = pixel.0[c] as f32 / 255.0;
            }
        }

        Ok((input, scale, pad_x, pad_y))
    }
}

impl DetectionModel for OrtYoloModel {
    fn infer(&mut self, frame: &Frame) -> DomainResult<Vec<Detection>> {
        let (input, scale, pad_x, pad_y) = self.letterbox(frame)?;

        let tensor = TensorRef::from_array_view(&input)
            .map_err(|e| DomainError::Detection(format!("input tensor: {e}")))?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| DomainError::Detection(format!("inference: {e}")))?;

        let (_, value) = outputs
            .iter()
            .next()
            .ok_or_else(|| DomainError::Detection("model produced no outputs".to_string()))?;
        let output = value
            .try_extract_array::<f32>()
            .map_err(|e| DomainError::Detection(format!("output tensor: {e}")))?;

        // 形状: [1, 4 + クラス数, 候補数]
        let view = output
            .into_dimensionality::<ndarray::Ix3>()
            .map_err(|e| DomainError::Detection(format!("unexpected output shape: {e}")))?;
        let channels = view.shape()[1];
        let candidates = view.shape()[2];
        if channels < 5 {
            return Err(DomainError::Detection(format!(
                "output has {channels} channels, expected at least 5"
            )));
        }

        let mut detections = Vec::new();
        for i in 0..candidates {
            let (mut best_class, mut best_score) = (0usize, 0.0f32);
            for c in 4..channels {
                let score = view[[0, c, i]];
                if score > best_score {
                    best_score = score;
                    best_class = c - 4;
                }
            }

            let label = match self.class_names.get(best_class) {
                Some(name) => name.clone(),
                None => continue,
            };

            // レターボックス座標 → フレーム座標
            let cx = (view[[0, 0, i]] - pad_x) / scale;
            let cy = (view[[0, 1, i]] - pad_y) / scale;
            let w = view[[0, 2, i]] / scale;
            let h = view[[0, 3, i]] / scale;

            detections.push(Detection {
                label,
                confidence: best_score,
                bbox: BoundingBox::new(
                    cx - w / 2.0,
                    cy - h / 2.0,
                    cx + w / 2.0,
                    cy + h / 2.0,
                ),
            });
        }

        Ok(detections)
    }
}
