//! 検出モデルの構築
//!
//! model_path未設定のビルド・環境では検出を無効化して起動を続ける。
//! ONNX Runtimeバックエンドは`yolo-ort` feature有効時のみリンクされる。

#[cfg(feature = "yolo-ort")]
pub mod yolo_ort;

use crate::domain::config::DetectorConfig;
use crate::domain::error::DomainResult;
use crate::domain::ports::DetectionModel;

/// 設定から検出モデルを構築する
///
/// `Ok(None)`は「検出なしで動作を続ける」ことを意味する。
pub fn create_detection_model(
    config: &DetectorConfig,
) -> DomainResult<Option<Box<dyn DetectionModel>>> {
    if config.model_path.is_empty() {
        tracing::info!("No model_path configured; detection disabled");
        return Ok(None);
    }

    #[cfg(feature = "yolo-ort")]
    {
        let model = yolo_ort::OrtYoloModel::load(config)?;
        Ok(Some(Box::new(model)))
    }

    #[cfg(not(feature = "yolo-ort"))]
    {
        tracing::warn!(
            model_path = %config.model_path,
            "model_path is set but this build has no inference backend (yolo-ort feature)"
        );
        Ok(None)
    }
}
