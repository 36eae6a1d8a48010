//! パイプラインステージの実装

pub mod capture;
pub mod detector;
pub mod locator;
pub mod ocr;
pub mod self_check;

pub use capture::CaptureStage;
pub use detector::DetectorStage;
pub use locator::WindowLocatorStage;
pub use ocr::OcrFusionStage;
pub use self_check::SelfCheckStage;
