//! Infrastructure層: 外部技術の統合
//!
//! Domain層のtraitを実装し、外部ライブラリ（xcap/ORT/Tesseract）と接続する。

pub mod capture;
pub mod detect;
pub mod mock_capture;
pub mod mock_detect;
pub mod mock_ocr;
pub mod tesseract_ocr;
pub mod window_enum;
