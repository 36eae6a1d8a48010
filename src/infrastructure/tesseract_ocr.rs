//! Tesseract CLIによるテキスト認識アダプタ
//!
//! 前処理済みの二値グレースケール画像を一時PNGに書き出し、
//! `tesseract <png> stdout`で認識する。起動時に`--version`で
//! 実行可能性を検証し、見つからなければResourceUnavailable。

use std::process::Command;

use image::GrayImage;

use crate::domain::config::OcrConfig;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::ports::TextRecognizer;

pub struct TesseractRecognizer {
    cmd: String,
    psm: u32,
    char_whitelist: String,
}

impl TesseractRecognizer {
    /// tesseractバイナリの存在を確認してからアダプタを構築する
    pub fn probe(config: &OcrConfig) -> DomainResult<Self> {
        let output = Command::new(&config.tesseract_cmd)
            .arg("--version")
            .output()
            .map_err(|e| {
                DomainError::ResourceUnavailable(format!(
                    "tesseract not executable ({}): {e}",
                    config.tesseract_cmd
                ))
            })?;

        let version = String::from_utf8_lossy(&output.stdout);
        tracing::info!(
            version = %version.lines().next().unwrap_or("unknown"),
            "Tesseract backend available"
        );

        Ok(Self {
            cmd: config.tesseract_cmd.clone(),
            psm: config.psm,
            char_whitelist: config.char_whitelist.clone(),
        })
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&mut self, pixels: &[u8], width: u32, height: u32) -> DomainResult<String> {
        let image = GrayImage::from_raw(width, height, pixels.to_vec())
            .ok_or_else(|| DomainError::Recognition("pixel buffer size mismatch".to_string()))?;

        let file = tempfile::Builder::new()
            .prefix("tablesight-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| DomainError::Recognition(format!("temp file: {e}")))?;
        image
            .save(file.path())
            .map_err(|e| DomainError::Recognition(format!("png write: {e}")))?;

        let output = Command::new(&self.cmd)
            .arg(file.path())
            .arg("stdout")
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("-c")
            .arg(format!("tessedit_char_whitelist={}", self.char_whitelist))
            .output()
            .map_err(|e| DomainError::Recognition(format!("tesseract spawn: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DomainError::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
