//! 設定管理
//!
//! TOML設定ファイルの読み込みとDomain型への変換。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::domain::{DomainError, DomainResult};

/// キャプチャソース
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    /// モニタ全体をキャプチャ（xcapバックエンド）
    #[default]
    Monitor,
}

/// アプリケーション設定のルート構造
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AppConfig {
    /// パイプライン設定
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// キャプチャ設定
    #[serde(default)]
    pub capture: CaptureConfig,
    /// ウィンドウロケータ設定
    #[serde(default)]
    pub locator: LocatorConfig,
    /// 物体検出設定
    #[serde(default)]
    pub detector: DetectorConfig,
    /// OCR設定
    #[serde(default)]
    pub ocr: OcrConfig,
    /// セルフチェック設定
    #[serde(default)]
    pub self_check: SelfCheckConfig,
}

/// パイプライン設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PipelineConfig {
    /// アイドル時（ヒーロー非手番）のサイクルレート（fps）
    ///
    /// デフォルト: 5
    pub fps_idle: f64,

    /// アクティブ時（ヒーロー手番）のサイクルレート（fps）
    ///
    /// デフォルト: 30
    pub fps_active: f64,

    /// 統計情報の出力間隔（秒）
    pub stats_interval_sec: u64,
}

impl PipelineConfig {
    /// デフォルトのアイドルレート（fps）
    pub const DEFAULT_FPS_IDLE: f64 = 5.0;
    /// デフォルトのアクティブレート（fps）
    pub const DEFAULT_FPS_ACTIVE: f64 = 30.0;
    /// デフォルトの統計出力間隔（秒）
    pub const DEFAULT_STATS_INTERVAL_SEC: u64 = 10;

    /// アイドル時のサイクル間隔
    pub fn idle_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps_idle)
    }

    /// アクティブ時のサイクル間隔
    pub fn active_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps_active)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_sec)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fps_idle: Self::DEFAULT_FPS_IDLE,
            fps_active: Self::DEFAULT_FPS_ACTIVE,
            stats_interval_sec: Self::DEFAULT_STATS_INTERVAL_SEC,
        }
    }
}

/// キャプチャ設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CaptureConfig {
    /// キャプチャソース
    ///
    /// 選択肢: "monitor"
    #[serde(default)]
    pub source: CaptureSource,

    /// キャプチャ対象モニタのインデックス
    ///
    /// 範囲外の場合はプライマリモニタにフォールバック。通常は0
    pub monitor_index: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: CaptureSource::default(),
            monitor_index: 0,
        }
    }
}

/// ウィンドウロケータ設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LocatorConfig {
    /// ウィンドウ再スキャン間隔（ミリ秒）
    ///
    /// デフォルト: 2000ms
    pub scan_interval_ms: u64,

    /// タイトルに含まれていれば候補とするキーワード（小文字部分一致）
    #[serde(default = "LocatorConfig::default_include_keywords")]
    pub include_keywords: Vec<String>,

    /// タイトルに含まれていたら除外するキーワード（小文字部分一致）
    #[serde(default = "LocatorConfig::default_exclude_keywords")]
    pub exclude_keywords: Vec<String>,
}

impl LocatorConfig {
    /// デフォルトのスキャン間隔（ミリ秒）
    pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 2000;

    fn default_include_keywords() -> Vec<String> {
        [
            "holdem",
            "mesa",
            "table",
            "poker",
            "ciegas",
            "blinds",
            "green",
            "tournament",
            "freeroll",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn default_exclude_keywords() -> Vec<String> {
        [
            "lobby",
            "tournament lobby",
            "manager",
            "cashier",
            "login",
            "log in",
            "settings",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: Self::DEFAULT_SCAN_INTERVAL_MS,
            include_keywords: Self::default_include_keywords(),
            exclude_keywords: Self::default_exclude_keywords(),
        }
    }
}

/// 物体検出設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DetectorConfig {
    /// ONNXモデルファイルのパス
    ///
    /// 空文字列 = 検出無効（ステージはno-op）
    #[serde(default)]
    pub model_path: String,

    /// 信頼度の下限（これ未満の検出は破棄）
    ///
    /// デフォルト: 0.45
    pub confidence_threshold: f32,

    /// NMSのIoU閾値（同一ラベルでこの値を超える重なりは抑制）
    ///
    /// デフォルト: 0.6
    pub iou_threshold: f32,

    /// モデルの入力解像度（正方形、ピクセル）
    pub input_size: u32,

    /// クラスインデックス → ラベル名
    #[serde(default = "DetectorConfig::default_class_names")]
    pub class_names: Vec<String>,
}

impl DetectorConfig {
    /// デフォルトの信頼度閾値
    pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.45;
    /// デフォルトのNMS IoU閾値
    pub const DEFAULT_IOU_THRESHOLD: f32 = 0.6;
    /// デフォルトのモデル入力サイズ
    pub const DEFAULT_INPUT_SIZE: u32 = 640;

    fn default_class_names() -> Vec<String> {
        use crate::domain::types::labels;
        [
            labels::HERO_ACTIVE,
            labels::DEALER,
            labels::STACK_TEXT,
            labels::POT_TEXT,
            labels::BET_TEXT,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: String::new(),
            confidence_threshold: Self::DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: Self::DEFAULT_IOU_THRESHOLD,
            input_size: Self::DEFAULT_INPUT_SIZE,
            class_names: Self::default_class_names(),
        }
    }
}

/// OCR設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OcrConfig {
    /// tesseract実行コマンド
    pub tesseract_cmd: String,

    /// tesseractのページセグメンテーションモード（7 = 単一行）
    pub psm: u32,

    /// 認識対象の文字ホワイトリスト
    pub char_whitelist: String,

    /// 前処理での拡大倍率
    ///
    /// デフォルト: 3
    pub upscale_factor: u32,

    /// 平滑化バッファの長さ（直近N値の中央値）
    ///
    /// デフォルト: 5
    pub buffer_len: usize,

    /// 空間バケットのセルサイズ（ピクセル）
    ///
    /// 検出ボックス左上をこのサイズで量子化してバッファを割り当てる。
    /// デフォルト: 50
    pub bucket_cell_px: u32,
}

impl OcrConfig {
    /// デフォルトの拡大倍率
    pub const DEFAULT_UPSCALE_FACTOR: u32 = 3;
    /// デフォルトのバッファ長
    pub const DEFAULT_BUFFER_LEN: usize = 5;
    /// デフォルトのバケットセルサイズ（ピクセル）
    pub const DEFAULT_BUCKET_CELL_PX: u32 = 50;
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: "tesseract".to_string(),
            psm: 7,
            char_whitelist: "0123456789.,kmKM$".to_string(),
            upscale_factor: Self::DEFAULT_UPSCALE_FACTOR,
            buffer_len: Self::DEFAULT_BUFFER_LEN,
            bucket_cell_px: Self::DEFAULT_BUCKET_CELL_PX,
        }
    }
}

/// セルフチェック設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SelfCheckConfig {
    /// チェック間隔（ミリ秒）
    pub interval_ms: u64,

    /// 黒画面判定の平均輝度閾値（0-255）
    ///
    /// フレームの平均輝度がこの値以下なら vision NG
    pub black_threshold: f64,
}

impl SelfCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for SelfCheckConfig {
    fn default() -> Self {
        Self {
            interval_ms: 3000,
            black_threshold: 5.0,
        }
    }
}

impl AppConfig {
    /// TOMLファイルから設定を読み込む
    pub fn from_file<P: AsRef<Path>>(path: P) -> DomainResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Configuration(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content)
            .map_err(|e| DomainError::Configuration(format!("Failed to parse config file: {}", e)))
    }

    /// デフォルト設定をTOMLファイルに書き出す
    #[allow(dead_code)]
    pub fn write_default<P: AsRef<Path>>(path: P) -> DomainResult<()> {
        let config = Self::default();
        let content = toml::to_string_pretty(&config).map_err(|e| {
            DomainError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content)
            .map_err(|e| DomainError::Configuration(format!("Failed to write config file: {}", e)))
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> DomainResult<()> {
        // サイクルレートの検証
        if self.pipeline.fps_idle <= 0.0 || self.pipeline.fps_active <= 0.0 {
            return Err(DomainError::Configuration(
                "fps_idle and fps_active must be greater than 0".to_string(),
            ));
        }

        // ロケータの検証
        if self.locator.scan_interval_ms == 0 {
            return Err(DomainError::Configuration(
                "Locator scan interval must be greater than 0".to_string(),
            ));
        }
        if self.locator.include_keywords.is_empty() {
            return Err(DomainError::Configuration(
                "Locator include_keywords must not be empty".to_string(),
            ));
        }

        // 検出閾値の検証
        let det = &self.detector;
        if !(0.0..=1.0).contains(&det.confidence_threshold) {
            return Err(DomainError::Configuration(
                "Confidence threshold must be within 0.0-1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&det.iou_threshold) || det.iou_threshold == 0.0 {
            return Err(DomainError::Configuration(
                "IoU threshold must be within (0.0, 1.0]".to_string(),
            ));
        }
        if det.input_size == 0 {
            return Err(DomainError::Configuration(
                "Detector input size must be greater than 0".to_string(),
            ));
        }

        // OCRの検証
        let ocr = &self.ocr;
        if ocr.buffer_len == 0 {
            return Err(DomainError::Configuration(
                "OCR buffer length must be greater than 0".to_string(),
            ));
        }
        if ocr.bucket_cell_px == 0 {
            return Err(DomainError::Configuration(
                "OCR bucket cell size must be greater than 0".to_string(),
            ));
        }
        if ocr.upscale_factor == 0 || ocr.upscale_factor > 8 {
            return Err(DomainError::Configuration(
                "OCR upscale factor must be within 1-8".to_string(),
            ));
        }
        if ocr.tesseract_cmd.trim().is_empty() {
            return Err(DomainError::Configuration(
                "tesseract_cmd must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
