/// エラー型定義
///
/// Domain層の統一エラー型。thiserrorを使用して型安全なエラー処理を提供します。
///
/// # 設計方針
/// - unwrap()の使用を禁止し、明示的なエラーハンドリングを強制
/// - Result型でエラー伝播を明示化
/// - 回復可能性をエラー型で表現（一時的な失敗 vs ResourceUnavailable）

use thiserror::Error;

/// Domain層の統一エラー型
#[allow(dead_code)]
#[derive(Error, Debug)]
pub enum DomainError {
    /// キャプチャ関連のエラー
    #[error("Capture error: {0}")]
    Capture(String),

    /// ウィンドウ列挙関連のエラー
    #[error("Window enumeration error: {0}")]
    WindowEnum(String),

    /// 物体検出関連のエラー
    #[error("Detection error: {0}")]
    Detection(String),

    /// テキスト認識（OCR）関連のエラー
    #[error("Recognition error: {0}")]
    Recognition(String),

    /// 設定関連のエラー
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 初期化エラー
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// リソース利用不可（Non-recoverable）
    ///
    /// バックエンド自体が存在しない場合など、
    /// リトライしても回復しない恒久的なエラー。
    /// 該当ステージは以後no-opとなる。
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// その他のエラー
    #[error("Unexpected error: {0}")]
    Other(String),
}

/// Domain層の統一Result型
pub type DomainResult<T> = Result<T, DomainError>;
