//! Application Layer
//!
//! パイプラインの制御、ステージ実装、統計管理などのユースケースを実装します。
//!
//! ## モジュール構成
//! - `context`: ステージ間で共有するパイプラインコンテキスト
//! - `stage`: ステージ抽象（name / process）
//! - `stages`: ロケータ・キャプチャ・セルフチェック・検出・OCR融合の各実装
//! - `pipeline`: 単一スレッドのサイクル実行とケイデンス制御
//! - `stats`: 統計情報管理（FPS、ステージ別レイテンシ）

pub mod context;
pub mod pipeline;
pub mod stage;
pub mod stages;
pub mod stats;
