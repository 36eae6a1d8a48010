//! Domain層: ビジネスロジックの中心
//!
//! 外部実装に依存しない型・trait・純粋ロジックの定義。
//! Applicationから注入され、Infrastructureで実装される。

pub mod amount;
pub mod blinds;
pub mod config;
pub mod error;
pub mod ports;
pub mod smoothing;
pub mod table;
pub mod types;

pub use config::*;
pub use error::*;
pub use ports::*;
pub use types::*;
