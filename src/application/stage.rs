//! パイプラインステージの抽象
//!
//! 各ステージは共有コンテキストを受け取り、明示的な結果型を返す。
//! エラーはオーケストレータがログして次のステージへ進む（失敗の隔離）。

use crate::application::context::PipelineContext;
use crate::domain::DomainError;

/// ステージ正常終了時のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// 実行して状態を更新した
    Completed,
    /// 今回は実行しなかった（スロットリング、入力不足、バックエンド無効）
    Skipped,
}

/// ステージの実行結果
pub type StageResult = Result<StageStatus, DomainError>;

/// パイプラインステージ
pub trait Stage {
    /// ログ・統計用のステージ名
    fn name(&self) -> &'static str;

    /// 1サイクル分の処理を実行する
    fn process(&mut self, ctx: &mut PipelineContext) -> StageResult;
}
