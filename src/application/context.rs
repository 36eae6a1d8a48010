//! パイプライン共有コンテキスト
//!
//! 全ステージが読み書きする型付き状態。各フィールドの書き込み責務は
//! 1ステージに限定される（読み取りは自由）。
//!
//! | フィールド        | 書き込みステージ |
//! |-------------------|------------------|
//! | window_title/rect/blinds | WindowLocator |
//! | frame             | Capture          |
//! | vision_ok / system_checked | SelfCheck |
//! | detections / hero_active / dealer_pos / table_format | Detector |
//! | economy           | OcrFusion        |
//!
//! ステージが失敗・スキップしても既存の値はクリアされない
//! （stale-but-present: 下流は常に「最後に観測できた状態」を見る）。

use crate::domain::blinds::Blinds;
use crate::domain::types::{Detection, EconomicState, Frame, TableFormat, WindowRect};

/// パイプライン実行コンテキスト
#[derive(Debug, Default)]
pub struct PipelineContext {
    /// 現在追跡中のテーブルウィンドウのタイトル
    pub window_title: Option<String>,
    /// 現在追跡中のテーブルウィンドウの矩形（スクリーン座標）
    pub window_rect: Option<WindowRect>,
    /// ウィンドウタイトルから抽出したブラインド（SB/BB）
    pub blinds: Option<Blinds>,
    /// 最新のフレーム（ウィンドウ矩形で切り出し済み）
    pub frame: Option<Frame>,
    /// 直近のセルフチェックでフレームが有効だったか
    pub vision_ok: bool,
    /// セルフチェックが少なくとも1回実行されたか
    pub system_checked: bool,
    /// 最新の検出結果（信頼度フィルタ・NMS適用済み）
    pub detections: Vec<Detection>,
    /// ヒーローの手番インジケータが検出されているか
    pub hero_active: bool,
    /// ディーラーボタンの中心座標（フレーム内ピクセル）
    pub dealer_pos: Option<(f32, f32)>,
    /// テーブルフォーマット（判定材料が揃うまでNone）
    pub table_format: Option<TableFormat>,
    /// OCRで得た経済状態
    pub economy: EconomicState,
}
