/// Port定義（Clean Architectureのインターフェース）
///
/// Domain層が外部実装に依存するための抽象trait。
/// Infrastructure層がこれらを実装し、Application層がDIで注入する。

use crate::domain::{Detection, DomainResult, Frame, WindowDescriptor};

/// フレームソース: 画面フレームの取得を抽象化
///
/// 実装はバックグラウンドでキャプチャを継続し、
/// `latest_frame()`は常にノンブロッキングで最新値を返す。
pub trait FrameSource: Send {
    /// 最新フレームを取得する（ノンブロッキング）
    ///
    /// # Returns
    /// - `Ok(Some(Frame))`: 最後に観測されたフレーム（新規とは限らない）
    /// - `Ok(None)`: まだ一度もフレームが届いていない（キャッシュミス、エラーではない）
    /// - `Err(DomainError)`: 致命的エラー
    fn latest_frame(&mut self) -> DomainResult<Option<Frame>>;

    /// キャプチャソースの情報を取得
    fn source_info(&self) -> SourceInfo;
}

/// キャプチャソース情報
///
/// origin_x/origin_yはソース左上のグローバルスクリーン座標。
/// マルチモニタ環境ではセカンダリモニタが非ゼロ原点を持つ。
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub origin_x: i32,
    pub origin_y: i32,
}

/// ウィンドウ列挙: トップレベルウィンドウの一覧取得を抽象化
pub trait WindowEnumerator: Send {
    /// 現在のトップレベルウィンドウを列挙する
    ///
    /// # Returns
    /// - `Ok(Vec<WindowDescriptor>)`: タイトルと矩形のリスト
    /// - `Err(DomainError::ResourceUnavailable)`: 列挙バックエンド自体が利用不可（恒久的）
    /// - `Err(DomainError)`: その他の一時的エラー
    fn enumerate(&mut self) -> DomainResult<Vec<WindowDescriptor>>;
}

/// 検出モデル: 物体検出（YOLO系）を抽象化
pub trait DetectionModel: Send {
    /// フレームに対して推論を実行し、生の検出結果を返す
    ///
    /// 信頼度フィルタ・NMSは呼び出し側（DetectorStage）が行う。
    fn infer(&mut self, frame: &Frame) -> DomainResult<Vec<Detection>>;
}

impl DetectionModel for Box<dyn DetectionModel> {
    fn infer(&mut self, frame: &Frame) -> DomainResult<Vec<Detection>> {
        (**self).infer(frame)
    }
}

/// テキスト認識: OCRバックエンドを抽象化
pub trait TextRecognizer: Send {
    /// 前処理済みの8bitグレースケール画像からテキストを認識する
    ///
    /// # Arguments
    /// - `pixels`: 輝度値の連続メモリ（width * height バイト）
    /// - `width` / `height`: 画像サイズ
    fn recognize(&mut self, pixels: &[u8], width: u32, height: u32) -> DomainResult<String>;
}
