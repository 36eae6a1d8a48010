/// コア型定義
///
/// Domain層の中心となるデータ構造。
/// すべてのステージで共有される型。

use std::collections::BTreeMap;
use std::time::Instant;

/// 検出モデルのラベル定数
pub mod labels {
    /// ヒーローの手番インジケータ（アクションボタン等）
    pub const HERO_ACTIVE: &str = "hero_active";
    /// ディーラーボタン
    pub const DEALER: &str = "dealer";
    /// プレイヤーのスタック表示テキスト
    pub const STACK_TEXT: &str = "stack_text";
    /// ポット表示テキスト
    pub const POT_TEXT: &str = "pot_text";
    /// ベット額表示テキスト
    pub const BET_TEXT: &str = "bet_text";

    /// 金額OCRの対象ラベルか
    pub fn is_money_text(label: &str) -> bool {
        matches!(label, STACK_TEXT | POT_TEXT | BET_TEXT)
    }
}

/// ピクセル座標で指定されるROI（Region of Interest）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    /// 新しいROIを作成
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// ROIの中心座標を取得
    #[allow(dead_code)]
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// ROIの面積を取得
    #[allow(dead_code)]
    pub fn area(&self) -> u32 {
        self.width * self.height
    }
}

/// ROIを境界内にクランプ
///
/// ROIが境界外にはみ出している場合、境界内に収まるように調整。
/// ROIが完全に境界外の場合はNoneを返す。
pub fn clamp_roi(roi: &Roi, bounds_width: u32, bounds_height: u32) -> Option<Roi> {
    // 境界またはROIのサイズが0なら無効
    if bounds_width == 0 || bounds_height == 0 || roi.width == 0 || roi.height == 0 {
        return None;
    }

    // ROIが完全に境界外ならNone
    if roi.x >= bounds_width || roi.y >= bounds_height {
        return None;
    }

    let max_w = bounds_width - roi.x;
    let max_h = bounds_height - roi.y;
    let clamped_width = roi.width.min(max_w);
    let clamped_height = roi.height.min(max_h);

    if clamped_width == 0 || clamped_height == 0 {
        return None;
    }

    Some(Roi::new(roi.x, roi.y, clamped_width, clamped_height))
}

/// スクリーン座標のウィンドウ矩形（負座標を許容）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// フレーム境界にクランプしたROIへ変換
    ///
    /// ウィンドウが画面左上をはみ出している場合は可視部分のみを残す。
    /// 完全に画面外ならNone。
    pub fn to_roi_clamped(&self, bounds_width: u32, bounds_height: u32) -> Option<Roi> {
        // 負座標側のはみ出しを切り詰め
        let clip_x = (-self.x).max(0) as u32;
        let clip_y = (-self.y).max(0) as u32;
        if clip_x >= self.width || clip_y >= self.height {
            return None;
        }

        let roi = Roi::new(
            self.x.max(0) as u32,
            self.y.max(0) as u32,
            self.width - clip_x,
            self.height - clip_y,
        );
        clamp_roi(&roi, bounds_width, bounds_height)
    }
}

/// ウィンドウ列挙結果の1エントリ
#[derive(Debug, Clone)]
pub struct WindowDescriptor {
    pub title: String,
    pub rect: WindowRect,
}

/// キャプチャされたフレームデータ
#[derive(Debug, Clone)]
pub struct Frame {
    /// フレーム取得時刻
    pub captured_at: Instant,
    /// フレーム画像データ（RGBA8形式、連続メモリ）
    pub data: Vec<u8>,
    /// 画像の幅
    pub width: u32,
    /// 画像の高さ
    pub height: u32,
}

impl Frame {
    /// 1ピクセルあたりのバイト数（RGBA8）
    pub const BYTES_PER_PIXEL: usize = 4;

    /// 新しいフレームを作成
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            captured_at: Instant::now(),
            data,
            width,
            height,
        }
    }

    /// ROI領域を切り出した新しいフレームを返す
    ///
    /// ROIはフレーム境界にクランプされる。完全に境界外ならNone。
    /// 切り出し後のフレームは元フレームのcaptured_atを引き継ぐ。
    pub fn crop(&self, roi: &Roi) -> Option<Frame> {
        let roi = clamp_roi(roi, self.width, self.height)?;

        let src_stride = self.width as usize * Self::BYTES_PER_PIXEL;
        let row_size = roi.width as usize * Self::BYTES_PER_PIXEL;
        let mut data = Vec::with_capacity(roi.height as usize * row_size);

        for row in 0..roi.height as usize {
            let src_offset =
                (roi.y as usize + row) * src_stride + roi.x as usize * Self::BYTES_PER_PIXEL;
            data.extend_from_slice(&self.data[src_offset..src_offset + row_size]);
        }

        Some(Frame {
            captured_at: self.captured_at,
            data,
            width: roi.width,
            height: roi.height,
        })
    }
}

/// 検出ボックス（ピクセル座標、x1y1=左上 / x2y2=右下）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// ボックスの中心座標
    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// 2つのボックスのIoU（Intersection over Union）
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let iw = (ix2 - ix1).max(0.0);
        let ih = (iy2 - iy1).max(0.0);
        let intersection = iw * ih;

        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }

    /// フレーム境界にクランプしたROIへ変換
    ///
    /// ボックスが完全に境界外、またはクランプ後のサイズが0ならNone。
    pub fn to_roi_clamped(&self, bounds_width: u32, bounds_height: u32) -> Option<Roi> {
        let x1 = self.x1.max(0.0).floor() as u32;
        let y1 = self.y1.max(0.0).floor() as u32;
        let x2 = self.x2.max(0.0).ceil() as u32;
        let y2 = self.y2.max(0.0).ceil() as u32;
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        clamp_roi(&Roi::new(x1, y1, x2 - x1, y2 - y1), bounds_width, bounds_height)
    }
}

/// 物体検出の1件分の結果
#[derive(Debug, Clone)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// テーブルフォーマット（卓の最大人数）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    SixMax,
    NineMax,
}

impl TableFormat {
    /// 最大着席人数
    pub fn seats(&self) -> u8 {
        match self {
            Self::SixMax => 6,
            Self::NineMax => 9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SixMax => "6-max",
            Self::NineMax => "9-max",
        }
    }
}

impl std::fmt::Display for TableFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OCRから得られた経済状態（ポット・スタック・ベット）
///
/// stacks/betsのキーはシートインデックス（0 = ヒーロー席）。
#[derive(Debug, Clone, Default)]
pub struct EconomicState {
    pub pot: f64,
    pub stacks: BTreeMap<u8, f64>,
    pub bets: BTreeMap<u8, f64>,
}
