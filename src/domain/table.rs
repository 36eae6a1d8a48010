//! テーブルレイアウト判定
//!
//! 検出結果の正規化座標からテーブルフォーマット（6-max / 9-max）を
//! 分類し、金額テキストを最寄りのシートに対応付ける。
//!
//! シートアンカーは主要クライアントの標準レイアウト（正規化座標）。
//! インデックス0はヒーロー席（画面下中央）。

use crate::domain::types::{labels, Detection, TableFormat};

/// 9-max卓にのみスタック表示が現れる左右のゾーン（正規化座標）
///
/// 左: (0.12, 0.65)-(0.22, 0.85)、右はそのミラー。
const NINE_MAX_ZONES: [(f32, f32, f32, f32); 2] = [
    (0.12, 0.65, 0.22, 0.85),
    (0.78, 0.65, 0.88, 0.85),
];

/// 6-max卓のシートアンカー（ヒーロー席 + 6席）
const SIX_MAX_ANCHORS: [(f32, f32); 7] = [
    (0.50, 0.68),
    (0.28, 0.65),
    (0.12, 0.45),
    (0.35, 0.25),
    (0.65, 0.25),
    (0.88, 0.45),
    (0.72, 0.65),
];

/// 9-max卓のシートアンカー
const NINE_MAX_ANCHORS: [(f32, f32); 9] = [
    (0.50, 0.68),
    (0.32, 0.66),
    (0.16, 0.52),
    (0.14, 0.32),
    (0.30, 0.22),
    (0.70, 0.22),
    (0.86, 0.32),
    (0.84, 0.52),
    (0.68, 0.66),
];

/// シート対応付けの最大距離（正規化座標）
pub const MAX_SEAT_DISTANCE: f32 = 0.12;

/// テーブルフォーマットを分類する
///
/// stack_textの正規化中心が9-maxゾーンのいずれかに入っていればNineMax。
/// stack_textが1つもない場合はNone（判定材料なし、呼び出し側は前回値を保持）。
pub fn classify_format(detections: &[Detection], frame_width: u32, frame_height: u32) -> Option<TableFormat> {
    if frame_width == 0 || frame_height == 0 {
        return None;
    }

    let mut saw_stack = false;
    for det in detections.iter().filter(|d| d.label == labels::STACK_TEXT) {
        saw_stack = true;
        let (cx, cy) = det.bbox.center();
        let nx = cx / frame_width as f32;
        let ny = cy / frame_height as f32;

        let in_zone = NINE_MAX_ZONES
            .iter()
            .any(|&(x1, y1, x2, y2)| nx >= x1 && nx <= x2 && ny >= y1 && ny <= y2);
        if in_zone {
            return Some(TableFormat::NineMax);
        }
    }

    if saw_stack {
        Some(TableFormat::SixMax)
    } else {
        None
    }
}

/// フォーマットに応じたシートアンカーを返す
pub fn seat_anchors(format: TableFormat) -> &'static [(f32, f32)] {
    match format {
        TableFormat::SixMax => &SIX_MAX_ANCHORS,
        TableFormat::NineMax => &NINE_MAX_ANCHORS,
    }
}

/// 正規化座標に最も近いシートを返す
///
/// 最寄りアンカーまでの距離がMAX_SEAT_DISTANCEを超える場合はNone
/// （どの席にも属さないテキスト）。
pub fn nearest_seat(nx: f32, ny: f32, format: TableFormat) -> Option<u8> {
    let mut best: Option<(u8, f32)> = None;
    for (idx, &(ax, ay)) in seat_anchors(format).iter().enumerate() {
        let dist = ((nx - ax).powi(2) + (ny - ay).powi(2)).sqrt();
        match best {
            Some((_, d)) if d <= dist => {}
            _ => best = Some((idx as u8, dist)),
        }
    }
    best.filter(|&(_, d)| d <= MAX_SEAT_DISTANCE).map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::BoundingBox;

    fn stack_at(cx: f32, cy: f32) -> Detection {
        Detection {
            label: labels::STACK_TEXT.to_string(),
            confidence: 0.9,
            bbox: BoundingBox::new(cx - 10.0, cy - 5.0, cx + 10.0, cy + 5.0),
        }
    }

    #[test]
    fn test_classify_left_zone_is_nine_max() {
        // 1000x1000で正規化中心(0.15, 0.75) = 左ゾーン内
        let detections = vec![stack_at(150.0, 750.0)];
        assert_eq!(
            classify_format(&detections, 1000, 1000),
            Some(TableFormat::NineMax)
        );
    }

    #[test]
    fn test_classify_right_zone_is_nine_max() {
        let detections = vec![stack_at(830.0, 700.0)];
        assert_eq!(
            classify_format(&detections, 1000, 1000),
            Some(TableFormat::NineMax)
        );
    }

    #[test]
    fn test_classify_center_is_six_max() {
        let detections = vec![stack_at(500.0, 680.0)];
        assert_eq!(
            classify_format(&detections, 1000, 1000),
            Some(TableFormat::SixMax)
        );
    }

    #[test]
    fn test_classify_without_stacks_is_none() {
        let detections = vec![Detection {
            label: labels::DEALER.to_string(),
            confidence: 0.9,
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        }];
        assert_eq!(classify_format(&detections, 1000, 1000), None);
        assert_eq!(classify_format(&[], 1000, 1000), None);
    }

    #[test]
    fn test_nearest_seat_hero() {
        // ヒーロー席アンカー(0.50, 0.68)のすぐ近く
        assert_eq!(nearest_seat(0.51, 0.70, TableFormat::SixMax), Some(0));
    }

    #[test]
    fn test_nearest_seat_too_far() {
        // どのアンカーからも0.12以上離れた中央
        assert_eq!(nearest_seat(0.50, 0.45, TableFormat::SixMax), None);
    }

    #[test]
    fn test_nearest_seat_nine_max() {
        assert_eq!(nearest_seat(0.15, 0.33, TableFormat::NineMax), Some(3));
    }

    #[test]
    fn test_anchor_counts() {
        assert_eq!(seat_anchors(TableFormat::SixMax).len(), 7);
        assert_eq!(seat_anchors(TableFormat::NineMax).len(), 9);
    }
}
