//! ウィンドウタイトルからのブラインド抽出
//!
//! テーブルウィンドウのタイトルには多くのクライアントで
//! 「$0.50/$1.00」「100/200」のようなブラインド表記が含まれる。
//! スラッシュ区切りの2値を抜き出してSB/BBとして解釈する。
//! 表記が無いタイトルはNone（呼び出し側は前回値を保持する）。

use regex::Regex;
use std::sync::OnceLock;

use crate::domain::amount::parse_amount;

/// ブラインド（SB/BB）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blinds {
    pub small: f64,
    pub big: f64,
}

/// 「数値/数値」表記の抽出パターン。各数値の前に通貨記号を許す
fn blinds_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:[$€¥£C]|BB)?\s*([0-9]+(?:[.,][0-9]+)?)\s*/\s*(?:[$€¥£C]|BB)?\s*([0-9]+(?:[.,][0-9]+)?)",
        )
        .expect("invalid blinds pattern")
    })
}

/// ウィンドウタイトルからブラインドを抽出する
///
/// 数値部分の解釈（小数点・カンマ）は金額テキストと同じ規則に従う。
/// BB < SB となる組は誤検出として捨てる。
pub fn parse_blinds(title: &str) -> Option<Blinds> {
    let caps = blinds_pattern().captures(title)?;
    let small = parse_amount(caps.get(1)?.as_str());
    let big = parse_amount(caps.get(2)?.as_str());
    if small <= 0.0 || big <= 0.0 || big < small {
        return None;
    }
    Some(Blinds { small, big })
}
