//! 金額テキストの数値化
//!
//! OCR出力の揺らぎ（文字の誤認識・桁区切りの地域差・通貨接尾辞）を
//! 吸収してf64に変換する。解析不能な場合は0.0を返す（呼び出し側の
//! 中央値フィルタが外れ値として吸収する前提）。

use regex::Regex;
use std::sync::OnceLock;

/// 最初の数値部分を抽出する正規表現（桁区切り・小数点を含む）
fn number_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]+(?:[.,][0-9]+)*").expect("invalid number pattern"))
}

/// OCRで得た金額テキストをf64へ変換する
///
/// 処理順:
/// 1. 小文字化・空白除去
/// 2. 誤認識しやすい文字の置換（o→0, l→1）
/// 3. k（×1,000）/ m（×1,000,000）接尾辞の検出
/// 4. 最初の数値部分を抽出
/// 5. 桁区切りの正規化:
///    - `.`と`,`が両方ある場合、先に現れる方を桁区切りとして除去し、
///      後の方を小数点とする（"2.500,00" → 2500.0, "1,234.56" → 1234.56）
///    - `,`のみの場合、カンマ1つ+直後3桁なら桁区切り（"3,400" → 3400.0）、
///      それ以外は小数点（"0,50" → 0.5）
///    - `.`のみの場合、2つ以上あればすべて桁区切りとして除去
/// 6. 解析失敗時は0.0
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            'o' => '0',
            'l' => '1',
            _ => c,
        })
        .collect();

    let multiplier = if cleaned.contains('k') {
        1_000.0
    } else if cleaned.contains('m') {
        1_000_000.0
    } else {
        1.0
    };

    let Some(m) = number_pattern().find(&cleaned) else {
        return 0.0;
    };

    let normalized = normalize_separators(m.as_str());
    normalized.parse::<f64>().unwrap_or(0.0) * multiplier
}

/// 桁区切り・小数点の正規化
fn normalize_separators(number: &str) -> String {
    let dot = number.find('.');
    let comma = number.find(',');

    match (dot, comma) {
        (Some(d), Some(c)) => {
            // 先に現れる方が桁区切り、後の方が小数点
            if d < c {
                number.replace('.', "").replace(',', ".")
            } else {
                number.replace(',', "")
            }
        }
        (None, Some(_)) => {
            let digits_after = number.rsplit(',').next().map(str::len).unwrap_or(0);
            if number.matches(',').count() == 1 && digits_after == 3 {
                // "3,400"は桁区切りとみなす
                number.replace(',', "")
            } else {
                number.replace(',', ".")
            }
        }
        (Some(_), None) => {
            if number.matches('.').count() > 1 {
                // 複数のピリオドはすべて桁区切り（"1.234.567" → 1234567）
                number.replace('.', "")
            } else {
                number.to_string()
            }
        }
        (None, None) => number.to_string(),
    }
}
