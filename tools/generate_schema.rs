//! 設定スキーマ生成ツール
//!
//! `AppConfig`から schema/config.json と CONFIGURATION.md を生成する。
//! 設定項目の説明はsrc/domain/config.rsのdocコメントが出典なので、
//! ドキュメントを直すときはそちらを編集してから再生成する。
//!
//! 実行: `cargo run --bin generate_schema`

use schemars::schema_for;
use serde_json::{Map, Value};
use std::fs;
use tablesight::domain::config::AppConfig;

fn main() {
    let schema = schema_for!(AppConfig);
    let json = serde_json::to_string_pretty(&schema).expect("Failed to serialize schema");

    fs::create_dir_all("schema").expect("Failed to create schema/ directory");
    fs::write("schema/config.json", &json).expect("Failed to write schema/config.json");
    println!("wrote schema/config.json");

    let schema_value: Value = serde_json::from_str(&json).expect("Failed to parse schema");
    fs::write("CONFIGURATION.md", render_markdown(&schema_value))
        .expect("Failed to write CONFIGURATION.md");
    println!("wrote CONFIGURATION.md");
}

fn render_markdown(schema: &Value) -> String {
    let mut md = String::new();

    md.push_str("# 設定リファレンス\n\n");
    md.push_str("`config.toml`（プロジェクトルート）でtablesightの動作を調整する。\n");
    md.push_str("ファイルが無い・パースできない場合はデフォルト値で起動する（警告ログあり）。\n");
    md.push_str("サンプルは`config.toml.example`を参照。\n\n");
    md.push_str("このファイルは`cargo run --bin generate_schema`による自動生成。\n\n");

    let defs = schema
        .get("$defs")
        .and_then(|d| d.as_object())
        .cloned()
        .unwrap_or_default();

    if let Some(sections) = schema.get("properties").and_then(|p| p.as_object()) {
        for (key, section) in sections {
            render_section(&mut md, key, section, &defs);
        }
    }

    md
}

/// 1セクション（[pipeline]等）の見出しとフィールド表を出力
fn render_section(md: &mut String, key: &str, section: &Value, defs: &Map<String, Value>) {
    md.push_str(&format!("## [{}] - {}\n\n", key, section_title(key)));

    // セクションは$refで$defsを指す。解決してから表を作る
    let resolved = section
        .get("$ref")
        .and_then(|r| r.as_str())
        .and_then(|r| r.strip_prefix("#/$defs/"))
        .and_then(|name| defs.get(name))
        .unwrap_or(section);

    if let Some(desc) = resolved.get("description").and_then(|d| d.as_str()) {
        md.push_str(&format!("{}\n\n", desc));
    }

    let Some(fields) = resolved.get("properties").and_then(|p| p.as_object()) else {
        return;
    };
    if fields.is_empty() {
        return;
    }

    md.push_str("| 設定項目 | 型 | デフォルト | 説明 |\n");
    md.push_str("|---------|-----|---------|------|\n");
    for (name, field) in fields {
        md.push_str(&format!(
            "| `{}` | {} | {} | {} |\n",
            name,
            type_string(field).replace('|', "\\|"),
            default_string(field),
            description_string(field),
        ));
    }
    md.push('\n');
}

fn type_string(field: &Value) -> String {
    match field.get("type") {
        Some(Value::String(t)) => match t.as_str() {
            // 数値型はformat（uint32, double等）の方が情報量がある
            "integer" | "number" => field
                .get("format")
                .and_then(|f| f.as_str())
                .unwrap_or(t)
                .to_string(),
            "boolean" => "bool".to_string(),
            other => other.to_string(),
        },
        // Option<T>は["T", "null"]になる
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(" \\| "),
        _ => "unknown".to_string(),
    }
}

fn default_string(field: &Value) -> String {
    match field.get("default") {
        Some(Value::String(s)) => format!("`\"{}\"`", s),
        Some(Value::Number(n)) => format!("`{}`", n),
        Some(Value::Bool(b)) => format!("`{}`", b),
        Some(Value::Array(a)) if a.is_empty() => "`[]`".to_string(),
        _ => "-".to_string(),
    }
}

fn description_string(field: &Value) -> String {
    field
        .get("description")
        .and_then(|d| d.as_str())
        .map(|d| d.replace("\n\n", "<br>").replace('\n', " ").replace('|', "\\|"))
        .unwrap_or_else(|| "-".to_string())
}

fn section_title(key: &str) -> &'static str {
    match key {
        "pipeline" => "パイプライン",
        "capture" => "キャプチャ",
        "locator" => "ウィンドウロケータ",
        "detector" => "物体検出",
        "ocr" => "OCR",
        "self_check" => "セルフチェック",
        _ => "その他",
    }
}
