//! ウィンドウロケータステージ
//!
//! テーブルウィンドウをタイトルのキーワードで特定し、
//! コンテキストにタイトルと矩形を書き込む。
//!
//! - スキャンはスロットリングされる（デフォルト2秒間隔）
//! - 前回マッチしたタイトルが健在ならそれを優先（卓の飛び移り防止）
//! - タイトルに「SB/BB」表記があればブラインドも抽出する
//! - 候補が見つからないサイクルでは前回値を保持する
//! - 列挙バックエンドが利用不可なら恒久的にno-op（1回だけログ）

use std::time::Instant;

use crate::application::context::PipelineContext;
use crate::application::stage::{Stage, StageResult, StageStatus};
use crate::domain::blinds::parse_blinds;
use crate::domain::config::LocatorConfig;
use crate::domain::ports::WindowEnumerator;
use crate::domain::{DomainError, WindowDescriptor};

pub struct WindowLocatorStage<E: WindowEnumerator> {
    enumerator: E,
    include_keywords: Vec<String>,
    exclude_keywords: Vec<String>,
    scan_interval: std::time::Duration,
    last_scan: Option<Instant>,
    cached_title: Option<String>,
    unavailable: bool,
}

impl<E: WindowEnumerator> WindowLocatorStage<E> {
    pub fn new(enumerator: E, config: &LocatorConfig) -> Self {
        Self {
            enumerator,
            include_keywords: config
                .include_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            exclude_keywords: config
                .exclude_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            scan_interval: config.scan_interval(),
            last_scan: None,
            cached_title: None,
            unavailable: false,
        }
    }

    /// タイトルがキーワードフィルタを通過するか
    fn is_candidate(&self, title: &str) -> bool {
        if title.is_empty() {
            return false;
        }
        let lower = title.to_lowercase();

        if self.exclude_keywords.iter().any(|k| lower.contains(k)) {
            return false;
        }
        self.include_keywords.iter().any(|k| lower.contains(k))
    }

    /// 列挙結果から追跡すべきウィンドウを選ぶ
    fn select_window<'a>(&self, windows: &'a [WindowDescriptor]) -> Option<&'a WindowDescriptor> {
        // 前回のタイトルがまだ存在しフィルタも通るなら維持
        if let Some(cached) = &self.cached_title {
            if let Some(w) = windows
                .iter()
                .find(|w| &w.title == cached && self.is_candidate(&w.title))
            {
                return Some(w);
            }
        }

        windows.iter().find(|w| self.is_candidate(&w.title))
    }
}

impl<E: WindowEnumerator> Stage for WindowLocatorStage<E> {
    fn name(&self) -> &'static str {
        "window_locator"
    }

    fn process(&mut self, ctx: &mut PipelineContext) -> StageResult {
        if self.unavailable {
            return Ok(StageStatus::Skipped);
        }

        // スキャン間隔のスロットリング
        if let Some(last) = self.last_scan {
            if last.elapsed() < self.scan_interval {
                return Ok(StageStatus::Skipped);
            }
        }
        self.last_scan = Some(Instant::now());

        let windows = match self.enumerator.enumerate() {
            Ok(windows) => windows,
            Err(DomainError::ResourceUnavailable(reason)) => {
                // バックエンド自体が無い環境。以後このステージはno-op
                tracing::warn!(reason = %reason, "Window enumeration unavailable; locator disabled");
                self.unavailable = true;
                return Ok(StageStatus::Skipped);
            }
            Err(e) => return Err(e),
        };

        match self.select_window(&windows) {
            Some(window) => {
                if self.cached_title.as_deref() != Some(window.title.as_str()) {
                    tracing::info!(title = %window.title, "Tracking table window");
                }
                self.cached_title = Some(window.title.clone());
                ctx.window_title = Some(window.title.clone());
                ctx.window_rect = Some(window.rect);

                // タイトルに表記が無いサイクルでは前回のブラインドを保持
                if let Some(blinds) = parse_blinds(&window.title) {
                    if ctx.blinds != Some(blinds) {
                        tracing::info!(
                            sb = blinds.small,
                            bb = blinds.big,
                            "Blinds parsed from window title"
                        );
                    }
                    ctx.blinds = Some(blinds);
                }
            }
            None => {
                // 候補なし: 前回の矩形を保持（stale-but-present）
                tracing::debug!("No table window matched; keeping previous rect");
            }
        }

        Ok(StageStatus::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::WindowRect;
    use crate::domain::DomainResult;
    use std::collections::VecDeque;

    struct ScriptedEnumerator {
        responses: VecDeque<DomainResult<Vec<WindowDescriptor>>>,
    }

    impl ScriptedEnumerator {
        fn new(responses: Vec<DomainResult<Vec<WindowDescriptor>>>) -> Self {
            Self {
                responses: responses.into(),
            }
        }
    }

    impl WindowEnumerator for ScriptedEnumerator {
        fn enumerate(&mut self) -> DomainResult<Vec<WindowDescriptor>> {
            self.responses.pop_front().unwrap_or_else(|| Ok(vec![]))
        }
    }

    fn window(title: &str) -> WindowDescriptor {
        WindowDescriptor {
            title: title.to_string(),
            rect: WindowRect::new(10, 20, 800, 600),
        }
    }

    fn config_no_throttle() -> LocatorConfig {
        LocatorConfig {
            scan_interval_ms: 1,
            ..LocatorConfig::default()
        }
    }

    #[test]
    fn test_matches_keyword_case_insensitive() {
        let enumerator = ScriptedEnumerator::new(vec![Ok(vec![
            window("Text Editor"),
            window("NL Holdem Table #42"),
        ])]);
        let mut stage = WindowLocatorStage::new(enumerator, &config_no_throttle());
        let mut ctx = PipelineContext::default();

        stage.process(&mut ctx).unwrap();

        assert_eq!(ctx.window_title.as_deref(), Some("NL Holdem Table #42"));
        assert!(ctx.window_rect.is_some());
    }

    #[test]
    fn test_exclude_keywords_filter_lobby() {
        let enumerator =
            ScriptedEnumerator::new(vec![Ok(vec![window("PokerStars Lobby")])]);
        let mut stage = WindowLocatorStage::new(enumerator, &config_no_throttle());
        let mut ctx = PipelineContext::default();

        stage.process(&mut ctx).unwrap();

        assert!(ctx.window_title.is_none());
    }

    #[test]
    fn test_window_loss_retains_previous_rect() {
        let enumerator = ScriptedEnumerator::new(vec![
            Ok(vec![window("Holdem Table")]),
            Ok(vec![]),
        ]);
        let mut stage = WindowLocatorStage::new(enumerator, &config_no_throttle());
        let mut ctx = PipelineContext::default();

        stage.process(&mut ctx).unwrap();
        let rect = ctx.window_rect;
        assert!(rect.is_some());

        std::thread::sleep(std::time::Duration::from_millis(5));
        stage.process(&mut ctx).unwrap();

        // ウィンドウ消失後も前回値を保持
        assert_eq!(ctx.window_rect, rect);
        assert_eq!(ctx.window_title.as_deref(), Some("Holdem Table"));
    }

    #[test]
    fn test_prefers_cached_title() {
        let first = vec![window("Holdem Table A"), window("Holdem Table B")];
        // 2回目は順序が入れ替わってもAを追い続ける
        let second = vec![window("Holdem Table B"), window("Holdem Table A")];
        let enumerator = ScriptedEnumerator::new(vec![Ok(first), Ok(second)]);
        let mut stage = WindowLocatorStage::new(enumerator, &config_no_throttle());
        let mut ctx = PipelineContext::default();

        stage.process(&mut ctx).unwrap();
        assert_eq!(ctx.window_title.as_deref(), Some("Holdem Table A"));

        std::thread::sleep(std::time::Duration::from_millis(5));
        stage.process(&mut ctx).unwrap();
        assert_eq!(ctx.window_title.as_deref(), Some("Holdem Table A"));
    }

    #[test]
    fn test_blinds_extracted_from_title() {
        let enumerator =
            ScriptedEnumerator::new(vec![Ok(vec![window("NL Holdem $0.50/$1.00 - Table 3")])]);
        let mut stage = WindowLocatorStage::new(enumerator, &config_no_throttle());
        let mut ctx = PipelineContext::default();

        stage.process(&mut ctx).unwrap();

        let blinds = ctx.blinds.unwrap();
        assert_eq!(blinds.small, 0.5);
        assert_eq!(blinds.big, 1.0);
    }

    #[test]
    fn test_blinds_retained_when_title_lacks_them() {
        // 1回目はブラインド付きタイトル、2回目は表記なしの別卓
        let enumerator = ScriptedEnumerator::new(vec![
            Ok(vec![window("Tournament 100/200 Freeroll")]),
            Ok(vec![window("Holdem Table")]),
        ]);
        let mut stage = WindowLocatorStage::new(enumerator, &config_no_throttle());
        let mut ctx = PipelineContext::default();

        stage.process(&mut ctx).unwrap();
        assert!(ctx.blinds.is_some());

        std::thread::sleep(std::time::Duration::from_millis(5));
        stage.process(&mut ctx).unwrap();

        let blinds = ctx.blinds.unwrap();
        assert_eq!(blinds.small, 100.0);
        assert_eq!(blinds.big, 200.0);
    }

    #[test]
    fn test_throttles_scans() {
        let enumerator = ScriptedEnumerator::new(vec![Ok(vec![window("Holdem Table")])]);
        let config = LocatorConfig {
            scan_interval_ms: 60_000,
            ..LocatorConfig::default()
        };
        let mut stage = WindowLocatorStage::new(enumerator, &config);
        let mut ctx = PipelineContext::default();

        assert_eq!(stage.process(&mut ctx).unwrap(), StageStatus::Completed);
        // 間隔内の再実行はスキップ
        assert_eq!(stage.process(&mut ctx).unwrap(), StageStatus::Skipped);
    }

    #[test]
    fn test_unavailable_backend_disables_stage() {
        let enumerator = ScriptedEnumerator::new(vec![
            Err(DomainError::ResourceUnavailable("no backend".to_string())),
            Ok(vec![window("Holdem Table")]),
        ]);
        let mut stage = WindowLocatorStage::new(enumerator, &config_no_throttle());
        let mut ctx = PipelineContext::default();

        assert_eq!(stage.process(&mut ctx).unwrap(), StageStatus::Skipped);

        // 以後は列挙すら行わない
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(stage.process(&mut ctx).unwrap(), StageStatus::Skipped);
        assert!(ctx.window_title.is_none());
    }
}
