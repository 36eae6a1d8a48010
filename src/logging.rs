//! ログ基盤
//!
//! debugビルドではtracing-appenderの非同期ファイル出力（または標準出力）、
//! releaseビルドでは初期化ごとコンパイルアウトされる。

#[cfg(debug_assertions)]
use std::path::PathBuf;
#[cfg(debug_assertions)]
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// ログを初期化する（debugビルド）
///
/// `log_dir`がSomeなら日次ローテーションのファイル出力、Noneなら標準出力。
/// 環境変数`RUST_LOG`があれば`log_level`より優先される。
///
/// 戻り値の`WorkerGuard`はmain終了まで保持すること。Dropした時点で
/// ログスレッドがフラッシュされ停止する。
#[cfg(debug_assertions)]
pub fn init_logging(
    log_level: &str,
    json_format: bool,
    log_dir: Option<PathBuf>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let registry = tracing_subscriber::registry().with(filter);

    let guard = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir).expect("Failed to create log directory");
            let appender = tracing_appender::rolling::daily(dir, "tablesight.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let initialized = if json_format {
                registry
                    .with(fmt::layer().json().with_writer(writer))
                    .try_init()
                    .is_ok()
            } else {
                registry
                    .with(
                        fmt::layer()
                            .with_target(true)
                            .with_thread_ids(true)
                            .with_line_number(true)
                            .with_ansi(false)
                            .with_writer(writer),
                    )
                    .try_init()
                    .is_ok()
            };
            // 既にグローバルsubscriberがある場合はguardを返さない
            initialized.then_some(guard)
        }
        None => {
            let initialized = if json_format {
                registry.with(fmt::layer().json()).try_init().is_ok()
            } else {
                registry
                    .with(
                        fmt::layer()
                            .with_target(true)
                            .with_thread_ids(true)
                            .with_line_number(true),
                    )
                    .try_init()
                    .is_ok()
            };
            if initialized {
                tracing::info!(level = log_level, json = json_format, "Logging initialized");
            }
            return None;
        }
    };

    if guard.is_some() {
        tracing::info!(level = log_level, json = json_format, "Logging initialized");
    }
    guard
}

/// releaseビルドではno-op
#[cfg(not(debug_assertions))]
pub fn init_logging(
    _log_level: &str,
    _json_format: bool,
    _log_dir: Option<std::path::PathBuf>,
) -> Option<()> {
    None
}

/// 区間計測マクロ
///
/// debugビルドでは所要時間をdebugレベルで記録し、
/// releaseビルドでは本体の実行だけが残る。
#[macro_export]
macro_rules! measure_span {
    ($name:expr, $body:expr) => {
        #[cfg(debug_assertions)]
        {
            let _span = tracing::info_span!($name).entered();
            let _start = std::time::Instant::now();
            let result = $body;
            tracing::debug!(
                span = $name,
                elapsed_us = _start.elapsed().as_micros(),
                "Span completed"
            );
            result
        }
        #[cfg(not(debug_assertions))]
        {
            $body
        }
    };
}
