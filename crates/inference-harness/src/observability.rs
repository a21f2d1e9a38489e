use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

const ENABLED_ENV: &str = "HARNESS_OBSERVABILITY_ENABLED";
const LEVEL_ENV: &str = "HARNESS_LOG_LEVEL";
const JSON_PATH_ENV: &str = "HARNESS_JSON_LOG_PATH";
const DEFAULT_JSON_FILE: &str = "harness.logs.jsonl";

static INIT: OnceCell<()> = OnceCell::new();

/// Where log records are written.
#[derive(Clone, Debug, PartialEq, Eq)]
enum LogSink {
    /// Compact human-readable lines on stderr.
    Stderr,
    /// One JSON object per line, appended to the file.
    JsonFile(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LogSettings {
    enabled: bool,
    filter: Option<String>,
    sink: LogSink,
}

impl LogSettings {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = lookup(ENABLED_ENV)
            .and_then(|v| parse_bool_env(&v))
            .unwrap_or(true);
        let filter = lookup(LEVEL_ENV).filter(|v| !v.trim().is_empty());
        let sink = match lookup(JSON_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            Some(path) => LogSink::JsonFile(PathBuf::from(path)),
            None => LogSink::Stderr,
        };
        Self {
            enabled,
            filter,
            sink,
        }
    }

    fn env_filter(&self, default_level: &str) -> EnvFilter {
        self.filter
            .as_deref()
            .and_then(|f| EnvFilter::try_new(f).ok())
            .or_else(|| EnvFilter::try_from_default_env().ok())
            .unwrap_or_else(|| EnvFilter::new(default_level))
    }
}

fn parse_bool_env(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

fn split_log_path(path: &Path) -> (&Path, &str) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_JSON_FILE);
    (dir, file)
}

/// Installs the global tracing subscriber once per process.
///
/// Console output goes to stderr; stdout carries model output only.
///
/// - `HARNESS_OBSERVABILITY_ENABLED`: set to `false`/`off` to skip installation.
/// - `HARNESS_LOG_LEVEL`: filter directive, wins over `RUST_LOG`.
/// - `HARNESS_JSON_LOG_PATH`: write JSONL to this file instead of stderr.
///
/// `default_level` applies when neither filter variable is set.
pub fn init_observability(default_level: &str) {
    INIT.get_or_init(|| {
        let settings = LogSettings::from_lookup(|key| std::env::var(key).ok());
        if !settings.enabled {
            return;
        }
        let filter = settings.env_filter(default_level);

        match &settings.sink {
            LogSink::JsonFile(path) => {
                let (dir, file) = split_log_path(path);
                let _ = std::fs::create_dir_all(dir);
                let layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(false)
                    .with_writer(tracing_appender::rolling::never(dir, file));
                let _ = tracing_subscriber::registry()
                    .with(filter)
                    .with(layer)
                    .try_init();
            }
            LogSink::Stderr => {
                let layer = tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr);
                let _ = tracing_subscriber::registry()
                    .with(filter)
                    .with(layer)
                    .try_init();
            }
        }
    });
}
