use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Fallback level variable used when `RUST_LOG` is not set.
pub const LOG_LEVEL: &str = "LOG_LEVEL";

/// Installs the global subscriber. Logs go to stderr so stdout only ever
/// carries the response envelope.
///
/// The returned guard flushes pending Sentry events on drop and must be
/// held until the process exits.
pub fn init(config: &LoggingConfig) -> Option<sentry::ClientInitGuard> {
    let guard = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let registry = tracing_subscriber::registry()
        .with(env_filter(std::env::var(LOG_LEVEL).ok()))
        .with(guard.as_ref().map(|_| sentry::integrations::tracing::layer()));

    match config.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    guard
}

fn env_filter(log_level: Option<String>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| {
            log_level
                .as_deref()
                .and_then(level_directive)
                .and_then(|level| EnvFilter::try_new(level).ok())
        })
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Maps `LOG_LEVEL` values, including the `WARNING`/`CRITICAL` spellings
/// common in function runtimes, to a filter directive.
fn level_directive(value: &str) -> Option<&'static str> {
    match value.trim().to_ascii_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" | "critical" | "fatal" => Some("error"),
        "off" => Some("off"),
        _ => None,
    }
}
