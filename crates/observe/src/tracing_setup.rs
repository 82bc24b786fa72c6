//! Tracing subscriber and Sentry initialization.
//!
//! # Usage
//!
//! ```no_run
//! use catalog_observe::tracing_setup::{LogFormat, init_sentry, init_tracing};
//!
//! let _sentry_guard = init_sentry(None, None);
//! init_tracing("catalog_cart_service", "info", LogFormat::Text);
//! ```

use std::str::FromStr;

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" | "" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected text or json)")),
        }
    }
}

/// Initialize Sentry error tracking and return the guard that must be kept alive.
///
/// Returns `None` when no DSN is configured.
#[must_use]
pub fn init_sentry(dsn: Option<&str>, environment: Option<String>) -> Option<sentry::ClientInitGuard> {
    let dsn = dsn?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: environment.map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// The filter used when `RUST_LOG` is not set.
///
/// `log_level` applies to the service crate and this crate; HTTP plumbing
/// stays at `debug` for `tower_http`.
#[must_use]
pub fn default_filter(crate_name: &str, log_level: &str) -> String {
    format!("{crate_name}={log_level},catalog_observe={log_level},tower_http=debug")
}

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG`; otherwise uses [`default_filter`]. Must be called at
/// most once per process, after [`init_sentry`].
pub fn init_tracing(crate_name: &str, log_level: &str, format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(crate_name, log_level).into());

    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .with(sentry_tracing::layer().event_filter(sentry_event_filter))
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .with(sentry_tracing::layer().event_filter(sentry_event_filter))
            .init(),
    }
}
