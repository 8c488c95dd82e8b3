//! Structured Logging Configuration
//!
//! Provides configurable logging with:
//! - JSON output for log aggregation (`LOG_FORMAT=json` or `format = "json"`)
//! - Human-readable output for interactive use (default)
//!
//! # Usage
//!
//! ```rust,ignore
//! use qr_common::logging::init_logging;
//!
//! fn main() {
//!     init_logging("info", "text");
//!
//!     tracing::info!(resource = "users", "Loaded page");
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `LOG_FORMAT`: overrides the configured format ("json" or "text")
//! - `RUST_LOG`: standard filter, takes precedence over the configured level
//!   Examples: `RUST_LOG=debug`, `RUST_LOG=qr_client=trace,reqwest=info`

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging.
///
/// `default_level` is used when `RUST_LOG` is unset. `format` selects JSON
/// when it equals "json" (case-insensitive); `LOG_FORMAT` wins over it.
pub fn init_logging(default_level: &str, format: &str) {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| format.to_string());
    let env_filter = build_filter(default_level);

    if log_format.eq_ignore_ascii_case("json") {
        init_json_logging(env_filter);
    } else {
        init_text_logging(env_filter);
    }
}

fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn init_json_logging(env_filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .flatten_event(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

// Log lines go to stderr so they never interleave with rendered tables.
fn init_text_logging(env_filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .init();
}
