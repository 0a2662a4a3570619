//! Structured logging setup
//!
//! The crates of this workspace emit `tracing` events (plans at `trace`,
//! kernel calls and executed ops at `debug`). This module installs a
//! `tracing-subscriber` that prints them.
//!
//! # Example
//!
//! ```no_run
//! use scatterax_exec::tracing_support::{init_tracing, TracingConfig, TracingFormat};
//!
//! init_tracing(TracingConfig {
//!     format: TracingFormat::Compact,
//!     filter: "scatterax_kernels=debug,info".to_string(),
//!     ..TracingConfig::default()
//! })
//! .unwrap();
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directive (e.g., `RUST_LOG=scatterax_exec=debug`)
//! - `SCATTERAX_LOG_FORMAT`: `pretty`, `compact` or `json` (default: `pretty`)

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Tracing output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Pretty-printed human-readable format
    Pretty,
    /// JSON format for structured logging
    Json,
    /// Compact format (single line per event)
    Compact,
}

impl TracingFormat {
    /// Parse from string; unknown names give `Pretty`
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => TracingFormat::Json,
            "compact" => TracingFormat::Compact,
            _ => TracingFormat::Pretty,
        }
    }
}

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Output format
    pub format: TracingFormat,
    /// Filter directive (e.g., "scatterax_exec=debug,info")
    pub filter: String,
    /// Enable ANSI colors
    pub with_ansi: bool,
    /// Show target module paths
    pub with_target: bool,
    /// Show thread IDs
    pub with_thread_ids: bool,
    /// Show file locations and line numbers
    pub with_file: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        let format = std::env::var("SCATTERAX_LOG_FORMAT")
            .map(|s| TracingFormat::parse(&s))
            .unwrap_or(TracingFormat::Pretty);
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());

        Self {
            format,
            filter,
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
            with_file: false,
        }
    }
}

/// Install a global subscriber built from `config`
///
/// Fails on an invalid filter or when a global subscriber is already set.
pub fn init_tracing(config: TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)?;

    let layer = match config.format {
        TracingFormat::Pretty => fmt::layer()
            .pretty()
            .with_ansi(config.with_ansi)
            .with_target(config.with_target)
            .with_thread_ids(config.with_thread_ids)
            .with_file(config.with_file)
            .with_line_number(config.with_file)
            .with_filter(filter)
            .boxed(),
        TracingFormat::Json => fmt::layer()
            .json()
            .with_target(config.with_target)
            .with_thread_ids(config.with_thread_ids)
            .with_file(config.with_file)
            .with_line_number(config.with_file)
            .with_filter(filter)
            .boxed(),
        TracingFormat::Compact => fmt::layer()
            .compact()
            .with_ansi(config.with_ansi)
            .with_target(config.with_target)
            .with_thread_ids(config.with_thread_ids)
            .with_file(config.with_file)
            .with_line_number(config.with_file)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_format_parse() {
        assert_eq!(TracingFormat::parse("json"), TracingFormat::Json);
        assert_eq!(TracingFormat::parse("COMPACT"), TracingFormat::Compact);
        assert_eq!(TracingFormat::parse("unknown"), TracingFormat::Pretty);
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let config = TracingConfig {
            filter: "scatterax=notalevel".to_string(),
            ..TracingConfig::default()
        };
        assert!(init_tracing(config).is_err());
    }

    #[test]
    fn test_second_init_fails() {
        let config = TracingConfig {
            filter: "off".to_string(),
            format: TracingFormat::Compact,
            ..TracingConfig::default()
        };
        let _ = init_tracing(config.clone());
        assert!(init_tracing(config).is_err());
    }
}
