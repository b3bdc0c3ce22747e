//! Tracing setup for the CLI
//!
//! Logs go to stderr so that dashboard and export output on stdout stays
//! machine-readable.

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    FilterCompilation(String),

    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Default filter directive when `RUST_LOG` is not set
#[must_use]
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "sitetrack_core=debug,sitetrack_cli=debug,info"
    } else {
        "info"
    }
}

/// Build the level filter, preferring `RUST_LOG`
///
/// # Errors
/// Returns an error if the fallback directive does not parse
pub fn build_filter(verbose: bool) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_directive(verbose))
            .map_err(|e| LoggingError::FilterCompilation(e.to_string())),
    }
}

/// Install the global subscriber
///
/// # Errors
/// Returns an error if a subscriber is already installed
pub fn init_tracing(verbose: bool, json: bool) -> Result<(), LoggingError> {
    let registry = tracing_subscriber::registry().with(build_filter(verbose)?);

    let result = if json {
        let json_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_writer(std::io::stderr);
        registry.with(json_layer).try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_target(verbose)
            .with_writer(std::io::stderr);
        registry.with(fmt_layer).try_init()
    };

    result.map_err(|e| LoggingError::Init(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "info");
        assert!(default_directive(true).contains("sitetrack_core=debug"));
    }

    #[test]
    #[serial]
    fn test_build_filter_parses_defaults() {
        std::env::remove_var("RUST_LOG");
        assert!(build_filter(true).is_ok());
        assert!(build_filter(false).is_ok());
    }

    #[test]
    #[serial]
    fn test_second_init_fails() {
        let _ = init_tracing(false, false);
        assert!(matches!(
            init_tracing(false, true),
            Err(LoggingError::Init(_))
        ));
    }
}
