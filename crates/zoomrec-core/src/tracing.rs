//! Tracing setup for zoom-recordings.
//!
//! Installs a single global `tracing` subscriber. Library crates only emit
//! events; the binary calls [`init_tracing`] once at startup.
//!
//! ```ignore
//! use zoomrec_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::cli())?;
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt as fmt_layer, prelude::*};

/// Crate targets whose events are shown at the configured level.
const OWN_TARGETS: &[&str] = &["zoomrec_core", "zoomrec_api", "zoomrec_client", "zoom_recordings"];

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to set global subscriber
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// Failed to parse env filter directive
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Multi-line human-readable format
    Pretty,
    /// Single-line format (default for the CLI)
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

impl TracingOutputFormat {
    /// Returns the name accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for TracingOutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TracingOutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown log format '{other}' (expected pretty, compact or json)"
            )),
        }
    }
}

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level applied to this workspace's crates when RUST_LOG is not set
    pub default_level: Level,
    /// Level applied to everything else (HTTP stack, runtime)
    pub dependency_level: Level,
    /// Output format for log messages
    pub output_format: TracingOutputFormat,
    /// Whether to include file/line information in logs
    pub include_location: bool,
    /// Whether to include target (module path) in logs
    pub include_target: bool,
    /// Whether to include timestamps
    pub include_timestamp: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::cli()
    }
}

impl TracingConfig {
    /// Config for normal CLI runs: progress at INFO, dependencies at WARN.
    #[must_use]
    pub fn cli() -> Self {
        Self {
            default_level: Level::INFO,
            dependency_level: Level::WARN,
            output_format: TracingOutputFormat::Compact,
            include_location: false,
            include_target: false,
            include_timestamp: false,
        }
    }

    /// Config for `--debug` runs
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            default_level: Level::DEBUG,
            dependency_level: Level::INFO,
            output_format: TracingOutputFormat::Compact,
            include_location: true,
            include_target: true,
            include_timestamp: true,
        }
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Builds the filter directive used when RUST_LOG is not set, e.g.
    /// `warn,zoomrec_api=info,...`.
    pub fn default_directive(&self) -> String {
        let mut directive = self.dependency_level.to_string().to_lowercase();
        for target in OWN_TARGETS {
            directive.push_str(&format!(
                ",{}={}",
                target,
                self.default_level.to_string().to_lowercase()
            ));
        }
        directive
    }
}

/// Initialize tracing with the given configuration.
///
/// The `RUST_LOG` environment variable overrides the configured levels.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set or if
/// the env filter directive is invalid.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.default_directive())?,
    };

    match config.output_format {
        TracingOutputFormat::Pretty => {
            let subscriber = tracing_subscriber::registry().with(env_filter).with(
                fmt_layer::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_target(config.include_target),
            );
            tracing::subscriber::set_global_default(subscriber)?;
        }
        TracingOutputFormat::Compact => {
            let layer = fmt_layer::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_target(config.include_target);

            let layer = if config.include_timestamp {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            };

            let subscriber = tracing_subscriber::registry().with(env_filter).with(layer);
            tracing::subscriber::set_global_default(subscriber)?;
        }
        TracingOutputFormat::Json => {
            let subscriber = tracing_subscriber::registry().with(env_filter).with(
                fmt_layer::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_target(config.include_target),
            );
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_config() {
        let config = TracingConfig::cli();
        assert_eq!(config.default_level, Level::INFO);
        assert_eq!(config.dependency_level, Level::WARN);
        assert_eq!(config.output_format, TracingOutputFormat::Compact);
        assert!(!config.include_timestamp);
    }

    #[test]
    fn test_cli_debug_config() {
        let config = TracingConfig::cli_debug();
        assert_eq!(config.default_level, Level::DEBUG);
        assert!(config.include_location);
        assert!(config.include_timestamp);
    }

    #[test]
    fn test_default_directive_scopes_own_crates() {
        let directive = TracingConfig::cli().default_directive();
        assert!(directive.starts_with("warn,"));
        assert!(directive.contains("zoomrec_api=info"));
        assert!(directive.contains("zoomrec_client=info"));
        assert!(EnvFilter::try_new(&directive).is_ok());
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("json".parse(), Ok(TracingOutputFormat::Json));
        assert_eq!("Pretty".parse(), Ok(TracingOutputFormat::Pretty));
        assert!("xml".parse::<TracingOutputFormat>().is_err());
        assert_eq!(TracingOutputFormat::Compact.to_string(), "compact");
    }

    #[test]
    fn test_with_format_keeps_levels() {
        let config = TracingConfig::cli_debug().with_format(TracingOutputFormat::Json);

        assert_eq!(config.default_level, Level::DEBUG);
        assert_eq!(config.output_format, TracingOutputFormat::Json);
        assert!(config.default_directive().contains("zoomrec_api=debug"));
    }
}
