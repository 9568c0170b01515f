//! Shared configuration for the msgbridge worker.
//!
//! The worker is launched by a parent process with three positional values:
//! the numeric application identifier, the application secret and the path
//! where the external client persists its session. Logging knobs are optional
//! and fall back to environment variables before the built-in defaults, so a
//! parent can tune diagnostics without changing the invocation contract.

mod defaults;
mod logging;

use std::ffi::OsString;
use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;

pub use defaults::{
    DEFAULT_LOG_FILTER, LOG_FILTER_ENV, LOG_FORMAT_ENV, default_log_filter_string,
    default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved worker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "msgbridged",
    version,
    about = "Line-delimited JSON bridge to a remote messaging client"
)]
pub struct Config {
    /// Numeric application identifier issued by the remote service.
    #[arg(value_name = "API_ID")]
    pub api_id: i32,
    /// Application secret paired with the identifier.
    #[arg(value_name = "API_HASH")]
    pub api_hash: String,
    /// File the external client uses to persist its session.
    #[arg(value_name = "SESSION_PATH")]
    pub session_path: Utf8PathBuf,
    /// Tracing filter expression (for example `info,msgbridged=debug`).
    #[arg(long, env = LOG_FILTER_ENV, default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,
    /// Diagnostic output format written to stderr.
    #[arg(long, env = LOG_FORMAT_ENV, default_value_t = default_log_format())]
    pub log_format: LogFormat,
}

impl Config {
    /// Builds a configuration with default logging settings.
    pub fn new(
        api_id: i32,
        api_hash: impl Into<String>,
        session_path: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            api_id,
            api_hash: api_hash.into(),
            session_path: session_path.into(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }

    /// Parses the configuration from the process arguments.
    ///
    /// # Errors
    ///
    /// Returns the `clap` error describing missing or malformed arguments.
    /// Callers typically hand it to [`clap::Error::exit`], which prints the
    /// usage message to stderr and exits with a non-zero status.
    pub fn load() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    /// Parses the configuration from an explicit argument iterator.
    ///
    /// The first item is treated as the binary name.
    ///
    /// # Errors
    ///
    /// Returns the `clap` error describing missing or malformed arguments.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Diagnostic output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Session file path handed to the external client.
    #[must_use]
    pub fn session_path(&self) -> &Utf8Path {
        self.session_path.as_path()
    }

    /// Credentials needed to construct the external client.
    #[must_use]
    pub fn credentials(&self) -> ApiCredentials {
        ApiCredentials {
            api_id: self.api_id,
            api_hash: self.api_hash.clone(),
            session_path: self.session_path.clone(),
        }
    }
}

/// Credentials and session location for the external client.
///
/// The `Debug` output redacts the secret so the value can be logged.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    /// Numeric application identifier.
    pub api_id: i32,
    /// Application secret.
    pub api_hash: String,
    /// Session persistence path.
    pub session_path: Utf8PathBuf,
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ApiCredentials")
            .field("api_id", &self.api_id)
            .field("api_hash", &"<redacted>")
            .field("session_path", &self.session_path)
            .finish()
    }
}
