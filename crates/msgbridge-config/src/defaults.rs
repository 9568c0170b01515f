use crate::logging::LogFormat;

/// Default log filter expression used by the worker.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Environment variable overriding the log filter.
pub const LOG_FILTER_ENV: &str = "MSGBRIDGE_LOG_FILTER";

/// Environment variable overriding the log format.
pub const LOG_FORMAT_ENV: &str = "MSGBRIDGE_LOG_FORMAT";

/// Owned copy of [`DEFAULT_LOG_FILTER`].
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the worker.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}
