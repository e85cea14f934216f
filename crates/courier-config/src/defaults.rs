//! Default values shared by the gateway and its host.

use crate::LogFormat;

/// Default log filter expression used by the gateway.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default content-type label attached to encoded responses.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Default wire text encoding label.
pub const DEFAULT_ENCODING_LABEL: &str = "utf-8";

/// Default log filter expression used by the gateway.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the gateway.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default content-type label attached to encoded responses.
#[must_use]
pub fn default_content_type() -> &'static str {
    DEFAULT_CONTENT_TYPE
}

/// Default wire text encoding label.
#[must_use]
pub fn default_encoding_label() -> &'static str {
    DEFAULT_ENCODING_LABEL
}

/// Chain caching is enabled unless configuration disables it.
#[must_use]
pub fn default_chain_cache() -> bool {
    true
}
