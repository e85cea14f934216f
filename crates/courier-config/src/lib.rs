//! Layered configuration for the Courier gateway.
//!
//! Configuration is resolved through `ortho_config`: defaults, then an
//! optional configuration file, then `COURIER_`-prefixed environment
//! variables. Every field is optional at the loading layer; the resolved
//! accessors on [`Config`] apply the documented defaults so consumers never
//! reimplement fallback logic.
//!
//! The surface mirrors what the gateway consumes from its environment: the
//! target allow-list identifier, the ordered interceptor list, the invoker
//! selection, the wire encoding and response content-type labels, the chain
//! cache toggle, and the telemetry settings.

pub mod defaults;

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use defaults::{
    DEFAULT_CONTENT_TYPE, DEFAULT_ENCODING_LABEL, DEFAULT_LOG_FILTER, default_chain_cache,
    default_content_type, default_encoding_label, default_log_filter, default_log_format,
};

/// Output formats for the gateway's dispatch telemetry.
///
/// Selected through the `log_format` field and applied when the telemetry
/// subscriber is installed; every dispatch, cache, and chain event is
/// rendered in the chosen shape.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One flattened JSON object per event, for ingestion by log pipelines.
    #[default]
    Json,
    /// Single-line human-readable output for interactive gateway runs.
    Compact,
}

/// Error raised when a [`LogFormat`] label does not parse.
pub type LogFormatParseError = strum::ParseError;

/// Terminal invoker strategies the gateway can be configured with.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum InvokerKind {
    /// Typed method-registry dispatch (the default).
    #[default]
    Registry,
}

/// Gateway configuration resolved from defaults, file, and environment.
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "COURIER")]
pub struct Config {
    /// Sole target identifier invocations are permitted against, when set.
    pub allowed_target: Option<String>,
    /// Ordered interceptor names resolved against the interceptor registry.
    #[serde(default)]
    pub interceptors: Vec<String>,
    /// Terminal invoker selection.
    pub invoker: Option<InvokerKind>,
    /// Wire text encoding label (`utf-8` by default).
    pub encoding: Option<String>,
    /// Content-type label attached to encoded responses.
    pub content_type: Option<String>,
    /// Whether interceptor chains are cached per call identity.
    pub chain_cache: Option<bool>,
    /// Log filter expression consumed by telemetry initialisation.
    pub log_filter: Option<String>,
    /// Log output format consumed by telemetry initialisation.
    pub log_format: Option<LogFormat>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allowed_target: None,
            interceptors: Vec::new(),
            invoker: None,
            encoding: None,
            content_type: None,
            chain_cache: None,
            log_filter: None,
            log_format: None,
        }
    }
}

impl Config {
    /// Loads the configuration from defaults, file, and environment.
    ///
    /// # Errors
    ///
    /// Returns the aggregated `ortho_config` error when any layer fails to
    /// parse or merge.
    pub fn load() -> Result<Self, Arc<OrthoError>> {
        <Self as OrthoConfig>::load().map_err(Into::into)
    }

    /// Resolved invoker selection.
    #[must_use]
    pub fn invoker(&self) -> InvokerKind {
        self.invoker.unwrap_or_default()
    }

    /// Resolved wire encoding label.
    #[must_use]
    pub fn encoding_label(&self) -> &str {
        self.encoding
            .as_deref()
            .unwrap_or(defaults::DEFAULT_ENCODING_LABEL)
    }

    /// Resolved response content-type label.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or(defaults::DEFAULT_CONTENT_TYPE)
    }

    /// Whether chain caching is enabled.
    #[must_use]
    pub fn chain_cache_enabled(&self) -> bool {
        self.chain_cache.unwrap_or_else(default_chain_cache)
    }

    /// Resolved log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter
            .as_deref()
            .unwrap_or(defaults::DEFAULT_LOG_FILTER)
    }

    /// Resolved log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[test]
    fn default_config_resolves_documented_defaults() {
        let config = Config::default();
        assert_eq!(config.invoker(), InvokerKind::Registry);
        assert_eq!(config.encoding_label(), "utf-8");
        assert_eq!(config.content_type(), "application/json");
        assert!(config.chain_cache_enabled());
        assert_eq!(config.log_filter(), "info");
        assert_eq!(config.log_format(), LogFormat::Json);
        assert!(config.allowed_target.is_none());
        assert!(config.interceptors.is_empty());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = Config {
            allowed_target: Some("svcA".into()),
            interceptors: vec!["trace".into()],
            encoding: Some("iso-8859-1".into()),
            content_type: Some("application/x-invocation".into()),
            chain_cache: Some(false),
            ..Config::default()
        };
        assert_eq!(config.allowed_target.as_deref(), Some("svcA"));
        assert_eq!(config.encoding_label(), "iso-8859-1");
        assert_eq!(config.content_type(), "application/x-invocation");
        assert!(!config.chain_cache_enabled());
    }

    #[rstest]
    #[case("registry", InvokerKind::Registry)]
    #[case("REGISTRY", InvokerKind::Registry)]
    fn parses_invoker_kind(#[case] label: &str, #[case] expected: InvokerKind) {
        assert_eq!(InvokerKind::from_str(label).expect("parse"), expected);
    }

    #[rstest]
    #[case("json", LogFormat::Json)]
    #[case("compact", LogFormat::Compact)]
    fn parses_log_format(#[case] label: &str, #[case] expected: LogFormat) {
        assert_eq!(LogFormat::from_str(label).expect("parse"), expected);
    }
}
