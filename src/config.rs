//! Annotator configuration parsed from environment variables.
//!
//! The CLI layers its flags on top of this (see `main.rs`); library users
//! can build an [`AnnotatorConfig`] by hand or start from [`AnnotatorConfig::default`].

use canvas::engine::EngineConfig;
use canvas::viewport::{FitPolicy, Size};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_DISPLAY_WIDTH: f64 = 800.0;
pub const DEFAULT_DISPLAY_HEIGHT: f64 = 600.0;
pub const DEFAULT_FIXED_WIDTH: f64 = 800.0;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors produced while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown ANNOTATOR_FIT: {0} (expected 'letterbox' or 'fixed_width')")]
    UnknownFit(String),

    #[error("invalid boolean for {var}: {value}")]
    InvalidBool { var: &'static str, value: String },

    #[error("invalid size '{0}' (expected WIDTHxHEIGHT)")]
    InvalidSize(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatorConfig {
    /// Server root, without a trailing slash.
    pub base_url: String,
    pub display: Size,
    pub fit: FitPolicy,
    pub sticky_rect_mode: bool,
    /// Image to open at startup when none is named explicitly.
    pub autoload: Option<String>,
    pub timeouts: HttpTimeouts,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            display: Size::new(DEFAULT_DISPLAY_WIDTH, DEFAULT_DISPLAY_HEIGHT),
            fit: FitPolicy::Letterbox,
            sticky_rect_mode: false,
            autoload: None,
            timeouts: HttpTimeouts::default(),
        }
    }
}

impl AnnotatorConfig {
    /// Build typed config from environment variables.
    ///
    /// - `ANNOTATOR_BASE_URL`: default `http://127.0.0.1:5000`
    /// - `ANNOTATOR_DISPLAY_WIDTH` / `ANNOTATOR_DISPLAY_HEIGHT`: default 800 x 600
    /// - `ANNOTATOR_FIT`: `letterbox` (default) or `fixed_width`
    /// - `ANNOTATOR_FIXED_WIDTH`: default 800, used by `fixed_width`
    /// - `ANNOTATOR_STICKY_RECT`: `true`/`false`, default false
    /// - `ANNOTATOR_AUTOLOAD`: optional filename
    /// - `ANNOTATOR_REQUEST_TIMEOUT_SECS`: default 30
    /// - `ANNOTATOR_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// Numbers that fail to parse fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unknown fit policy or a malformed boolean.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(&std::env::var("ANNOTATOR_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into()));
        let display = Size::new(
            env_parse_f64("ANNOTATOR_DISPLAY_WIDTH", DEFAULT_DISPLAY_WIDTH),
            env_parse_f64("ANNOTATOR_DISPLAY_HEIGHT", DEFAULT_DISPLAY_HEIGHT),
        );
        let fixed_width = env_parse_f64("ANNOTATOR_FIXED_WIDTH", DEFAULT_FIXED_WIDTH);
        let fit = parse_fit(std::env::var("ANNOTATOR_FIT").ok().as_deref(), fixed_width)?;
        let sticky_rect_mode = parse_bool("ANNOTATOR_STICKY_RECT", std::env::var("ANNOTATOR_STICKY_RECT").ok().as_deref())?;
        let autoload = std::env::var("ANNOTATOR_AUTOLOAD").ok().filter(|f| !f.trim().is_empty());
        let timeouts = HttpTimeouts {
            request_secs: env_parse_u64("ANNOTATOR_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("ANNOTATOR_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { base_url, display, fit, sticky_rect_mode, autoload, timeouts })
    }

    /// Engine knobs derived from this config.
    #[must_use]
    pub fn engine(&self) -> EngineConfig {
        EngineConfig { fit: self.fit, display: self.display, sticky_rect_mode: self.sticky_rect_mode }
    }
}

#[must_use]
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Parse a fit policy name. `fixed_width` uses `fixed_width` as its target width.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownFit`] for anything but `letterbox` or `fixed_width`.
pub fn parse_fit(raw: Option<&str>, fixed_width: f64) -> Result<FitPolicy, ConfigError> {
    match raw.map(str::trim).unwrap_or("letterbox") {
        "letterbox" => Ok(FitPolicy::Letterbox),
        "fixed_width" => Ok(FitPolicy::FixedWidth { width: fixed_width }),
        other => Err(ConfigError::UnknownFit(other.to_string())),
    }
}

/// Parse `WIDTHxHEIGHT` (e.g. `1600x1200`).
///
/// # Errors
///
/// Returns [`ConfigError::InvalidSize`] if either side is missing or not a number.
pub fn parse_size(raw: &str) -> Result<Size, ConfigError> {
    let invalid = || ConfigError::InvalidSize(raw.to_string());
    let (w, h) = raw.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let width = w.trim().parse::<f64>().map_err(|_| invalid())?;
    let height = h.trim().parse::<f64>().map_err(|_| invalid())?;
    Ok(Size::new(width, height))
}

fn parse_bool(var: &'static str, raw: Option<&str>) -> Result<bool, ConfigError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::InvalidBool { var, value: other.to_string() }),
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_parse_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
