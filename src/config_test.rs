#![allow(clippy::float_cmp)]

use super::*;

const VARS: &[&str] = &[
    "ANNOTATOR_BASE_URL",
    "ANNOTATOR_DISPLAY_WIDTH",
    "ANNOTATOR_DISPLAY_HEIGHT",
    "ANNOTATOR_FIT",
    "ANNOTATOR_FIXED_WIDTH",
    "ANNOTATOR_STICKY_RECT",
    "ANNOTATOR_AUTOLOAD",
    "ANNOTATOR_REQUEST_TIMEOUT_SECS",
    "ANNOTATOR_CONNECT_TIMEOUT_SECS",
];

/// # Safety
/// Tests must run with `--test-threads=1` to avoid env races.
unsafe fn clear_annotator_env() {
    for var in VARS {
        unsafe { std::env::remove_var(var) };
    }
}

// Env-mutating tests share one body so they never race each other.
#[test]
fn from_env_defaults_and_overrides() {
    unsafe { clear_annotator_env() };
    let cfg = AnnotatorConfig::from_env().unwrap();
    assert_eq!(cfg, AnnotatorConfig::default());
    assert_eq!(cfg.base_url, "http://127.0.0.1:5000");
    assert_eq!(cfg.display, Size::new(800.0, 600.0));
    assert_eq!(cfg.fit, FitPolicy::Letterbox);
    assert!(!cfg.sticky_rect_mode);
    assert!(cfg.autoload.is_none());
    assert_eq!(cfg.timeouts, HttpTimeouts { request_secs: 30, connect_secs: 10 });

    unsafe {
        std::env::set_var("ANNOTATOR_BASE_URL", "http://annotate.test:8080/");
        std::env::set_var("ANNOTATOR_DISPLAY_WIDTH", "1024");
        std::env::set_var("ANNOTATOR_DISPLAY_HEIGHT", "768");
        std::env::set_var("ANNOTATOR_FIT", "fixed_width");
        std::env::set_var("ANNOTATOR_FIXED_WIDTH", "640");
        std::env::set_var("ANNOTATOR_STICKY_RECT", "true");
        std::env::set_var("ANNOTATOR_AUTOLOAD", "street.jpg");
        std::env::set_var("ANNOTATOR_REQUEST_TIMEOUT_SECS", "5");
        std::env::set_var("ANNOTATOR_CONNECT_TIMEOUT_SECS", "2");
    }
    let cfg = AnnotatorConfig::from_env().unwrap();
    assert_eq!(cfg.base_url, "http://annotate.test:8080");
    assert_eq!(cfg.display, Size::new(1024.0, 768.0));
    assert_eq!(cfg.fit, FitPolicy::FixedWidth { width: 640.0 });
    assert!(cfg.sticky_rect_mode);
    assert_eq!(cfg.autoload.as_deref(), Some("street.jpg"));
    assert_eq!(cfg.timeouts, HttpTimeouts { request_secs: 5, connect_secs: 2 });

    unsafe {
        clear_annotator_env();
        std::env::set_var("ANNOTATOR_DISPLAY_WIDTH", "wide");
        std::env::set_var("ANNOTATOR_REQUEST_TIMEOUT_SECS", "-3");
        std::env::set_var("ANNOTATOR_AUTOLOAD", "  ");
    }
    let cfg = AnnotatorConfig::from_env().unwrap();
    assert_eq!(cfg.display.width, DEFAULT_DISPLAY_WIDTH);
    assert_eq!(cfg.timeouts.request_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    assert!(cfg.autoload.is_none());

    unsafe {
        clear_annotator_env();
        std::env::set_var("ANNOTATOR_FIT", "stretch");
    }
    let err = AnnotatorConfig::from_env().unwrap_err();
    assert_eq!(err, ConfigError::UnknownFit("stretch".into()));

    unsafe {
        clear_annotator_env();
        std::env::set_var("ANNOTATOR_STICKY_RECT", "maybe");
    }
    let err = AnnotatorConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("ANNOTATOR_STICKY_RECT"));

    unsafe { clear_annotator_env() };
}

#[test]
fn engine_config_follows_annotator_config() {
    let cfg = AnnotatorConfig { sticky_rect_mode: true, fit: FitPolicy::FixedWidth { width: 500.0 }, ..Default::default() };
    let engine = cfg.engine();
    assert!(engine.sticky_rect_mode);
    assert_eq!(engine.fit, FitPolicy::FixedWidth { width: 500.0 });
    assert_eq!(engine.display, Size::new(800.0, 600.0));
}

#[test]
fn parse_fit_names() {
    assert_eq!(parse_fit(None, 10.0), Ok(FitPolicy::Letterbox));
    assert_eq!(parse_fit(Some("letterbox"), 10.0), Ok(FitPolicy::Letterbox));
    assert_eq!(parse_fit(Some("fixed_width"), 10.0), Ok(FitPolicy::FixedWidth { width: 10.0 }));
    assert!(parse_fit(Some("Letterbox"), 10.0).is_err());
}

#[test]
fn parse_size_accepts_w_x_h() {
    assert_eq!(parse_size("1600x1200"), Ok(Size::new(1600.0, 1200.0)));
    assert_eq!(parse_size(" 640X480 "), Ok(Size::new(640.0, 480.0)));
    assert_eq!(parse_size("12.5x3"), Ok(Size::new(12.5, 3.0)));
}

#[test]
fn parse_size_rejects_garbage() {
    for raw in ["", "1600", "x1200", "1600x", "axb", "1600*1200"] {
        assert_eq!(parse_size(raw), Err(ConfigError::InvalidSize(raw.into())), "{raw}");
    }
}

#[test]
fn normalize_base_url_trims_slashes() {
    assert_eq!(normalize_base_url("http://h:1///"), "http://h:1");
    assert_eq!(normalize_base_url(" http://h:1 "), "http://h:1");
}
