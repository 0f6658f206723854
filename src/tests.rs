use super::*;

use tracing::level_filters::LevelFilter;

#[test]
fn test_verbosity_sets_level_without_rust_log() {
    assert_eq!(log_filter(0, "").max_level_hint(), Some(LevelFilter::INFO));
    assert_eq!(log_filter(1, "").max_level_hint(), Some(LevelFilter::DEBUG));
    assert_eq!(log_filter(3, "").max_level_hint(), Some(LevelFilter::TRACE));
}

#[test]
fn test_rust_log_overrides_verbosity() {
    assert_eq!(log_filter(0, "warn").max_level_hint(), Some(LevelFilter::WARN));
    assert_eq!(log_filter(2, "error").max_level_hint(), Some(LevelFilter::ERROR));
}

#[test]
fn test_unparsable_rust_log_falls_back_to_verbosity() {
    assert_eq!(log_filter(1, "vgate=loud").max_level_hint(), Some(LevelFilter::DEBUG));
}
