//! Configuration for dump readers

use crate::{ReaderError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use wikidump_formats::lines::DEFAULT_BUFFER_SIZE;
use wikidump_formats::markup::DEFAULT_PAGES_PER_BLOCK;
use wikidump_formats::{DumpMarkers, RedirectRule};

/// Configuration shared by all dump readers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Upper bound of pages read from one compressed block
    pub max_pages_per_block: usize,

    /// Capacity of read buffers (in bytes)
    pub read_buffer_size: usize,

    /// Line markers of the page markup
    pub markers: DumpMarkers,

    /// Redirect stub heuristic
    pub redirect: RedirectRule,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_pages_per_block: DEFAULT_PAGES_PER_BLOCK,
            read_buffer_size: DEFAULT_BUFFER_SIZE,
            markers: DumpMarkers::default(),
            redirect: RedirectRule::default(),
        }
    }
}

impl ReaderConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-block page limit
    #[must_use]
    pub const fn with_max_pages_per_block(mut self, max_pages: usize) -> Self {
        self.max_pages_per_block = max_pages;
        self
    }

    /// Set the read buffer capacity
    #[must_use]
    pub const fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Replace the markup markers
    #[must_use]
    pub fn with_markers(mut self, markers: DumpMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Replace the redirect heuristic
    #[must_use]
    pub fn with_redirect_rule(mut self, rule: RedirectRule) -> Self {
        self.redirect = rule;
        self
    }

    /// Reject values no reader can work with
    pub fn validate(&self) -> Result<()> {
        if self.max_pages_per_block == 0 {
            return Err(ReaderError::Config(
                "max_pages_per_block must be at least 1".to_string(),
            ));
        }
        if self.read_buffer_size == 0 {
            return Err(ReaderError::Config(
                "read_buffer_size must be at least 1".to_string(),
            ));
        }
        if self.markers.page_open.is_empty() || self.markers.text_close.is_empty() {
            return Err(ReaderError::Config(
                "page_open and text_close markers must not be empty".to_string(),
            ));
        }
        if self.redirect.marker.is_empty() {
            return Err(ReaderError::Config(
                "redirect marker must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use wikidump_formats::Page;

    #[test]
    fn test_defaults() {
        let config = ReaderConfig::default();
        assert_eq!(config.max_pages_per_block, 100);
        assert_eq!(config.read_buffer_size, 1024 * 1024);
        assert_eq!(config.markers.page_open, "<page>");
        assert_eq!(config.redirect.marker, "#redirect");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ReaderConfig::new()
            .with_max_pages_per_block(5)
            .with_read_buffer_size(4096)
            .with_redirect_rule(RedirectRule::new(64, "#weiterleitung"));
        assert_eq!(config.max_pages_per_block, 5);
        assert_eq!(config.read_buffer_size, 4096);
        assert_eq!(config.redirect.max_len, 64);
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let config = ReaderConfig::new().with_max_pages_per_block(0);
        assert!(matches!(config.validate(), Err(ReaderError::Config(_))));

        let config = ReaderConfig::new().with_read_buffer_size(0);
        assert!(matches!(config.validate(), Err(ReaderError::Config(_))));
    }

    #[test]
    fn test_partial_json() {
        let config = ReaderConfig::from_json_str(
            r##"{"max_pages_per_block": 50, "redirect": {"marker": "#weiterleitung"}}"##,
        )
        .expect("Test operation should succeed");
        assert_eq!(config.max_pages_per_block, 50);
        assert_eq!(config.redirect.marker, "#weiterleitung");
        assert_eq!(config.redirect.max_len, 256);
        assert_eq!(config.markers, DumpMarkers::default());
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().expect("Test operation should succeed");
        let path = dir.path().join("reader.json");
        let config = ReaderConfig::new().with_max_pages_per_block(7);
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = ReaderConfig::from_json_file(&path).expect("Test operation should succeed");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            ReaderConfig::from_json_str("{not json"),
            Err(ReaderError::Json(_))
        ));
        assert!(matches!(
            ReaderConfig::from_json_str(r#"{"max_pages_per_block": 0}"#),
            Err(ReaderError::Config(_))
        ));
    }

    #[test]
    fn test_uppercase_marker_from_json() {
        let config = ReaderConfig::from_json_str(r##"{"redirect": {"marker": "#REDIRECT"}}"##)
            .expect("Test operation should succeed");
        let stub = Page::new(1, "Kitty", "#REDIRECT [[Cat]]");

        assert!(config.redirect.is_redirect(&stub));
        assert_eq!(
            config.redirect.target(&stub).expect("Test operation should succeed"),
            "Cat"
        );
    }

    #[test]
    fn test_validate_rejects_empty_redirect_marker() {
        assert!(matches!(
            ReaderConfig::from_json_str(r#"{"redirect": {"marker": ""}}"#),
            Err(ReaderError::Config(_))
        ));
    }
}
