//! Annotator settings, loaded from TOML.
//!
//! ```toml
//! show_all = false
//! secondary_style = "text-warning"
//! preview_context = 30
//! stale_after_secs = 120
//! ```
//!
//! Missing keys take their defaults.

use std::path::Path;

use cdcr_core::{
    DocumentSide, RenderOptions, SecondaryEntitySelection, Task, DEFAULT_PREVIEW_CONTEXT,
    DEFAULT_SECONDARY_STYLE,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::session::RefreshPolicy;

/// Default age after which a loaded task is re-fetched.
pub const DEFAULT_STALE_AFTER_SECS: u64 = 300;

/// Display and refresh settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Render mentions that are neither primary nor secondary.
    pub show_all: bool,
    /// Style tag for secondary mentions.
    pub secondary_style: String,
    /// Characters of context in the mention editor preview.
    pub preview_context: usize,
    /// Seconds after which a loaded task counts as stale.
    pub stale_after_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_all: true,
            secondary_style: DEFAULT_SECONDARY_STYLE.to_string(),
            preview_context: DEFAULT_PREVIEW_CONTEXT,
            stale_after_secs: DEFAULT_STALE_AFTER_SECS,
        }
    }
}

impl Settings {
    /// Read settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SessionError::config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&raw)
            .map_err(|e| SessionError::config(format!("{}: {e}", path.display())))
    }

    /// Parse settings from TOML text.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| SessionError::config(e.to_string()))
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| SessionError::config(e.to_string()))
    }

    /// Render options for one side of `task`.
    #[must_use]
    pub fn render_options<'a>(
        &self,
        task: &'a Task,
        selection: &'a SecondaryEntitySelection,
        side: DocumentSide,
    ) -> RenderOptions<'a> {
        RenderOptions::for_side(task, selection, side)
            .show_all(self.show_all)
            .secondary_style(self.secondary_style.clone())
    }

    /// Refresh policy with this staleness threshold.
    #[must_use]
    pub fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy::new(self.stale_after_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert!(settings.show_all);
        assert_eq!(settings.secondary_style, "text-success");
        assert_eq!(settings.preview_context, 20);
        assert_eq!(settings.stale_after_secs, 300);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let settings = Settings::from_toml("show_all = false\n").unwrap();
        assert!(!settings.show_all);
        assert_eq!(settings.preview_context, 20);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "secondary_style = \"text-warning\"").unwrap();
        writeln!(file, "stale_after_secs = 60").unwrap();
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.secondary_style, "text-warning");
        assert_eq!(settings.refresh_policy().stale_after_secs(), 60);
    }

    #[test]
    fn bad_toml_is_config_error() {
        assert!(matches!(
            Settings::from_toml("show_all = \"maybe\""),
            Err(SessionError::Config(_))
        ));
        assert!(matches!(
            Settings::load("/nonexistent/cdcr.toml"),
            Err(SessionError::Config(_))
        ));
    }

    #[test]
    fn toml_round_trip() {
        let settings = Settings {
            show_all: false,
            ..Settings::default()
        };
        let raw = settings.to_toml().unwrap();
        assert_eq!(Settings::from_toml(&raw).unwrap(), settings);
    }
}
