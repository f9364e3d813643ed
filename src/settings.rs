//! Settings infrastructure for docfold.
//!
//! Supports loading and parsing settings.toml files to configure the hiding
//! style, the partial-mode visible character count, and the trailing marker.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::hide::HideStyle;

/// Default visible character count for the partial style.
const DEFAULT_PARTIAL_VISIBLE_CHARS: usize = 10;

/// Root settings structure loaded from settings.toml.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Hiding configuration.
    pub hide: Option<HideSettings>,
}

/// Hiding settings under the `[hide]` table.
#[derive(Debug, Default, Deserialize)]
pub struct HideSettings {
    /// One of "complete", "partial", "first-line".
    pub style: Option<String>,

    /// Visible character count for the partial style (default 10).
    pub partial_visible_chars: Option<usize>,

    /// Trailing decorative marker appended after hidden text.
    /// Absent or empty disables the marker.
    pub marker: Option<String>,
}

/// Resolved hiding configuration used by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HideConfig {
    pub style: HideStyle,
    pub marker: Option<String>,
}

impl Default for HideConfig {
    fn default() -> Self {
        Self {
            style: HideStyle::Complete,
            marker: None,
        }
    }
}

impl Settings {
    /// Resolve the raw settings into an engine configuration.
    ///
    /// Unknown style names warn and fall back to the default.
    pub fn hide_config(&self) -> HideConfig {
        let Some(ref hide) = self.hide else {
            return HideConfig::default();
        };

        let partial_chars = hide
            .partial_visible_chars
            .unwrap_or(DEFAULT_PARTIAL_VISIBLE_CHARS);

        let style = match hide.style.as_deref() {
            None | Some("complete") => HideStyle::Complete,
            Some("partial") => HideStyle::Partial(partial_chars),
            Some("first-line") => HideStyle::FirstLine,
            Some(other) => {
                eprintln!("Warning: unknown hide style '{}', using complete", other);
                HideStyle::Complete
            }
        };

        let marker = hide.marker.clone().filter(|m| !m.is_empty());

        HideConfig { style, marker }
    }
}

/// Load settings from a settings.toml file.
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Warning: failed to parse settings.toml: {}", e);
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

/// Discover settings.toml by searching up the directory tree, then direct children.
///
/// Search order:
/// 1. Walk up from `start_dir` to filesystem root
/// 2. If not found, check immediate child directories of `start_dir`
///
/// Returns `(settings, settings_dir)` where `settings_dir` is the directory
/// containing the found settings.toml. If not found, returns
/// `(Settings::default(), start_dir)`.
pub fn discover_settings(start_dir: &Path) -> (Settings, PathBuf) {
    // Phase 1: Walk up from start_dir
    let mut current = Some(start_dir);
    while let Some(dir) = current {
        let candidate = dir.join("settings.toml");
        if candidate.is_file() {
            return (load_settings(&candidate), dir.to_path_buf());
        }
        current = dir.parent();
    }

    // Phase 2: Check immediate child directories
    if let Ok(entries) = std::fs::read_dir(start_dir) {
        for entry in entries.flatten() {
            if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
                let candidate = entry.path().join("settings.toml");
                if candidate.is_file() {
                    return (load_settings(&candidate), entry.path());
                }
            }
        }
    }

    (Settings::default(), start_dir.to_path_buf())
}
