use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Startup configuration for the device, the frame pipeline and the viewer.
///
/// Every field has a default, so a partial file (or no file at all) is valid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub title: String,

    /// Windowed client size in physical pixels.
    pub screen_width: u32,
    pub screen_height: u32,

    pub fullscreen: bool,
    /// Takes precedence over `fullscreen` when both are set.
    pub borderless: bool,
    /// Zero-based monitor index. Out-of-range values fall back to monitor 0.
    pub monitor: usize,

    /// Synchronise presentation with the display refresh.
    pub vsync: bool,
    /// Cursor visibility outside exclusive fullscreen.
    pub show_cursor: bool,
    /// Start with the post-effect pass enabled.
    pub post_fx: bool,
    /// Build mip chains for large model textures.
    pub generate_mips: bool,

    /// Directory that relative model paths are resolved against.
    pub resources_dir: PathBuf,
    /// Scene file loaded by the viewer, relative to `resources_dir`.
    pub model: Option<PathBuf>,

    /// `env_logger` filter string. `RUST_LOG` is used when absent.
    pub log_filter: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "kiln".to_string(),
            screen_width: 1280,
            screen_height: 720,
            fullscreen: false,
            borderless: false,
            monitor: 0,
            vsync: true,
            show_cursor: true,
            post_fx: true,
            generate_mips: true,
            resources_dir: PathBuf::from("resources"),
            model: None,
            log_filter: None,
        }
    }
}

impl Settings {
    /// Parses settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse settings")
    }

    /// Loads settings from `path`.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid settings in {}", path.display()))
    }

    /// Resolves the configured model path against `resources_dir`.
    pub fn model_path(&self) -> Option<PathBuf> {
        self.model.as_ref().map(|m| {
            if m.is_absolute() {
                m.clone()
            } else {
                self.resources_dir.join(m)
            }
        })
    }

    /// Returns the configured windowed size, clamped to at least one pixel.
    pub fn screen_size(&self) -> (u32, u32) {
        (self.screen_width.max(1), self.screen_height.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── defaults ──

    #[test]
    fn empty_document_yields_defaults() {
        let s = Settings::from_toml("").unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let s = Settings::load("this/path/does/not/exist.toml").unwrap();
        assert_eq!(s.screen_size(), (1280, 720));
        assert!(s.post_fx);
    }

    // ── parsing ──

    #[test]
    fn partial_document_overrides_only_given_keys() {
        let s = Settings::from_toml(
            r#"
            screen_width = 1920
            screen_height = 1080
            borderless = true
            monitor = 2
            "#,
        )
        .unwrap();

        assert_eq!(s.screen_size(), (1920, 1080));
        assert!(s.borderless);
        assert!(!s.fullscreen);
        assert_eq!(s.monitor, 2);
        assert_eq!(s.title, "kiln");
    }

    #[test]
    fn wrong_type_is_an_error() {
        assert!(Settings::from_toml("fullscreen = \"yes\"").is_err());
    }

    #[test]
    fn zero_size_is_clamped() {
        let s = Settings::from_toml("screen_width = 0").unwrap();
        assert_eq!(s.screen_size().0, 1);
    }

    // ── model path ──

    #[test]
    fn relative_model_is_joined_to_resources_dir() {
        let s = Settings::from_toml(
            r#"
            resources_dir = "assets"
            model = "sponza/Sponza.gltf"
            "#,
        )
        .unwrap();

        assert_eq!(
            s.model_path(),
            Some(PathBuf::from("assets").join("sponza/Sponza.gltf"))
        );
    }

    #[test]
    fn no_model_configured() {
        assert_eq!(Settings::default().model_path(), None);
    }
}
