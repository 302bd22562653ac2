// src/config.rs

//! Configuration structures for the bar.
//!
//! Every section derives `Deserialize` with `#[serde(default)]`, so a config
//! file only needs to mention the settings it changes. The file is JSON and
//! is looked up in `$DOCKBAR_CONFIG`, then `$XDG_CONFIG_HOME/dockbar/config.json`,
//! then `~/.config/dockbar/config.json`. A missing file means defaults.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::color::Color;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "DOCKBAR_CONFIG";

/// Root of the configuration tree.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Bar window placement and size.
    pub bar: BarConfig,
    /// Colors shared by the bar and its drawers.
    pub appearance: AppearanceConfig,
    /// Render cadence.
    pub render: RenderConfig,
    /// Drawer selection and per-drawer settings.
    pub drawers: DrawersConfig,
}

/// Screen edge the bar is anchored to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Top,
    #[default]
    Bottom,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BarConfig {
    /// Height of the bar in millimeters; converted with the output's density.
    pub height_mm: u32,
    pub edge: Edge,
    /// Window title advertised through `WM_NAME` and `_NET_WM_NAME`.
    pub title: String,
}

impl Default for BarConfig {
    fn default() -> Self {
        BarConfig {
            height_mm: 5,
            edge: Edge::Bottom,
            title: "dockbar".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Color the canvas is cleared to before every frame.
    pub background: Color,
    /// Default ink for drawers that do not configure their own.
    pub foreground: Color,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        AppearanceConfig {
            background: Color::Rgb(0x1d, 0x1f, 0x21),
            foreground: Color::Rgb(0xc5, 0xc8, 0xc6),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Sleep between frames in milliseconds.
    pub interval_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig { interval_ms: 1000 }
    }
}

impl RenderConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Which drawers run, and their private settings.
///
/// The settings values are opaque to the core; each drawer decodes its own
/// entry with `State::drawer_settings`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct DrawersConfig {
    /// Names of the drawers to run. `None` runs every drawer that is enabled
    /// by default.
    pub enabled: Option<Vec<String>>,
    pub settings: BTreeMap<String, serde_json::Value>,
}

impl Config {
    /// Loads the configuration from the first config path that applies,
    /// falling back to defaults when no file exists.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            Some(path) => {
                info!(
                    "No config file at {}; using built-in defaults.",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                info!("No config location could be determined; using built-in defaults.");
                Ok(Self::default())
            }
        }
    }

    /// Parses a JSON config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Configuration loaded from {}", path.display());
        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    /// Resolves the config path from the environment.
    pub fn default_path() -> Option<PathBuf> {
        Self::resolve_path(
            std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from),
            std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            std::env::var_os("HOME").map(PathBuf::from),
        )
    }

    fn resolve_path(
        explicit: Option<PathBuf>,
        xdg_config_home: Option<PathBuf>,
        home: Option<PathBuf>,
    ) -> Option<PathBuf> {
        if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
            return Some(path);
        }
        let base = xdg_config_home
            .filter(|p| p.is_absolute())
            .or_else(|| home.map(|h| h.join(".config")))?;
        Some(base.join("dockbar").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn empty_document_yields_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.bar.height_mm, 5);
        assert_eq!(config.bar.edge, Edge::Bottom);
        assert_eq!(config.render.interval(), Duration::from_secs(1));
        assert!(config.drawers.enabled.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: Config = serde_json::from_str(
            r##"{
                "bar": { "edge": "top" },
                "appearance": { "background": "#000000" },
                "drawers": {
                    "enabled": ["clock"],
                    "settings": { "clock": { "seconds": false } }
                }
            }"##,
        )
        .unwrap();
        assert_eq!(config.bar.edge, Edge::Top);
        assert_eq!(config.bar.height_mm, 5);
        assert_eq!(config.appearance.background, Color::Rgb(0, 0, 0));
        assert_eq!(
            config.appearance.foreground,
            AppearanceConfig::default().foreground
        );
        assert_eq!(config.drawers.enabled, Some(vec!["clock".to_string()]));
        assert_eq!(
            config.drawers.settings["clock"],
            serde_json::json!({ "seconds": false })
        );
    }

    #[test]
    fn rejects_bad_colors() {
        let result: Result<Config, _> =
            serde_json::from_str(r#"{ "appearance": { "background": "ultraviolet" } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn explicit_path_wins() {
        let path = Config::resolve_path(
            Some(PathBuf::from("/tmp/bar.json")),
            Some(PathBuf::from("/xdg")),
            Some(PathBuf::from("/home/user")),
        );
        assert_eq!(path, Some(PathBuf::from("/tmp/bar.json")));
    }

    #[test]
    fn xdg_then_home_fallback() {
        assert_eq!(
            Config::resolve_path(None, Some(PathBuf::from("/xdg")), None),
            Some(PathBuf::from("/xdg/dockbar/config.json"))
        );
        // Relative XDG_CONFIG_HOME values are ignored.
        assert_eq!(
            Config::resolve_path(
                None,
                Some(PathBuf::from("relative")),
                Some(PathBuf::from("/home/user"))
            ),
            Some(PathBuf::from("/home/user/.config/dockbar/config.json"))
        );
        assert_eq!(Config::resolve_path(None, None, None), None);
    }

    #[test]
    fn load_from_reports_the_path_on_parse_errors() {
        let dir = std::env::temp_dir().join(format!("dockbar-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
