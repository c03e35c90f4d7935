use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Top-level engine settings, usually read from a JSON file next to the game.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Camera output size and tuning.
    pub viewport: ViewportConfig,
    /// Asset lookup and placeholder fallback.
    pub loader: LoaderConfig,
    /// Debug overlay switches.
    pub debug: DebugConfig,
}

impl EngineConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(txt: &str) -> anyhow::Result<Self> {
        serde_json::from_str(txt).context("Parsing engine config")
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let txt = std::fs::read_to_string(path)
            .with_context(|| format!("Reading engine config {}", path.display()))?;
        serde_json::from_str(&txt)
            .with_context(|| format!("Parsing engine config {}", path.display()))
    }
}

/// Camera output size and tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Output width in pixels.
    pub width: f32,
    /// Output height in pixels.
    pub height: f32,
    /// Follow rate in 1/s; `rate * dt >= 1` snaps.
    pub smooth_rate: f32,
    /// Smallest target zoom.
    pub min_zoom: f32,
    /// Largest target zoom.
    pub max_zoom: f32,
    /// Zoom smoothing rate in 1/s.
    pub zoom_speed: f32,
    /// Target zoom change per `zoom_in`/`zoom_out`.
    pub zoom_step: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            smooth_rate: 8.0,
            min_zoom: 0.5,
            max_zoom: 4.0,
            zoom_speed: 5.0,
            zoom_step: 0.1,
        }
    }
}

/// How the map loader finds assets and what it falls back to.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Second place to look for tileset images, by file name.
    pub asset_fallback_dir: Option<PathBuf>,
    /// Size of the map generated when loading fails.
    pub placeholder: PlaceholderConfig,
}

/// Dimensions of the generated fallback map.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    /// Width in tiles.
    pub cols: u32,
    /// Height in tiles.
    pub rows: u32,
    /// Tile width in pixels.
    pub tile_width: u32,
    /// Tile height in pixels.
    pub tile_height: u32,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            cols: 40,
            rows: 30,
            tile_width: 32,
            tile_height: 32,
        }
    }
}

/// Overlays enabled at startup.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Tint solid cells.
    pub collision_overlay: bool,
    /// Tint zone cells.
    pub zone_overlay: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let cfg = EngineConfig::from_json_str("{}").expect("empty config parses");
        assert_eq!(cfg.viewport.width, 1280.0);
        assert_eq!(cfg.viewport.smooth_rate, 8.0);
        assert_eq!(cfg.loader.placeholder.cols, 40);
        assert!(cfg.loader.asset_fallback_dir.is_none());
        assert!(!cfg.debug.collision_overlay);
    }

    #[test]
    fn partial_sections_override_only_given_fields() {
        let cfg = EngineConfig::from_json_str(
            r#"{
              "viewport": { "width": 640, "smooth_rate": 4.5 },
              "loader": { "asset_fallback_dir": "resources/tiles", "placeholder": { "cols": 10 } },
              "debug": { "zone_overlay": true }
            }"#,
        )
        .expect("config parses");
        assert_eq!(cfg.viewport.width, 640.0);
        assert_eq!(cfg.viewport.height, 720.0);
        assert_eq!(cfg.viewport.smooth_rate, 4.5);
        assert_eq!(
            cfg.loader.asset_fallback_dir.as_deref(),
            Some(Path::new("resources/tiles"))
        );
        assert_eq!(cfg.loader.placeholder.cols, 10);
        assert_eq!(cfg.loader.placeholder.tile_width, 32);
        assert!(cfg.debug.zone_overlay);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(EngineConfig::from_json_str("{ not json").is_err());
        assert!(EngineConfig::load("definitely/not/here.json").is_err());
    }
}
