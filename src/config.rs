//! Application configuration.
//!
//! The configuration is loaded from a JSON file, by default
//! `$XDG_CONFIG_HOME/xpager/config.json` (or the path given with `-rc`).
//! Every key is optional; missing keys fall back to compiled-in defaults.
//!
//! # Example
//!
//! ```json
//! {
//!   "x": 10,
//!   "y": 10,
//!   "workspace": { "width": 80, "height": 60, "follow_scale": "none" },
//!   "buttons": { "close_window": "3 3 1", "multi_click_ms": 300 },
//!   "colors": { "current_background": "#404040" },
//!   "layer": "top",
//!   "follow_drag": true
//! }
//! ```

use crate::geometry::{Alignment, Size};
use crate::gesture::ButtonConfig;
use crate::hints::WindowHints;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial position of the pager window.
    pub x: i32,
    pub y: i32,
    pub workspace: WorkspaceConfig,
    pub borders: BorderConfig,
    pub buttons: ButtonConfig,
    pub colors: ColorConfig,
    /// Border width of window proxies.
    pub window_border_width: u32,
    pub layer: Layer,
    /// Switch workspace while dragging a window across thumbnails.
    pub follow_drag: bool,
    /// Move the real window while moving its proxy.
    pub follow_move: bool,
    pub protocols: ProtocolConfig,
    /// Publish `_NET_DESKTOP_LAYOUT` after every relayout.
    pub publish_desktop_layout: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            workspace: WorkspaceConfig::default(),
            borders: BorderConfig::default(),
            buttons: ButtonConfig::default(),
            colors: ColorConfig::default(),
            window_border_width: 1,
            layer: Layer::default(),
            follow_drag: false,
            follow_move: false,
            protocols: ProtocolConfig::default(),
            publish_desktop_layout: true,
        }
    }
}

/// Thumbnail size and arrangement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub width: u32,
    pub height: u32,
    /// Thumbnails per row (or column) before wrapping.
    pub per_row: usize,
    /// Which configured extent to keep when matching the screen aspect.
    pub follow_scale: FollowScale,
    pub align: Alignment,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            per_row: 6400,
            follow_scale: FollowScale::Height,
            align: Alignment::LeftToRight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowScale {
    /// Keep the height, derive the width from the screen aspect.
    #[default]
    Height,
    /// Keep the width, derive the height.
    Width,
    /// Use both extents as configured.
    None,
}

/// Stacking layer requested for the pager window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Top,
    #[default]
    Normal,
    Bottom,
}

impl Layer {
    /// The matching hint flag, if any.
    pub fn hint_flags(self) -> u32 {
        match self {
            Layer::Top => WindowHints::LAYER_TOP,
            Layer::Normal => 0,
            Layer::Bottom => WindowHints::LAYER_BOTTOM,
        }
    }
}

impl std::str::FromStr for Layer {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Layer::Top),
            "normal" => Ok(Layer::Normal),
            "bottom" => Ok(Layer::Bottom),
            other => Err(ConfigError(format!("unknown layer {:?}", other))),
        }
    }
}

/// A border colour and width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Border {
    pub color: String,
    pub width: u32,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            color: "white".into(),
            width: 1,
        }
    }
}

/// Borders of the current and the other workspace thumbnails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderConfig {
    pub active: Border,
    pub inactive: Border,
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            active: Border {
                color: "darkgreen".into(),
                width: 1,
            },
            inactive: Border {
                color: "white".into(),
                width: 1,
            },
        }
    }
}

/// Colour names, anything the X server's colour database accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Pager window background.
    pub pager: String,
    /// Proxy of an unfocused window.
    pub window: String,
    /// Proxy of the focused window.
    pub focused_window: String,
    pub window_border: String,
    /// Background of inactive workspaces.
    pub background: String,
    /// Background of the current workspace.
    pub current_background: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            pager: "white".into(),
            window: "white".into(),
            focused_window: "white".into(),
            window_border: "black".into(),
            background: "darkgray".into(),
            current_background: "lightgray".into(),
        }
    }
}

/// Which protocol adapters to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub ewmh: bool,
    pub fluxbox: bool,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            ewmh: true,
            fluxbox: true,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Pretty-printed JSON of the effective settings.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError(e.to_string()))
    }

    /// Thumbnail size for a screen of `screen` pixels.
    pub fn thumbnail_size(&self, screen: Size) -> Size {
        let ws = &self.workspace;
        if screen.width == 0 || screen.height == 0 {
            return Size::new(ws.width.max(1), ws.height.max(1));
        }
        let (sw, sh) = (u64::from(screen.width), u64::from(screen.height));
        let (width, height) = match ws.follow_scale {
            FollowScale::Height => ((u64::from(ws.height) * sw / sh) as u32, ws.height),
            FollowScale::Width => (ws.width, (u64::from(ws.width) * sh / sw) as u32),
            FollowScale::None => (ws.width, ws.height),
        };
        Size::new(width.max(1), height.max(1))
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.workspace.width, 64);
        assert_eq!(cfg.workspace.per_row, 6400);
        assert_eq!(cfg.borders.active.color, "darkgreen");
        assert_eq!(cfg.colors.background, "darkgray");
        assert_eq!(cfg.layer, Layer::Normal);
        assert!(cfg.protocols.ewmh && cfg.protocols.fluxbox);
        assert!(!cfg.follow_drag);
    }

    #[test]
    fn deserialize_partial_sections() {
        let json = r#"{
            "workspace": { "width": 100, "follow_scale": "none", "align": "TopToBottom" },
            "buttons": { "exit": "2 2" },
            "layer": "bottom"
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.workspace.width, 100);
        assert_eq!(cfg.workspace.height, 64);
        assert_eq!(cfg.workspace.follow_scale, FollowScale::None);
        assert_eq!(cfg.workspace.align, Alignment::TopToBottom);
        assert_eq!(cfg.buttons.exit, "2 2");
        assert_eq!(cfg.buttons.close_window, "3 3 1");
        assert_eq!(cfg.layer, Layer::Bottom);
    }

    #[test]
    fn unknown_keys_ignored() {
        let json = r#"{ "alpha": 255, "future_section": { "key": 42 } }"#;
        let _cfg: Config = serde_json::from_str(json).unwrap();
    }

    #[test]
    fn json_dump_round_trips() {
        let cfg = Config::default();
        let back: Config = serde_json::from_str(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn thumbnail_follows_screen_aspect() {
        let mut cfg = Config::default();
        let screen = Size::new(1600, 1200);
        assert_eq!(cfg.thumbnail_size(screen), Size::new(85, 64));

        cfg.workspace.follow_scale = FollowScale::Width;
        cfg.workspace.width = 80;
        assert_eq!(cfg.thumbnail_size(screen), Size::new(80, 60));

        cfg.workspace.follow_scale = FollowScale::None;
        assert_eq!(cfg.thumbnail_size(screen), Size::new(80, 64));
    }

    #[test]
    fn layer_parsing_and_flags() {
        assert_eq!("TOP".parse::<Layer>().unwrap(), Layer::Top);
        assert!("sideways".parse::<Layer>().is_err());
        assert_eq!(Layer::Bottom.hint_flags(), WindowHints::LAYER_BOTTOM);
        assert_eq!(Layer::Normal.hint_flags(), 0);
    }

    #[test]
    fn load_missing_file_fails() {
        let err = Config::load(Path::new("/nonexistent/xpager/config.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
