//! Configuration for xfdashboard
//!
//! Loads configuration from TOML file at `~/.config/xfdashboard/config.toml`
//! Auto-generates default config file on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::actions::click::{DEFAULT_DRAG_THRESHOLD, DEFAULT_LONG_PRESS_DURATION};
use crate::actions::collapse::{DEFAULT_ANIMATION_SPEED, DEFAULT_COLLAPSED_SIZE};
use crate::actions::emblem::DEFAULT_EMBLEM_SIZE;
use crate::actions::{AnchorPoint, ClickAction, CollapseBox, CollapseOrientation, EmblemEffect};
use crate::layout::{Rect, RequestMode, ScaledTableLayout};
use crate::shared::IconLoader;
use crate::view::live_window::DEFAULT_ICON_SIZE;
use crate::view::{DisplayMode, LiveWindowView};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub stage: StageConfig,
    pub live_window: LiveWindowConfig,
    pub layout: LayoutConfig,
    pub click: ClickConfig,
    pub collapse: CollapseConfig,
    pub emblem: EmblemConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from `path` (or the default location)
    ///
    /// A missing file is created with defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            if let Err(e) = Self::save_default(&config_path) {
                warn!("Failed to create default config file: {:#}", e);
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file {:?}", config_path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", config_path))?;

        info!("Configuration loaded from {:?}", config_path);
        debug!("Config: {:?}", config);
        Ok(config)
    }

    /// Default config file location
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("xfdashboard");
        Ok(config_dir.join("config.toml"))
    }

    fn save_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;
        fs::write(path, toml_string).context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

/// Windowing backend selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Only "x11" is available
    pub name: String,
    /// X display, `$DISPLAY` when unset
    pub display: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            name: "x11".to_string(),
            display: None,
        }
    }
}

/// Dashboard stage window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub enabled: bool,
    pub title: String,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            title: "xfdashboard".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveWindowConfig {
    pub display_mode: DisplayMode,
    /// Destroy a view when its window closes
    pub destroy_on_close: bool,
    /// Icon size in pixels for icon-only mode and fallbacks
    pub icon_size: u32,
}

impl Default for LiveWindowConfig {
    fn default() -> Self {
        Self {
            display_mode: DisplayMode::LivePreview,
            destroy_on_close: true,
            icon_size: DEFAULT_ICON_SIZE,
        }
    }
}

impl LiveWindowConfig {
    pub fn configure(&self, view: &LiveWindowView) {
        view.set_display_mode(self.display_mode);
        view.set_destroy_on_window_close(self.destroy_on_close);
        view.set_icon_size(self.icon_size);
    }
}

/// Window grid layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub row_spacing: f32,
    pub column_spacing: f32,
    pub relative_scale: bool,
    pub prevent_upscaling: bool,
    pub request_mode: RequestMode,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            row_spacing: 8.0,
            column_spacing: 8.0,
            relative_scale: false,
            prevent_upscaling: true,
            request_mode: RequestMode::HeightForWidth,
        }
    }
}

impl LayoutConfig {
    pub fn build(&self) -> ScaledTableLayout {
        let mut layout = ScaledTableLayout::new();
        layout.set_row_spacing(self.row_spacing);
        layout.set_column_spacing(self.column_spacing);
        layout.set_relative_scale(self.relative_scale);
        layout.set_prevent_upscaling(self.prevent_upscaling);
        layout.set_request_mode(self.request_mode);
        layout
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickConfig {
    pub long_press_duration_ms: u64,
    /// Pointer travel in pixels that cancels a long press
    pub drag_threshold: f32,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            long_press_duration_ms: DEFAULT_LONG_PRESS_DURATION.as_millis() as u64,
            drag_threshold: DEFAULT_DRAG_THRESHOLD,
        }
    }
}

impl ClickConfig {
    pub fn build(&self, bounds: Rect) -> ClickAction {
        let mut click = ClickAction::new(bounds);
        click.set_long_press_duration(Duration::from_millis(self.long_press_duration_ms));
        click.set_drag_threshold(self.drag_threshold);
        click
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollapseConfig {
    pub collapsed_size: f32,
    pub orientation: CollapseOrientation,
    pub animation_speed: f32,
}

impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            collapsed_size: DEFAULT_COLLAPSED_SIZE,
            orientation: CollapseOrientation::Left,
            animation_speed: DEFAULT_ANIMATION_SPEED,
        }
    }
}

impl CollapseConfig {
    pub fn build(&self) -> CollapseBox {
        let mut collapse = CollapseBox::new(self.orientation);
        collapse.set_collapsed_size(self.collapsed_size);
        collapse.set_animation_speed(self.animation_speed);
        collapse
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmblemConfig {
    pub icon_name: String,
    pub icon_size: u32,
    pub padding: f32,
    pub x_align: f32,
    pub y_align: f32,
    pub anchor_point: AnchorPoint,
}

impl Default for EmblemConfig {
    fn default() -> Self {
        Self {
            icon_name: "emblem-favorite".to_string(),
            icon_size: DEFAULT_EMBLEM_SIZE,
            padding: 0.0,
            x_align: 0.0,
            y_align: 0.0,
            anchor_point: AnchorPoint::SouthEast,
        }
    }
}

impl EmblemConfig {
    pub fn build(&self, loader: Rc<dyn IconLoader>) -> EmblemEffect {
        let mut emblem = EmblemEffect::new(loader, self.icon_name.clone());
        emblem.set_icon_size(self.icon_size);
        emblem.set_padding(self.padding);
        emblem.set_x_align(self.x_align);
        emblem.set_y_align(self.y_align);
        emblem.set_anchor_point(self.anchor_point);
        emblem
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "xfdashboard=debug,info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        // The generated file parses back to the same values
        assert_eq!(Config::load(Some(&path)).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[live_window]
display_mode = "icon-only"

[click]
long_press_duration_ms = 750

[collapse]
orientation = "top"

[emblem]
anchor_point = "north-west"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.live_window.display_mode, DisplayMode::IconOnly);
        assert_eq!(config.live_window.icon_size, 64);
        assert_eq!(config.click.long_press_duration_ms, 750);
        assert_eq!(config.click.drag_threshold, 8.0);
        assert_eq!(config.collapse.orientation, CollapseOrientation::Top);
        assert_eq!(config.emblem.anchor_point, AnchorPoint::NorthWest);
        assert_eq!(config.stage, StageConfig::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[layout]\nrow_spacing = \"wide\"\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_builders_apply_values() {
        let click = ClickConfig {
            long_press_duration_ms: 250,
            drag_threshold: 3.0,
        }
        .build(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(click.long_press_duration(), Duration::from_millis(250));
        assert_eq!(click.drag_threshold(), 3.0);

        let layout = LayoutConfig {
            row_spacing: 2.0,
            column_spacing: 6.0,
            ..LayoutConfig::default()
        }
        .build();
        assert_eq!(layout.row_spacing(), 2.0);
        assert_eq!(layout.column_spacing(), 6.0);
        assert!(layout.prevent_upscaling());

        let collapse = CollapseConfig {
            collapsed_size: 20.0,
            ..CollapseConfig::default()
        }
        .build();
        assert_eq!(collapse.collapsed_size(), 20.0);
        assert!(collapse.is_collapsed());

        let emblem = EmblemConfig {
            icon_name: "emblem-important".to_string(),
            padding: 2.0,
            anchor_point: AnchorPoint::North,
            ..EmblemConfig::default()
        }
        .build(Rc::new(crate::shared::ThemeIconLoader::new(Vec::new(), Vec::new())));
        assert_eq!(emblem.icon_name(), "emblem-important");
        assert_eq!(emblem.padding(), 2.0);
        assert_eq!(emblem.anchor_point(), AnchorPoint::North);
        assert!(!emblem.is_loaded());
    }
}
