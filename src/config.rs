//! Configuration management for the Folio viewer

use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::render::{Container, RenderSettings};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    pub quality_multiplier: f32,
    pub device_pixel_ratio: f32,
    pub fit_height_margin: f32,
    pub resize_debounce_ms: u64,
    pub container_width: f32,
    pub container_height: f32,
    /// Save every loaded file set for later restore
    pub persist_files: bool,
    pub capabilities: Capabilities,
}

/// Optional viewer features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub notes: bool,
    /// Per-file jump list
    pub file_switch: bool,
    /// Thumbnails render on request only
    pub thumbnails_lazy: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            notes: true,
            file_switch: true,
            thumbnails_lazy: true,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            quality_multiplier: 1.5,
            device_pixel_ratio: 1.0,
            fit_height_margin: 20.0,
            resize_debounce_ms: 250,
            container_width: 1280.0,
            container_height: 800.0,
            persist_files: true,
            capabilities: Capabilities::default(),
        }
    }
}

impl ViewerConfig {
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            device_pixel_ratio: self.device_pixel_ratio,
            quality_multiplier: self.quality_multiplier,
            fit_height_margin: self.fit_height_margin,
        }
    }

    pub fn container(&self) -> Container {
        Container::new(self.container_width, self.container_height)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "sqlite:./folio.db".to_string(),
            },
            viewer: ViewerConfig::default(),
        }
    }
}

fn var_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = ViewerConfig::default();
        let capabilities = Capabilities {
            notes: var_or("VIEWER_NOTES", defaults.capabilities.notes),
            file_switch: var_or("VIEWER_FILE_SWITCH", defaults.capabilities.file_switch),
            thumbnails_lazy: var_or("VIEWER_THUMBNAILS_LAZY", defaults.capabilities.thumbnails_lazy),
        };

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: var_or("SERVER_PORT", 3000),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./folio.db".to_string()),
            },
            viewer: ViewerConfig {
                quality_multiplier: var_or("VIEWER_QUALITY_MULTIPLIER", defaults.quality_multiplier),
                device_pixel_ratio: var_or("VIEWER_DEVICE_PIXEL_RATIO", defaults.device_pixel_ratio),
                fit_height_margin: var_or("VIEWER_FIT_HEIGHT_MARGIN", defaults.fit_height_margin),
                resize_debounce_ms: var_or("VIEWER_RESIZE_DEBOUNCE_MS", defaults.resize_debounce_ms),
                container_width: var_or("VIEWER_CONTAINER_WIDTH", defaults.container_width),
                container_height: var_or("VIEWER_CONTAINER_HEIGHT", defaults.container_height),
                persist_files: var_or("VIEWER_PERSIST_FILES", defaults.persist_files),
                capabilities,
            },
        })
    }
}
