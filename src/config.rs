//! Persistent settings, stored as pretty-printed JSON.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::control::DEFAULT_SOCKET_PATH;
use crate::display::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::error::MarbleError;
use crate::marble::MarbleTunables;
use crate::mqtt::DEFAULT_TOPIC;

pub const DEFAULT_CONFIG_PATH: &str = "marble.json";
/// Largest accepted edge for the generated texture maps
pub const MAX_TEXTURE_SIZE: u32 = 4096;
/// Largest accepted window width or height
pub const MAX_WINDOW_SIZE: u32 = 8192;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            vsync: true,
        }
    }
}

/// Procedural texture generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    /// Edge length of both square maps
    pub size: u32,
    pub seed: u32,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self { size: 256, seed: 42 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Unix socket path; `None` disables the socket
    pub socket: Option<String>,
    /// Broker host; `None` disables MQTT
    pub mqtt_host: Option<String>,
    pub mqtt_topic: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            socket: Some(DEFAULT_SOCKET_PATH.to_string()),
            mqtt_host: None,
            mqtt_topic: DEFAULT_TOPIC.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarbleConfig {
    pub tunables: MarbleTunables,
    pub window: WindowConfig,
    pub textures: TextureConfig,
    pub remote: RemoteConfig,
}

impl MarbleConfig {
    /// Load from `path`. A missing file gives the defaults; anything else
    /// that goes wrong, including out-of-range tunables, is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MarbleError> {
        let path = path.as_ref();
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            },
            Err(e) => return Err(e.into()),
        };
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Save to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MarbleError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        log::info!("saved config to {}", path.as_ref().display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), MarbleError> {
        self.tunables.validate()?;
        let window_range = 1..=MAX_WINDOW_SIZE;
        if !window_range.contains(&self.window.width) || !window_range.contains(&self.window.height)
        {
            return Err(MarbleError::invalid(
                "window",
                format!("width and height must be in 1..={MAX_WINDOW_SIZE}"),
            ));
        }
        if !(1..=MAX_TEXTURE_SIZE).contains(&self.textures.size) {
            return Err(MarbleError::invalid(
                "textures.size",
                format!("must be in 1..={MAX_TEXTURE_SIZE}"),
            ));
        }
        Ok(())
    }
}
