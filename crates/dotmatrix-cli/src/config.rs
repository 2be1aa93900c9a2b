use std::path::{Path, PathBuf};

use dotmatrix_core::ppu::SpriteOrder;
use log::warn;
use serde::{Deserialize, Serialize};

/// Greens of the original screen, lightest first.
pub const DEFAULT_PALETTE: [[u8; 3]; 4] = [
    [0xE0, 0xF8, 0xD0],
    [0x88, 0xC0, 0x70],
    [0x34, 0x68, 0x56],
    [0x08, 0x18, 0x20],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SpriteOrderSetting {
    #[default]
    Coordinate,
    OamIndex,
}

impl From<SpriteOrderSetting> for SpriteOrder {
    fn from(setting: SpriteOrderSetting) -> Self {
        match setting {
            SpriteOrderSetting::Coordinate => SpriteOrder::Coordinate,
            SpriteOrderSetting::OamIndex => SpriteOrder::OamIndex,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulationConfig {
    pub boot_rom: Option<PathBuf>,
    pub frames: u32,
    pub sprite_order: SpriteOrderSetting,
}

impl Default for EmulationConfig {
    fn default() -> Self {
        Self {
            boot_rom: None,
            frames: 60,
            sprite_order: SpriteOrderSetting::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Four `#RRGGBB` colours for shades 0-3.
    pub palette: Vec<String>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            palette: DEFAULT_PALETTE.iter().map(|c| to_hex(*c)).collect(),
        }
    }
}

impl VideoConfig {
    /// Resolve the palette, substituting the default for any entry that is
    /// missing or malformed.
    pub fn rgb_palette(&self) -> [[u8; 3]; 4] {
        let mut out = DEFAULT_PALETTE;
        for (i, slot) in out.iter_mut().enumerate() {
            match self.palette.get(i).map(|s| parse_hex(s)) {
                Some(Some(rgb)) => *slot = rgb,
                Some(None) => warn!("Invalid palette colour {:?}; using default", self.palette[i]),
                None => {}
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub emulation: EmulationConfig,
    pub video: VideoConfig,
    pub audio: AudioConfig,
}

fn to_hex([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02X}{g:02X}{b:02X}")
}

fn parse_hex(s: &str) -> Option<[u8; 3]> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    Some([(value >> 16) as u8, (value >> 8) as u8, value as u8])
}

pub fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("dotmatrix").join("config.toml");
        }
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("dotmatrix").join("config.toml");
    }

    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join("dotmatrix")
            .join("config.toml");
    }

    PathBuf::from("config.toml")
}

/// Read the config file. A missing file silently yields defaults; an
/// unreadable or malformed one is reported and also yields defaults.
pub fn load_from_file(path: &Path) -> Config {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Config::default(),
        Err(e) => {
            warn!("Failed to read config {}: {e}; using defaults", path.display());
            return Config::default();
        }
    };

    match toml::from_str::<Config>(&text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(
                "Failed to parse config {}: {e}; using defaults",
                path.display()
            );
            Config::default()
        }
    }
}
