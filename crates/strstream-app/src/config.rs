use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strstream_core::{ConfigError, DataBits, PacingConfig, StopBits};

/// Settings for a replay run, read from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ReplayConfig {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: String,
    pub stop_bits: u8,
    /// Source buffer capacity; defaults to the size of the input file
    pub capacity: Option<usize>,
    pub hex: bool,
    pub bytes_per_line: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9_600,
            data_bits: 8,
            parity: "none".to_string(),
            stop_bits: 1,
            capacity: None,
            hex: false,
            bytes_per_line: 16,
        }
    }
}

impl ReplayConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("strstream").join("config.json"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Loads `explicit` if given, else the per-user config file if it exists,
    /// else the defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn pacing(&self) -> Result<PacingConfig, ConfigError> {
        Ok(PacingConfig {
            baud_rate: self.baud_rate,
            data_bits: DataBits::try_from(self.data_bits)?,
            parity: self.parity.parse()?,
            stop_bits: StopBits::try_from(self.stop_bits)?,
        })
    }
}
