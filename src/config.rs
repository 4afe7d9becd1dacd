// src/config.rs
//! Configuration management with file-based storage

use crate::error::{NmeaError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Routine telemetry a chartplotter repeats while idle.
pub const DEFAULT_BACKGROUND: [&str; 8] = ["RMC", "GGA", "GLL", "GSA", "GSV", "VTG", "ZDA", "XTE"];

/// ~32 feet, wider than the 95th percentile raw GPS error circle.
pub const DEFAULT_THRESHOLD_NM: f64 = 0.0056;

pub const DEFAULT_BAUD_RATE: u32 = 4800;
pub const DEFAULT_TIMEOUT_SECS: u64 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub serial_port: Option<String>,
    pub baud_rate: u32,
    pub timeout_secs: u64,
    pub background: Vec<String>,
    pub threshold_nm: f64,
    pub description: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            serial_port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            background: DEFAULT_BACKGROUND.iter().map(|s| s.to_string()).collect(),
            threshold_nm: DEFAULT_THRESHOLD_NM,
            description: "Waypoints captured from chartplotter.".to_string(),
        }
    }
}

impl ToolConfig {
    /// Load configuration from `~/.config/nmea-tools/config.json`
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .map_err(|e| NmeaError::Other(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| NmeaError::Other(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to the config file
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| NmeaError::Other(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| NmeaError::Other(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, contents)
            .map_err(|e| NmeaError::Other(format!("Failed to write config file: {}", e)))?;

        Ok(config_path)
    }

    fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| NmeaError::Other("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config").join("nmea-tools").join("config.json"))
    }

    /// Reject settings no component can run with.
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.threshold_nm)?;
        if self.baud_rate == 0 {
            return Err(NmeaError::Configuration("baud rate must be positive".to_string()));
        }
        if let Some(entry) = self.background.iter().find(|t| t.trim().is_empty()) {
            return Err(NmeaError::Configuration(format!(
                "empty background sentence type {:?}",
                entry
            )));
        }
        Ok(())
    }

    /// Update serial port settings
    pub fn update_serial(&mut self, port: String, baud_rate: u32) {
        self.serial_port = Some(port);
        self.baud_rate = baud_rate;
    }

    /// Replace the background list with comma separated identifiers
    pub fn update_background(&mut self, list: &str) {
        self.background = list
            .split(',')
            .map(|s| s.trim().to_ascii_uppercase())
            .collect();
    }
}

/// A match threshold must be a positive, finite distance.
pub fn validate_threshold(threshold_nm: f64) -> Result<()> {
    if !threshold_nm.is_finite() || threshold_nm <= 0.0 {
        return Err(NmeaError::Configuration(format!(
            "distance threshold must be positive, got {}",
            threshold_nm
        )));
    }
    Ok(())
}

/// Refuse to clobber an existing output unless `overwrite` is set.
///
/// Runs before any work starts so a long capture is never lost at the end.
pub fn check_output(path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        return Err(NmeaError::Configuration(format!(
            "{} exists, use --force to overwrite",
            path.display()
        )));
    }
    Ok(())
}
