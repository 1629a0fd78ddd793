//! Bridge configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Runtime settings for a bridge instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Delay between a key press and its synthesized release
    pub release_delay_ms: u64,
    /// Grace period after a confirmed quit before the process is killed
    pub force_exit_after_ms: u64,
    /// Function key number that requests shutdown
    pub quit_key: u8,
    /// Report mouse motion and buttons
    pub mouse_capture: bool,
    /// Draw on the alternate screen buffer
    pub alternate_screen: bool,
    /// Paint exact palette RGB values instead of named terminal colors
    pub true_color: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            release_delay_ms: 10,
            force_exit_after_ms: 3000,
            quit_key: 12,
            mouse_capture: true,
            alternate_screen: true,
            true_color: false,
        }
    }
}

impl BridgeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/cga-bridge/config.json` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cga-bridge").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.release_delay_ms == 0 {
            return Err(BridgeError::Configuration(
                "release_delay_ms must be greater than zero".to_string(),
            ));
        }
        if !(1..=24).contains(&self.quit_key) {
            return Err(BridgeError::Configuration(format!(
                "quit_key must be a function key number 1-24, got {}",
                self.quit_key
            )));
        }
        Ok(())
    }

    pub fn release_delay(&self) -> Duration {
        Duration::from_millis(self.release_delay_ms)
    }

    pub fn force_exit_after(&self) -> Duration {
        Duration::from_millis(self.force_exit_after_ms)
    }
}
