//! Client preferences
//!
//! Stored as a small JSON file next to the database. The planner never reads
//! them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Ring the terminal bell on completion
    #[serde(default = "enabled")]
    pub sound_enabled: bool,

    /// Show the greeting on start
    #[serde(default = "enabled")]
    pub welcome_animation_enabled: bool,
}

fn enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            welcome_animation_enabled: true,
        }
    }
}

impl Settings {
    /// `settings.json` in the database's directory
    pub fn path_for(db_path: &str) -> PathBuf {
        Path::new(db_path).with_file_name("settings.json")
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        self.sound_enabled
    }

    pub fn toggle_welcome(&mut self) -> bool {
        self.welcome_animation_enabled = !self.welcome_animation_enabled;
        self.welcome_animation_enabled
    }
}

/// Greeting for the local hour of day
pub fn greeting(hour: u32) -> &'static str {
    match hour {
        5..=11 => "Good morning",
        12..=17 => "Good afternoon",
        18..=22 => "Good evening",
        _ => "Good night",
    }
}
