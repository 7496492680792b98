use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "quaver";
const SETTINGS_FILE: &str = "settings.json";

/// Player settings that survive across sessions. The playlist itself is
/// rebuilt from the music directory on every start and is never written out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default = "default_skip_seconds")]
    pub skip_seconds: u16,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub repeat: bool,
}

fn default_volume() -> f32 {
    1.0
}

fn default_skip_seconds() -> u16 {
    15
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            skip_seconds: default_skip_seconds(),
            shuffle: false,
            repeat: false,
        }
    }
}

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var("QUAVER_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn settings_path() -> Result<PathBuf> {
    Ok(config_root()?.join(SETTINGS_FILE))
}

pub fn ensure_config_dir() -> Result<PathBuf> {
    let root = config_root()?;
    fs::create_dir_all(&root).with_context(|| format!("failed to create {}", root.display()))?;
    Ok(root)
}

pub fn load_settings() -> Result<Settings> {
    let path = settings_path()?;
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse settings file {}", path.display()))?;
    Ok(settings)
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    ensure_config_dir()?;
    let path = settings_path()?;
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // single test: both cases share the QUAVER_CONFIG_DIR override
    #[test]
    fn settings_round_trip_and_partial_files() {
        let dir = tempdir().expect("tempdir");
        unsafe {
            env::set_var("QUAVER_CONFIG_DIR", dir.path().to_string_lossy().as_ref());
        }

        let settings = Settings {
            volume: 0.4,
            repeat: true,
            ..Settings::default()
        };
        save_settings(&settings).expect("save");
        let loaded = load_settings().expect("load");
        assert_eq!(loaded.volume, 0.4);
        assert!(loaded.repeat);
        assert!(!loaded.shuffle);
        assert_eq!(loaded.skip_seconds, 15);

        fs::write(dir.path().join(SETTINGS_FILE), r#"{"shuffle": true}"#).expect("write");
        let partial = load_settings().expect("load");
        assert!(partial.shuffle);
        assert_eq!(partial.volume, 1.0);
        assert_eq!(partial.skip_seconds, 15);
    }
}
