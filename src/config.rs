use crate::settings::Settings;
use eyre::Result;
use serde_json::{Map, Value};
use std::{fs, path::PathBuf};

pub const APP_DIR: &str = "hifz";
pub const CONFIG_FILE: &str = "configuration.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    filepath: PathBuf,
}

impl Config {
    /// Load the user configuration, writing the defaults on first run.
    pub fn new() -> Result<Self> {
        let prefix = get_app_data_prefix()?;
        let filepath = prefix.join(CONFIG_FILE);

        if filepath.exists() {
            return Self::load_from(filepath);
        }

        let config = Self {
            settings: Settings::default(),
            filepath,
        };
        config.save()?;
        Ok(config)
    }

    /// Get the configuration file path
    pub fn filepath(&self) -> &PathBuf {
        &self.filepath
    }

    /// Create a config with custom settings for testing
    pub fn with_settings(settings: Settings) -> Result<Self> {
        let prefix = get_app_data_prefix()?;
        let filepath = prefix.join("test_configuration.json");
        Ok(Self { settings, filepath })
    }

    /// Defaults for when no configuration directory can be found.
    pub fn unsaved_defaults() -> Self {
        Self {
            settings: Settings::default(),
            filepath: PathBuf::from(CONFIG_FILE),
        }
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<()> {
        let config_json = serde_json::json!({
            "Setting": self.settings,
        });

        let config_str = serde_json::to_string_pretty(&config_json)?;

        if let Some(parent) = self.filepath.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.filepath, config_str)?;
        Ok(())
    }

    /// Load configuration from a custom path.
    ///
    /// Unreadable JSON falls back to the defaults; a field with the wrong
    /// type is skipped and the rest of the file still applies.
    pub fn load_from(filepath: PathBuf) -> Result<Self> {
        let mut settings = Settings::default();

        if filepath.exists() {
            let config_str = fs::read_to_string(&filepath)?;
            match serde_json::from_str::<Value>(&config_str) {
                Ok(user_config) => {
                    if let Some(user_settings) =
                        user_config.get("Setting").and_then(|v| v.as_object())
                    {
                        settings = overlay_settings(user_settings)?;
                    }
                }
                Err(err) => {
                    log::warn!(
                        "Ignoring unreadable configuration {}: {}",
                        filepath.display(),
                        err
                    );
                }
            }
        }

        settings.clamp();
        Ok(Self { settings, filepath })
    }
}

fn overlay_settings(user_settings: &Map<String, Value>) -> Result<Settings> {
    let mut merged = serde_json::to_value(Settings::default())?;
    for (key, value) in user_settings {
        let Some(slot) = merged.get_mut(key) else {
            log::debug!("Unknown setting `{}` ignored", key);
            continue;
        };
        let previous = std::mem::replace(slot, value.clone());
        if serde_json::from_value::<Settings>(merged.clone()).is_err() {
            log::warn!("Setting `{}` has the wrong type, keeping default", key);
            if let Some(slot) = merged.get_mut(key) {
                *slot = previous;
            }
        }
    }
    Ok(serde_json::from_value(merged)?)
}

pub fn get_app_data_prefix() -> Result<PathBuf> {
    if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
        let path = PathBuf::from(config_home).join(APP_DIR);
        return Ok(path);
    } else if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home.clone()).join(".config").join(APP_DIR);
        if path.exists() {
            return Ok(path);
        } else {
            return Ok(PathBuf::from(home).join(format!(".{APP_DIR}")));
        }
    } else if let Some(user_profile) = std::env::var_os("USERPROFILE") {
        return Ok(PathBuf::from(user_profile).join(format!(".{APP_DIR}")));
    }

    Err(eyre::eyre!("Could not determine application data directory"))
}
