use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::amp::Amp60;
use crate::switcher::VideoSwitcher2x1;
use crate::utils::app_paths::AppPaths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub devices: Vec<DeviceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request deadline in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Switcher,
    Amp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    pub kind: DeviceKind,
    /// Host or host:port of the device web server
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 5 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl DeviceConfig {
    pub fn switcher(&self, timeout: Duration) -> VideoSwitcher2x1 {
        VideoSwitcher2x1::new(
            &self.address,
            self.username.as_deref().unwrap_or(""),
            self.password.as_deref().unwrap_or(""),
        )
        .with_timeout(timeout)
    }

    pub fn amp(&self, timeout: Duration) -> Amp60 {
        Amp60::new(&self.address).with_timeout(timeout)
    }
}

impl Config {
    /// Load config from the default location, falling back to defaults
    /// when no file exists yet
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        if !config_path.exists() {
            return Ok(Config::default());
        }
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(AppPaths::config_dir()?.join("config.toml"))
    }

    pub fn find_device(&self, name: &str) -> Option<&DeviceConfig> {
        self.devices.iter().find(|d| d.name == name)
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# Atlona control configuration
# Location: ~/.config/atlona/config.toml (Linux)
#           ~/Library/Application Support/atlona/config.toml (macOS)
#           %APPDATA%\atlona\config.toml (Windows)

[http]
# Seconds to wait for a device before giving up on a request
timeout_secs = 5

# Devices can be addressed by name: atlona-ctl device <name> <command>
#
# [[devices]]
# name = "lectern"
# kind = "switcher"
# address = "10.5.34.12"
# username = "admin"
# password = "Atlona"
#
# [[devices]]
# name = "ceiling-amp"
# kind = "amp"
# address = "10.5.34.13"
"#
        .to_string()
    }
}
