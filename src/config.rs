use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default location of the configuration file, relative to the working directory.
pub const CONFIG_FILE: &str = "rusbit.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub peer_id_prefix: String,
    pub listen_port: u16,
    pub connect_timeout: u64, // seconds
    pub tracker_timeout: u64, // seconds
    pub compact: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            peer_id_prefix: "-RB0001-".to_string(),
            listen_port: 6881,
            connect_timeout: 5,
            tracker_timeout: 15,
            compact: true,
        }
    }
}

impl Config {
    /// Loads the configuration at `path`, falling back to defaults when the
    /// file does not exist. Keys missing from the file keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let path = path.as_ref();
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn tracker_timeout(&self) -> Duration {
        Duration::from_secs(self.tracker_timeout)
    }
}
