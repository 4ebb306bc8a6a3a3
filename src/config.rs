use serde::{Deserialize, Serialize};
use anyhow::Result;
use std::{fs, path::{Path, PathBuf}};

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub user: UserConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ServerConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Session cookie forwarded verbatim to the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct UserConfig {
    /// Signed-in identity, compared against message senders.
    pub email: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: default_log_level(), file: None }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        if let Some(p) = std::env::var_os("MAILVIEW_CONFIG") {
            return Ok(PathBuf::from(p));
        }
        let dir = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
        Ok(dir.join("mailview").join("config.toml"))
    }

    pub fn load_or_create() -> Result<(Self, bool, PathBuf)> {
        let path = Self::path()?;
        let (cfg, created) = Self::load_or_create_at(&path)?;
        Ok((cfg, created, path))
    }

    pub fn load_or_create_at(path: &Path) -> Result<(Self, bool)> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, DEFAULT_CONFIG)?;
            let cfg: Self = toml::from_str(DEFAULT_CONFIG)?;
            return Ok((cfg, true));
        }

        let data = fs::read_to_string(path)?;
        let cfg = toml::from_str(&data)?;
        Ok((cfg, false))
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(f) = &self.log.file {
            return Ok(f.clone());
        }
        let dir = dirs::data_local_dir().ok_or_else(|| anyhow::anyhow!("no data dir"))?;
        Ok(dir.join("mailview").join("mailview.log"))
    }
}

const DEFAULT_CONFIG: &str = r#"
[server]
base_url = "http://127.0.0.1:8000"
timeout_secs = 10
# cookie = "sessionid=..."

[user]
email = "you@example.com"

[log]
level = "info"
"#;
