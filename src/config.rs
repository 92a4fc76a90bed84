use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;

static DEFAULT_CONFIG_FILE: &str = "webtoonsaver";
static ENV_PREFIX: &str = "WEBTOONSAVER";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_save_root")]
    pub save_root: PathBuf,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub assembly: AssemblySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            save_root: default_save_root(),
            workers: None,
            http: HttpSettings::default(),
            assembly: AssemblySettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    /// Per request, so every download settles in bounded time.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Defaults to a generated browser user agent.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssemblySettings {
    /// Pages this tall or shorter are dropped (ads, banners).
    #[serde(default = "default_min_page_height")]
    pub min_page_height: u32,
    /// Pixels per inch of the output pages.
    #[serde(default = "default_resolution")]
    pub resolution: f32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default)]
    pub decode_threads: Option<usize>,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            min_page_height: default_min_page_height(),
            resolution: default_resolution(),
            jpeg_quality: default_jpeg_quality(),
            decode_threads: None,
        }
    }
}

fn default_save_root() -> PathBuf {
    PathBuf::from("comics")
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_min_page_height() -> u32 {
    500
}

fn default_resolution() -> f32 {
    100.0
}

fn default_jpeg_quality() -> u8 {
    85
}

impl Settings {
    /// Defaults, then the config file (optional unless given explicitly),
    /// then `WEBTOONSAVER_*` environment variables (`__` separates sections).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        config::Config::builder()
            .add_source(file.format(config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("failed to deserialize settings: {}", e))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("failed to deserialize settings: {}", e))
    }
}
