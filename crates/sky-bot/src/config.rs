//! Application configuration loaded from an optional TOML file and
//! environment variables.

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Overrides the config file location.
pub const CONFIG_PATH_VAR: &str = "SKY_BOT_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Bot configuration
    #[serde(default)]
    pub bot: BotConfig,

    /// OneBot (NapCat) configuration
    #[serde(default)]
    pub onebot: OneBotConfig,

    /// Height lookup platforms
    #[serde(default)]
    pub height: HeightConfig,

    /// Daily information endpoints
    #[serde(default)]
    pub apis: ApisConfig,

    /// Command switches and help ordering
    #[serde(default)]
    pub settings: SettingsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    /// Prefix every command starts with
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    /// Bot QQ number used as the author of forward nodes. Looked up from
    /// NapCat when unset.
    #[serde(default)]
    pub self_id: Option<i64>,

    /// Nickname shown on forward nodes
    #[serde(default)]
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OneBotConfig {
    /// NapCat HTTP API endpoint
    #[serde(default = "default_onebot_url")]
    pub api_url: String,

    /// Access token configured in NapCat
    #[serde(default)]
    pub token: Option<String>,

    /// Request timeout for OneBot actions
    #[serde(default = "default_onebot_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Send results as merged-forward bundles
    #[serde(default = "default_true")]
    pub forward_enabled: bool,

    /// Address NapCat posts events to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeightConfig {
    /// Platform used when the command names none
    #[serde(default = "default_platform")]
    pub default_platform: String,

    /// Extra aliases, one `platform:alias1,alias2` entry per platform
    #[serde(default)]
    pub platform_aliases: Vec<String>,

    #[serde(default = "default_api_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default)]
    pub mango: PlatformConfig,

    #[serde(default)]
    pub ovoav: PlatformConfig,

    #[serde(default)]
    pub yingtian: PlatformConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Falls back to the platform's public endpoint
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApisConfig {
    #[serde(default)]
    pub task: EndpointConfig,
    #[serde(default)]
    pub candle: EndpointConfig,
    #[serde(default)]
    pub ancestor: EndpointConfig,
    #[serde(default)]
    pub magic: EndpointConfig,
    #[serde(default)]
    pub season_candle: EndpointConfig,
    #[serde(default)]
    pub calendar: EndpointConfig,
    #[serde(default)]
    pub redstone: EndpointConfig,
    #[serde(default)]
    pub skytest: EndpointConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// Falls back to the public endpoint for this report
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(default = "default_api_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettingsConfig {
    /// Commands listed first in the help overview
    #[serde(default = "default_display_order")]
    pub display_order: Vec<String>,

    /// Per-command switches keyed by command name. Missing entries are enabled.
    #[serde(default)]
    pub enabled: HashMap<String, bool>,
}

impl SettingsConfig {
    pub fn is_enabled(&self, command: &str) -> bool {
        self.enabled.get(command).copied().unwrap_or(true)
    }
}

impl HeightConfig {
    /// Platform section by canonical name.
    pub fn platform(&self, name: &str) -> Option<&PlatformConfig> {
        match name {
            "mango" => Some(&self.mango),
            "ovoav" => Some(&self.ovoav),
            "yingtian" => Some(&self.yingtian),
            _ => None,
        }
    }
}

impl ApisConfig {
    /// Endpoint section by report name.
    pub fn endpoint(&self, name: &str) -> Option<&EndpointConfig> {
        match name {
            "task" => Some(&self.task),
            "candle" => Some(&self.candle),
            "ancestor" => Some(&self.ancestor),
            "magic" => Some(&self.magic),
            "season_candle" => Some(&self.season_candle),
            "calendar" => Some(&self.calendar),
            "redstone" => Some(&self.redstone),
            "skytest" => Some(&self.skytest),
            _ => None,
        }
    }
}

// Default implementations
impl Default for BotConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            command_prefix: default_command_prefix(),
            self_id: None,
            nickname: None,
        }
    }
}

impl Default for OneBotConfig {
    fn default() -> Self {
        Self {
            api_url: default_onebot_url(),
            token: None,
            timeout: default_onebot_timeout(),
            forward_enabled: default_true(),
            listen_addr: default_listen_addr(),
        }
    }
}

impl Default for HeightConfig {
    fn default() -> Self {
        Self {
            default_platform: default_platform(),
            platform_aliases: Vec::new(),
            timeout: default_api_timeout(),
            mango: PlatformConfig::default(),
            ovoav: PlatformConfig::default(),
            yingtian: PlatformConfig::default(),
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            url: None,
            key: None,
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: None,
            key: None,
            timeout: default_api_timeout(),
        }
    }
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            display_order: default_display_order(),
            enabled: HashMap::new(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".into()
}

fn default_command_prefix() -> String {
    "#".into()
}

fn default_onebot_url() -> String {
    "http://127.0.0.1:5222".into()
}

fn default_onebot_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_listen_addr() -> String {
    "0.0.0.0:5223".into()
}

fn default_platform() -> String {
    "mango".into()
}

fn default_api_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_display_order() -> Vec<String> {
    [
        "all",
        "height",
        "task",
        "candle",
        "season_candle",
        "ancestor",
        "magic",
        "calendar",
        "redstone",
        "skytest",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from `config.toml` (or `$SKY_BOT_CONFIG`) and
    /// environment variables. Environment wins.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let file = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => File::with_name(&path).required(true),
            Err(_) => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Self::build(config::Config::builder().add_source(file))
    }

    /// Parse a TOML document, still layering environment variables on top.
    pub fn from_toml(toml: &str) -> Result<Self> {
        Self::build(config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config = builder
            .add_source(
                Environment::default()
                    .separator("__")
                    // Keep keys such as "0123-..." strings rather than numbers.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
