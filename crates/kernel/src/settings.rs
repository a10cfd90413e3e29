use std::path::PathBuf;

use anyhow::{anyhow, Context};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "READLIST_ENV";
const CONFIG_DIR_ENV: &str = "READLIST_CONFIG_DIR";
const ENV_PREFIX: &str = "READLIST";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub bot: BotSettings,
    #[serde(default)]
    pub reading_list: ReadingListSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load configuration from an explicit directory and environment name.
    pub fn load_from(config_dir: &std::path::Path, environment: &str) -> anyhow::Result<Self> {
        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // Override environment field with parsed enum variant.
        settings.environment = environment.parse()?;

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info,tower_http=info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Book catalog search settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    /// Volumes endpoint of the catalog API.
    #[serde(default = "SearchSettings::default_api_url")]
    pub api_url: String,
    /// Public base domain (with trailing slash) used to build static asset URLs.
    #[serde(default = "SearchSettings::default_domain")]
    pub domain: String,
    #[serde(default = "SearchSettings::default_max_results")]
    pub max_results: u32,
    #[serde(default, deserialize_with = "deserialize_optional_secret")]
    pub api_key: Option<SecretString>,
}

impl SearchSettings {
    fn default_api_url() -> String {
        "https://www.googleapis.com/books/v1/volumes".to_string()
    }

    fn default_domain() -> String {
        "http://localhost:8080/".to_string()
    }

    fn default_max_results() -> u32 {
        20
    }

    /// Thumbnail shown for catalog results without an image link.
    pub fn default_thumbnail(&self) -> String {
        format!("{}static/img/book-badge.png", self.domain)
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            api_url: Self::default_api_url(),
            domain: Self::default_domain(),
            max_results: Self::default_max_results(),
            api_key: None,
        }
    }
}

/// Chat slash-command settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BotSettings {
    /// Shared secret the chat platform sends with every command.
    #[serde(
        default = "BotSettings::default_verification_token",
        deserialize_with = "deserialize_secret"
    )]
    pub verification_token: SecretString,
    #[serde(default = "BotSettings::default_home_url")]
    pub home_url: String,
    /// Base URL that book ids are appended to for deep links.
    #[serde(default = "BotSettings::default_books_url")]
    pub books_url: String,
    #[serde(default = "BotSettings::default_list_name")]
    pub list_name: String,
}

impl BotSettings {
    fn default_verification_token() -> SecretString {
        String::new().into()
    }

    fn default_home_url() -> String {
        "http://localhost:8080".to_string()
    }

    fn default_books_url() -> String {
        "http://localhost:8080/books/".to_string()
    }

    fn default_list_name() -> String {
        "Reading List".to_string()
    }
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            verification_token: Self::default_verification_token(),
            home_url: Self::default_home_url(),
            books_url: Self::default_books_url(),
            list_name: Self::default_list_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadingListSettings {
    /// JSON file with the books and per-user completions served by the bot.
    #[serde(default = "ReadingListSettings::default_seed_path")]
    pub seed_path: PathBuf,
}

impl ReadingListSettings {
    fn default_seed_path() -> PathBuf {
        PathBuf::from("config/reading_list.json")
    }
}

impl Default for ReadingListSettings {
    fn default() -> Self {
        Self {
            seed_path: Self::default_seed_path(),
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

fn deserialize_optional_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()).map(SecretString::from))
}
