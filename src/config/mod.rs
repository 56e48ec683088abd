use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::workflows::codal::client::HttpSettings;
use crate::workflows::codal::{
    LetterCode, LetterCodeTaxonomy, ReconciliationConfig, TaxonomyError,
};

const DEFAULT_API_URL: &str = "https://search.codal.ir/api/search/v2/q";
const DEFAULT_BASE_URL: &str = "https://codal.ir/";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
const DEFAULT_WATCHED_CODE: &str = "ن-۵۶";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the watcher.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub codal: CodalConfig,
    pub render: RenderConfig,
    pub watch: WatchConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let api_url = parse_url("CODAL_API_URL", DEFAULT_API_URL)?;
        let base_url = parse_url("CODAL_BASE_URL", DEFAULT_BASE_URL)?;
        let user_agent =
            env::var("CODAL_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
        let timeout_secs = parse_secs("CODAL_HTTP_TIMEOUT_SECS", 30)?;

        let taxonomy = load_taxonomy()?;
        let watched_code = env::var("CODAL_WATCH_LETTER_CODE")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(|value| LetterCode::from(value.as_str()))
            .unwrap_or_else(|| LetterCode::from(DEFAULT_WATCHED_CODE));

        let poppler_path = env::var("CODAL_POPPLER_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let poll_interval = parse_secs("CODAL_POLL_INTERVAL_SECS", 60)?;
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            codal: CodalConfig {
                api_url,
                base_url,
                user_agent,
                timeout: Duration::from_secs(timeout_secs),
                taxonomy,
                watched_code,
            },
            render: RenderConfig { poppler_path },
            watch: WatchConfig {
                poll_interval: Duration::from_secs(poll_interval),
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Search API endpoint and reconciliation rules.
#[derive(Debug, Clone)]
pub struct CodalConfig {
    pub api_url: Url,
    pub base_url: Url,
    pub user_agent: String,
    pub timeout: Duration,
    pub taxonomy: LetterCodeTaxonomy,
    pub watched_code: LetterCode,
}

impl CodalConfig {
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            api_url: self.api_url.clone(),
            base_url: self.base_url.clone(),
            user_agent: self.user_agent.clone(),
            timeout: self.timeout,
        }
    }

    pub fn reconciliation(&self) -> ReconciliationConfig {
        ReconciliationConfig::new(self.taxonomy.clone(), self.watched_code.clone())
    }
}

/// Location of the poppler tools used to rasterize PDFs.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub poppler_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub poll_interval: Duration,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

fn parse_url(key: &'static str, default: &str) -> Result<Url, ConfigError> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { key, source })
}

fn parse_secs(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::InvalidSeconds { key }),
        },
        Err(_) => Ok(default),
    }
}

fn parse_codes(raw: &str) -> Vec<LetterCode> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(LetterCode::from)
        .collect()
}

fn load_taxonomy() -> Result<LetterCodeTaxonomy, ConfigError> {
    let codes = env::var("CODAL_LETTER_CODES").ok();
    let exempt = env::var("CODAL_EXEMPT_CODES").ok();
    if codes.is_none() && exempt.is_none() {
        return Ok(LetterCodeTaxonomy::standard());
    }

    let standard = LetterCodeTaxonomy::standard();
    let codes = match codes {
        Some(raw) => parse_codes(&raw),
        None => standard.codes().to_vec(),
    };
    let exempt = match exempt {
        Some(raw) => parse_codes(&raw),
        None => standard
            .codes()
            .iter()
            .filter(|code| standard.is_exempt(code))
            .cloned()
            .collect(),
    };

    LetterCodeTaxonomy::new(codes, exempt).map_err(ConfigError::Taxonomy)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidUrl {
        key: &'static str,
        source: url::ParseError,
    },
    InvalidSeconds {
        key: &'static str,
    },
    Taxonomy(TaxonomyError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidUrl { key, .. } => write!(f, "{key} must be an absolute URL"),
            ConfigError::InvalidSeconds { key } => {
                write!(f, "{key} must be a positive number of seconds")
            }
            ConfigError::Taxonomy(err) => write!(f, "invalid letter-code configuration: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidUrl { source, .. } => Some(source),
            ConfigError::InvalidSeconds { .. } => None,
            ConfigError::Taxonomy(err) => Some(err),
        }
    }
}
