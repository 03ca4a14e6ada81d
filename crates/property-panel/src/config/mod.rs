use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const DEFAULT_GEOCODER_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const DEFAULT_CENSUS_URL: &str = "https://api.census.gov/data";
const DEFAULT_CENSUS_YEAR: u16 = 2022;
const DEFAULT_PRIMARY_URL: &str = "https://api.rentcast.io/v1";
const DEFAULT_COUNTY_URL: &str = "https://app.realie.ai/api/public";
const DEFAULT_TIMEOUT_SECS: u64 = 20;

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub providers: ProvidersConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = LogFormat::from_str(&env::var("APP_LOG_FORMAT").unwrap_or_default());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            providers: ProvidersConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Compact
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct GeocoderSettings {
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct CensusSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub year: u16,
}

/// Credentials and endpoint for one property-records provider. A missing key
/// disables the provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl ProviderSettings {
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Upstream endpoints, credentials, and the shared request timeout.
#[derive(Debug, Clone)]
pub struct ProvidersConfig {
    pub geocoder: GeocoderSettings,
    pub census: CensusSettings,
    pub primary: ProviderSettings,
    pub county: ProviderSettings,
    pub request_timeout: Duration,
}

impl ProvidersConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs = match non_empty_var("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout)?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let census_year = match non_empty_var("CENSUS_YEAR") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidCensusYear)?,
            None => DEFAULT_CENSUS_YEAR,
        };

        Ok(Self {
            geocoder: GeocoderSettings {
                api_key: non_empty_var("GEOCODER_API_KEY"),
                base_url: url_var("GEOCODER_BASE_URL", DEFAULT_GEOCODER_URL),
            },
            census: CensusSettings {
                api_key: non_empty_var("CENSUS_API_KEY"),
                base_url: url_var("CENSUS_BASE_URL", DEFAULT_CENSUS_URL),
                year: census_year,
            },
            primary: ProviderSettings {
                api_key: non_empty_var("PRIMARY_PROVIDER_API_KEY"),
                base_url: url_var("PRIMARY_PROVIDER_BASE_URL", DEFAULT_PRIMARY_URL),
            },
            county: ProviderSettings {
                api_key: non_empty_var("COUNTY_PROVIDER_API_KEY"),
                base_url: url_var("COUNTY_PROVIDER_BASE_URL", DEFAULT_COUNTY_URL),
            },
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn url_var(name: &str, default: &str) -> String {
    non_empty_var(name).unwrap_or_else(|| default.to_string())
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimeout,
    InvalidCensusYear,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "UPSTREAM_TIMEOUT_SECS must be a positive number of seconds")
            }
            ConfigError::InvalidCensusYear => write!(f, "CENSUS_YEAR must be a four-digit year"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTimeout
            | ConfigError::InvalidCensusYear => None,
        }
    }
}
