//! Runtime configuration, read from environment variables with development
//! defaults. Command-line `site[=query]` arguments replace the site list.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::extractor::ProfileRegistry;
use crate::runner::Backoff;

/// Environment variable names.
pub const ENV_SITES: &str = "SHELFSCAN_SITES";
pub const ENV_MAX_ATTEMPTS: &str = "SHELFSCAN_MAX_ATTEMPTS";
pub const ENV_RETRY_DELAY_SECS: &str = "SHELFSCAN_RETRY_DELAY_SECS";
pub const ENV_BACKOFF: &str = "SHELFSCAN_BACKOFF";
pub const ENV_SITE_DELAY_SECS: &str = "SHELFSCAN_SITE_DELAY_SECS";
pub const ENV_RENDER_WAIT_SECS: &str = "SHELFSCAN_RENDER_WAIT_SECS";
pub const ENV_OUTPUT_DIR: &str = "SHELFSCAN_OUTPUT_DIR";
pub const ENV_WRITE_JSON: &str = "SHELFSCAN_WRITE_JSON";
pub const ENV_WRITE_CSV: &str = "SHELFSCAN_WRITE_CSV";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_LOG_FORMAT: &str = "SHELFSCAN_LOG_FORMAT";

/// Default development values used when environment variables are absent.
const DEFAULT_SITES: &str = "amazon=mobile phones,flipkart=mobile phones,meesho=saree,sathya=vivo mobile";
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_SECS: u64 = 3;
const DEFAULT_SITE_DELAY_SECS: u64 = 2;
const DEFAULT_RENDER_WAIT_SECS: u64 = 5;
const DEFAULT_OUTPUT_DIR: &str = ".";

/// One site to scrape, with an optional search query overriding the
/// profile's default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSelection {
    pub site: String,
    pub query: Option<String>,
}

impl FromStr for SiteSelection {
    type Err = ConfigError;

    /// `amazon` or `amazon=wireless mouse`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (site, query) = match s.split_once('=') {
            Some((site, query)) => (site, Some(query.trim())),
            None => (s, None),
        };
        let site = site.trim().to_ascii_lowercase();
        if site.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: ENV_SITES,
                reason: format!("empty site key in '{s}'"),
            });
        }
        Ok(Self {
            site,
            query: query.filter(|q| !q.is_empty()).map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Application runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    sites: Vec<SiteSelection>,
    max_attempts: u32,
    retry_delay: Duration,
    backoff: Backoff,
    site_delay: Duration,
    render_wait: Duration,
    output_dir: PathBuf,
    write_json: bool,
    write_csv: bool,
    database_url: Option<String>,
    log_format: LogFormat,
}

impl Config {
    /// Load from environment variables, falling back to development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let sites = parse_sites(&env::var(ENV_SITES).unwrap_or_else(|_| DEFAULT_SITES.to_string()))?;

        let max_attempts: u32 = parse_var(ENV_MAX_ATTEMPTS, DEFAULT_MAX_ATTEMPTS)?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_MAX_ATTEMPTS,
                reason: "must be at least 1".to_string(),
            });
        }

        let log_format = match env::var(ENV_LOG_FORMAT).ok().as_deref().map(str::trim) {
            None | Some("") | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    field: ENV_LOG_FORMAT,
                    reason: format!("expected 'pretty' or 'json', got '{other}'"),
                });
            }
        };

        Ok(Self {
            sites,
            max_attempts,
            retry_delay: Duration::from_secs(parse_var(ENV_RETRY_DELAY_SECS, DEFAULT_RETRY_DELAY_SECS)?),
            backoff: parse_var(ENV_BACKOFF, Backoff::Fixed)?,
            site_delay: Duration::from_secs(parse_var(ENV_SITE_DELAY_SECS, DEFAULT_SITE_DELAY_SECS)?),
            render_wait: Duration::from_secs(parse_var(ENV_RENDER_WAIT_SECS, DEFAULT_RENDER_WAIT_SECS)?),
            output_dir: env::var(ENV_OUTPUT_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            write_json: parse_flag(ENV_WRITE_JSON, true)?,
            write_csv: parse_flag(ENV_WRITE_CSV, true)?,
            database_url: env::var(ENV_DATABASE_URL).ok().filter(|url| !url.trim().is_empty()),
            log_format,
        })
    }

    /// Replace the site list with command-line selections, if any were given.
    pub fn with_site_args<I, S>(mut self, args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selections = args
            .into_iter()
            .map(|arg| arg.as_ref().parse::<SiteSelection>())
            .collect::<Result<Vec<_>, _>>()?;
        if !selections.is_empty() {
            self.sites = selections;
        }
        Ok(self)
    }

    /// Every selected site must have a profile.
    pub fn check_sites(&self, registry: &ProfileRegistry) -> Result<(), ConfigError> {
        for selection in &self.sites {
            if registry.get(&selection.site).is_err() {
                return Err(ConfigError::UnknownSite {
                    key: selection.site.clone(),
                    available: registry.keys().join(", "),
                });
            }
        }
        Ok(())
    }

    pub fn sites(&self) -> &[SiteSelection] {
        &self.sites
    }
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }
    pub fn backoff(&self) -> Backoff {
        self.backoff
    }
    /// Pause between two sites.
    pub fn site_delay(&self) -> Duration {
        self.site_delay
    }
    pub fn render_wait(&self) -> Duration {
        self.render_wait
    }
    /// Directory for the JSON and CSV exports.
    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }
    pub fn write_json(&self) -> bool {
        self.write_json
    }
    pub fn write_csv(&self) -> bool {
        self.write_csv
    }
    /// PostgreSQL URL; the database sink is skipped when unset.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

fn parse_sites(raw: &str) -> Result<Vec<SiteSelection>, ConfigError> {
    let sites = raw
        .split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(str::parse)
        .collect::<Result<Vec<SiteSelection>, _>>()?;
    if sites.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: ENV_SITES,
            reason: "no sites selected".to_string(),
        });
    }
    Ok(sites)
}

fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    field: name,
                    reason: e.to_string(),
                })
        }
        _ => Ok(default),
    }
}

fn parse_flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name).ok().map(|raw| raw.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::InvalidValue {
            field: name,
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
    UnknownSite { key: String, available: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
            ConfigError::UnknownSite { key, available } => {
                write!(f, "unknown site '{}'; available: {}", key, available)
            }
        }
    }
}

impl Error for ConfigError {}
