//! Layered configuration
//!
//! Precedence, lowest first: built-in defaults, the TOML config file,
//! `CONGRESS_CONTROL_*` environment variables, then command-line flags
//! (applied by the caller through [`Overrides`]).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::models::Chamber;
use crate::scraping::fetcher::{default_user_agent, FetchOptions, MAX_ATTEMPTS};
use crate::scraping::RuleSet;

pub const DEFAULT_HOUSE_URL: &str = "https://clerk.house.gov/";
pub const DEFAULT_SENATE_URL: &str = "https://www.senate.gov/senators/";
pub const DEFAULT_OUTPUT: &str = "congress-control.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
const MAX_TIMEOUT_SECS: u64 = 300;

const ENV_CONFIG: &str = "CONGRESS_CONTROL_CONFIG";
const ENV_HOUSE_URL: &str = "CONGRESS_CONTROL_HOUSE_URL";
const ENV_SENATE_URL: &str = "CONGRESS_CONTROL_SENATE_URL";
const ENV_OUTPUT: &str = "CONGRESS_CONTROL_OUTPUT";
const ENV_TIMEOUT: &str = "CONGRESS_CONTROL_TIMEOUT_SECS";

/// Source page and extraction rules for one chamber
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChamberConfig {
    pub url: String,
    pub rules: RuleSet,
}

impl ChamberConfig {
    pub fn default_for(chamber: Chamber) -> Self {
        let url = match chamber {
            Chamber::House => DEFAULT_HOUSE_URL,
            Chamber::Senate => DEFAULT_SENATE_URL,
        };
        Self {
            url: url.to_string(),
            rules: RuleSet::default_for(chamber),
        }
    }
}

/// Fully resolved settings for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub output: PathBuf,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub user_agent: String,
    /// Treat a seat-total mismatch as fatal
    pub strict_totals: bool,
    pub house: ChamberConfig,
    pub senate: ChamberConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_attempts: 1,
            user_agent: default_user_agent(),
            strict_totals: false,
            house: ChamberConfig::default_for(Chamber::House),
            senate: ChamberConfig::default_for(Chamber::Senate),
        }
    }
}

/// On-disk config; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    output: Option<PathBuf>,
    timeout_secs: Option<u64>,
    max_attempts: Option<u32>,
    user_agent: Option<String>,
    strict_totals: Option<bool>,
    house: Option<ChamberFile>,
    senate: Option<ChamberFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChamberFile {
    url: Option<String>,
    rules: Option<RuleSet>,
}

/// Command-line overrides, highest precedence
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub house_url: Option<String>,
    pub senate_url: Option<String>,
    pub output: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub strict_totals: bool,
}

impl Config {
    /// Resolve configuration from every layer and validate the result
    pub fn load(explicit_path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(path) = config_file_path(explicit_path) {
            debug!("Loading config from {}", path.display());
            let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            config.apply_toml(&path, &raw)?;
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_toml(Path::new("<inline>"), raw)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_toml(&mut self, path: &Path, raw: &str) -> Result<(), ConfigError> {
        let file: ConfigFile = toml::from_str(raw).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(output) = file.output {
            self.output = output;
        }
        if let Some(timeout) = file.timeout_secs {
            self.timeout_secs = timeout;
        }
        if let Some(attempts) = file.max_attempts {
            self.max_attempts = attempts;
        }
        if let Some(user_agent) = file.user_agent {
            self.user_agent = user_agent;
        }
        if let Some(strict) = file.strict_totals {
            self.strict_totals = strict;
        }
        for (target, chamber) in [(&mut self.house, file.house), (&mut self.senate, file.senate)] {
            let Some(chamber) = chamber else { continue };
            if let Some(url) = chamber.url {
                target.url = url;
            }
            if let Some(rules) = chamber.rules {
                target.rules = rules;
            }
        }
        Ok(())
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(url) = var(ENV_HOUSE_URL) {
            self.house.url = url;
        }
        if let Some(url) = var(ENV_SENATE_URL) {
            self.senate.url = url;
        }
        if let Some(output) = var(ENV_OUTPUT) {
            self.output = PathBuf::from(output);
        }
        if let Some(timeout) = var(ENV_TIMEOUT) {
            self.timeout_secs = timeout.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{} must be a whole number of seconds", ENV_TIMEOUT))
            })?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(url) = &overrides.house_url {
            self.house.url = url.clone();
        }
        if let Some(url) = &overrides.senate_url {
            self.senate.url = url.clone();
        }
        if let Some(output) = &overrides.output {
            self.output = output.clone();
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.timeout_secs = timeout;
        }
        if overrides.strict_totals {
            self.strict_totals = true;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_TIMEOUT_SECS).contains(&self.timeout_secs) {
            return Err(ConfigError::Invalid(format!(
                "timeout must be between 1 and {} seconds, got {}",
                MAX_TIMEOUT_SECS, self.timeout_secs
            )));
        }
        if !(1..=MAX_ATTEMPTS).contains(&self.max_attempts) {
            return Err(ConfigError::Invalid(format!(
                "max_attempts must be between 1 and {}, got {}",
                MAX_ATTEMPTS, self.max_attempts
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("user_agent must not be empty".to_string()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output path must not be empty".to_string()));
        }
        for chamber in Chamber::ALL {
            let cfg = self.chamber(chamber);
            if cfg.url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} url must not be empty", chamber)));
            }
            cfg.rules.validate(chamber).map_err(ConfigError::Invalid)?;
        }
        Ok(())
    }

    pub fn chamber(&self, chamber: Chamber) -> &ChamberConfig {
        match chamber {
            Chamber::House => &self.house,
            Chamber::Senate => &self.senate,
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_attempts: self.max_attempts,
            ..Default::default()
        }
    }
}

/// Explicit path, then `$CONGRESS_CONTROL_CONFIG`, then the user config dir if the file exists
fn config_file_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(ENV_CONFIG) {
        return Some(PathBuf::from(path));
    }
    let path = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(dir_spec::config_home)?
        .join("congress-control")
        .join("config.toml");
    path.exists().then_some(path)
}
