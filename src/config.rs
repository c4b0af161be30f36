//! Runtime configuration pulled from `BIOLINK_*` environment variables.
//!
//! Binaries start from [`ResolverConfig::from_env`] and then apply their
//! command-line overrides, so the environment acts as the default layer.

use crate::catalog::CatalogSource;
use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LOOKUP_URL: &str = "https://bl-lookup-sri.renci.org/bl";
pub const DEFAULT_BIOLINK_VERSION: &str = "latest";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const CATALOG_ENV: &str = "BIOLINK_CATALOG";
pub const LOOKUP_URL_ENV: &str = "BIOLINK_LOOKUP_URL";
pub const VERSION_ENV: &str = "BIOLINK_VERSION";
pub const TIMEOUT_ENV: &str = "BIOLINK_LOOKUP_TIMEOUT_SECS";
pub const ONTOLOGY_FILE_ENV: &str = "BIOLINK_ONTOLOGY_FILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Where to load the capability catalog from.
    pub catalog: Option<CatalogSource>,
    /// Base URL of the Biolink lookup service.
    pub lookup_url: String,
    pub biolink_version: String,
    pub lookup_timeout: Duration,
    /// Answer ontology questions from a local term table instead of HTTP.
    pub ontology_file: Option<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            biolink_version: DEFAULT_BIOLINK_VERSION.to_string(),
            lookup_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            ontology_file: None,
        }
    }
}

impl ResolverConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = ResolverConfig::default();

        if let Some(raw) = get(CATALOG_ENV) {
            config.catalog = Some(CatalogSource::parse(&raw));
        }
        if let Some(url) = get(LOOKUP_URL_ENV) {
            config.lookup_url = url.trim().to_string();
        }
        if let Some(version) = get(VERSION_ENV) {
            config.biolink_version = version.trim().to_string();
        }
        if let Some(raw) = get(TIMEOUT_ENV) {
            config.lookup_timeout = parse_timeout(&raw)
                .with_context(|| format!("invalid {TIMEOUT_ENV}"))?;
        }
        if let Some(path) = get(ONTOLOGY_FILE_ENV) {
            config.ontology_file = Some(PathBuf::from(path.trim()));
        }
        Ok(config)
    }
}

/// Parse a positive whole number of seconds.
pub fn parse_timeout(raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("'{raw}' is not a whole number of seconds"))?;
    if secs == 0 {
        bail!("timeout must be at least one second");
    }
    Ok(Duration::from_secs(secs))
}
