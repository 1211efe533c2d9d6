use serde::Deserialize;
use url::Url;

pub const ENV_ENDPOINT: &str = "LABSITE_CONTENT_ENDPOINT";
pub const ENV_TOKEN: &str = "LABSITE_CONTENT_TOKEN";
pub const ENV_ASSET_BASE_PATH: &str = "LABSITE_ASSET_BASE_PATH";
pub const ENV_PLACEHOLDER_IMAGE: &str = "LABSITE_PLACEHOLDER_IMAGE";
pub const ENV_CACHE_DATABASE: &str = "LABSITE_CACHE_DATABASE";
pub const ENV_TIMEOUT_SECS: &str = "LABSITE_TIMEOUT_SECS";

const PLACEHOLDER_IMAGE_PATH: &str = "/images/placeholder.png";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(url::ParseError),
    #[error("Invalid request timeout: {0}")]
    InvalidTimeout(std::num::ParseIntError),
    #[error("Failed to parse YAML config: {0}")]
    ParseYaml(serde_yaml::Error),
}

fn default_cache_database() -> String {
    "sqlite://labsite-cache.db?mode=rwc".into()
}

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    /// Entries endpoint of the content API, queried with `content_type=…`.
    pub endpoint: Url,
    pub token: String,
    /// Prefix for static assets served by the site itself.
    #[serde(default)]
    pub asset_base_path: String,
    #[serde(default)]
    pub placeholder_image: Option<String>,
    #[serde(default = "default_cache_database")]
    pub cache_database: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn from_yaml(src: &str) -> Result<Self, Error> {
        serde_yaml::from_str(src).map_err(Error::ParseYaml)
    }

    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let endpoint = lookup(ENV_ENDPOINT).ok_or(Error::MissingEnv(ENV_ENDPOINT))?;
        Ok(Self {
            endpoint: Url::parse(&endpoint).map_err(Error::InvalidEndpoint)?,
            token: lookup(ENV_TOKEN).ok_or(Error::MissingEnv(ENV_TOKEN))?,
            asset_base_path: lookup(ENV_ASSET_BASE_PATH).unwrap_or_default(),
            placeholder_image: lookup(ENV_PLACEHOLDER_IMAGE),
            cache_database: lookup(ENV_CACHE_DATABASE).unwrap_or_else(default_cache_database),
            timeout_secs: lookup(ENV_TIMEOUT_SECS)
                .map(|secs| secs.trim().parse().map_err(Error::InvalidTimeout))
                .transpose()?,
        })
    }

    /// Image shown wherever an asset reference cannot be resolved.
    pub fn placeholder_image(&self) -> String {
        match &self.placeholder_image {
            Some(url) => url.clone(),
            None => format!(
                "{}{PLACEHOLDER_IMAGE_PATH}",
                self.asset_base_path.trim_end_matches('/')
            ),
        }
    }
}
