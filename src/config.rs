//! Environment configuration for the storefront pipeline and the payment proxy.
//!
//! Values come from the process environment, after loading `.env` when present.
//! Placeholder values left over from templates (`your-project-id` and the like)
//! are treated as if the variable were unset.

use crate::infrastructure::{firestore, stripe};
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Lowercase substrings that mark a value as an unfilled template.
const PLACEHOLDER_PATTERNS: &[&str] = &["your-", "your_", "changeme", "replace", "placeholder", "xxx", "todo"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Remote document store settings. Present only when a real project id is set.
#[derive(Clone)]
pub struct DocumentStoreConfig {
    pub project_id: String,
    pub api_key: Option<SecretString>,
    pub base_url: String,
}

impl std::fmt::Debug for DocumentStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStoreConfig")
            .field("project_id", &self.project_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Port the payment proxy listens on.
    pub port: u16,
    /// Where the storefront finds the payment proxy.
    pub api_base_url: String,
    pub stripe_secret_key: Option<SecretString>,
    pub stripe_publishable_key: Option<String>,
    pub stripe_api_base: String,
    pub currency: String,
    pub document_store: Option<DocumentStoreConfig>,
    pub fallback_dir: PathBuf,
    pub http_timeout: Duration,
    pub health_check_interval: Duration,
    /// Synthesize payments when the proxy is unreachable.
    pub degraded_payments: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("api_base_url", &self.api_base_url)
            .field("stripe_secret_key", &self.masked_secret_key())
            .field("stripe_publishable_key", &self.stripe_publishable_key)
            .field("stripe_api_base", &self.stripe_api_base)
            .field("currency", &self.currency)
            .field("document_store", &self.document_store)
            .field("fallback_dir", &self.fallback_dir)
            .field("http_timeout", &self.http_timeout)
            .field("health_check_interval", &self.health_check_interval)
            .field("degraded_payments", &self.degraded_payments)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty() && !is_placeholder(v));

        let port = parse_or(&get, "PORT", 3001u16)?;
        let api_base_url = get("API_BASE_URL").unwrap_or_else(|| format!("http://localhost:{port}"));

        let document_store = get("FIREBASE_PROJECT_ID").map(|project_id| DocumentStoreConfig {
            project_id,
            api_key: get("FIREBASE_API_KEY").map(SecretString::from),
            base_url: get("FIRESTORE_BASE_URL").unwrap_or_else(|| firestore::DEFAULT_BASE_URL.to_string()),
        });

        Ok(Self {
            port,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            stripe_secret_key: get("STRIPE_SECRET_KEY").map(SecretString::from),
            stripe_publishable_key: get("STRIPE_PUBLISHABLE_KEY"),
            stripe_api_base: get("STRIPE_API_BASE").unwrap_or_else(|| stripe::DEFAULT_API_BASE.to_string()),
            currency: get("PAYMENT_CURRENCY").unwrap_or_else(|| "usd".to_string()).to_lowercase(),
            document_store,
            fallback_dir: get("FALLBACK_STORAGE_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".storefront")),
            http_timeout: Duration::from_secs(parse_or(&get, "HTTP_TIMEOUT_SECS", 10u64)?),
            health_check_interval: Duration::from_secs(parse_or(&get, "HEALTH_CHECK_INTERVAL_SECS", 300u64)?),
            degraded_payments: parse_bool(&get, "DEGRADED_PAYMENTS", true)?,
        })
    }

    /// Orders go to the remote store only when it has a real project id.
    pub fn uses_document_store(&self) -> bool {
        self.document_store.is_some()
    }

    pub fn masked_secret_key(&self) -> String {
        match &self.stripe_secret_key {
            Some(key) => mask_secret(key.expose_secret()),
            None => "NOT SET".to_string(),
        }
    }

    /// Shared outbound client; every remote call inherits its timeout.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        Ok(reqwest::Client::builder().timeout(self.http_timeout).build()?)
    }
}

pub fn is_placeholder(value: &str) -> bool {
    let lower = value.to_lowercase();
    PLACEHOLDER_PATTERNS.iter().any(|pattern| lower.contains(pattern))
}

/// Keeps the key prefix (`sk_test`) and the last four characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 11 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

fn parse_bool(get: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool, ConfigError> {
    match get(key).map(|v| v.to_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => Err(ConfigError::InvalidEnvVar(key.to_string(), format!("expected a boolean, got '{v}'"))),
    }
}
