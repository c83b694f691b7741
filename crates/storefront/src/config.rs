//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (`https://` enables secure cookies)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_CONTENT_DIR` - Listing markdown (default: crates/storefront/content)
//! - `STOREFRONT_STATIC_DIR` - Static assets (default: crates/storefront/static)
//! - `CONTACT_FORM_ENDPOINT` - Form backend URL (default: Formspree form)
//! - `CONTACT_WHATSAPP_PHONE` - WhatsApp number, digits only (default: 34641607924)
//! - `MAP_TILE_URL` - Tile URL template (default: OpenStreetMap)
//! - `MAP_TILE_ATTRIBUTION` - Tile attribution HTML
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0..=1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0..=1.0 (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

const DEFAULT_CONTACT_ENDPOINT: &str = "https://formspree.io/f/xdalkbod";
const DEFAULT_WHATSAPP_PHONE: &str = "34641607924";
const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const DEFAULT_TILE_ATTRIBUTION: &str =
    r#"&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors"#;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Directory holding `tickets/` and `merch/` markdown files
    pub content_dir: PathBuf,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    pub contact: ContactConfig,
    pub map: MapConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// Contact form delivery settings.
#[derive(Debug, Clone)]
pub struct ContactConfig {
    /// Third-party form backend receiving the JSON payload
    pub endpoint: Url,
    /// Number used for the WhatsApp fallback link
    pub whatsapp_phone: String,
}

/// Venue map settings.
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Leaflet-style tile template with `{s}`, `{z}`, `{x}`, `{y}` placeholders
    pub tile_url: String,
    pub tile_attribution: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let host = env
            .or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| invalid("STOREFRONT_HOST", e))?;
        let port = env
            .or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| invalid("STOREFRONT_PORT", e))?;
        let base_url = env.required("STOREFRONT_BASE_URL")?;
        Url::parse(&base_url).map_err(|e| invalid("STOREFRONT_BASE_URL", e))?;

        let contact = ContactConfig {
            endpoint: parse_http_url(
                "CONTACT_FORM_ENDPOINT",
                &env.or_default("CONTACT_FORM_ENDPOINT", DEFAULT_CONTACT_ENDPOINT),
            )?,
            whatsapp_phone: parse_phone(
                &env.or_default("CONTACT_WHATSAPP_PHONE", DEFAULT_WHATSAPP_PHONE),
            )?,
        };

        let map = MapConfig {
            tile_url: env.or_default("MAP_TILE_URL", DEFAULT_TILE_URL),
            tile_attribution: env.or_default("MAP_TILE_ATTRIBUTION", DEFAULT_TILE_ATTRIBUTION),
        };

        Ok(Self {
            host,
            port,
            base_url,
            content_dir: env
                .or_default("STOREFRONT_CONTENT_DIR", "crates/storefront/content")
                .into(),
            static_dir: env
                .or_default("STOREFRONT_STATIC_DIR", "crates/storefront/static")
                .into(),
            contact,
            map,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_rate(
                "SENTRY_SAMPLE_RATE",
                env.optional("SENTRY_SAMPLE_RATE").as_deref(),
                1.0,
            )?,
            sentry_traces_sample_rate: parse_rate(
                "SENTRY_TRACES_SAMPLE_RATE",
                env.optional("SENTRY_TRACES_SAMPLE_RATE").as_deref(),
                0.0,
            )?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

fn invalid(key: &str, err: impl ToString) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_string(), err.to_string())
}

/// Parse a URL and require an http(s) scheme.
fn parse_http_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| invalid(key, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(key, format!("unsupported scheme {}", url.scheme())));
    }
    Ok(url)
}

/// WhatsApp links take the number in international format without `+`.
fn parse_phone(raw: &str) -> Result<String, ConfigError> {
    let phone = raw.trim().trim_start_matches('+');
    if phone.is_empty() || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("CONTACT_WHATSAPP_PHONE", "must contain digits only"));
    }
    Ok(phone.to_string())
}

fn parse_rate(key: &str, raw: Option<&str>, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let rate = raw.trim().parse::<f32>().map_err(|e| invalid(key, e))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(invalid(key, "must be between 0.0 and 1.0"));
    }
    Ok(rate)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("STOREFRONT_BASE_URL", "http://localhost:3000")]).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(
            config.contact.endpoint.as_str(),
            "https://formspree.io/f/xdalkbod"
        );
        assert_eq!(config.contact.whatsapp_phone, "34641607924");
        assert!(config.map.tile_url.contains("tile.openstreetmap.org"));
        assert!(!config.is_secure());
        assert!(config.sentry_dsn.is_none());
        assert!((config.sentry_sample_rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_base_url() {
        assert!(matches!(
            load(&[]),
            Err(ConfigError::MissingEnvVar(key)) if key == "STOREFRONT_BASE_URL"
        ));
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[
            ("STOREFRONT_BASE_URL", "http://localhost:3000"),
            ("STOREFRONT_PORT", "not-a-port"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_contact_endpoint_must_be_http() {
        let err = load(&[
            ("STOREFRONT_BASE_URL", "https://tickets.example.com"),
            ("CONTACT_FORM_ENDPOINT", "ftp://forms.example.com/f/1"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "CONTACT_FORM_ENDPOINT"));
    }

    #[test]
    fn test_phone_normalization() {
        let config = load(&[
            ("STOREFRONT_BASE_URL", "https://tickets.example.com"),
            ("CONTACT_WHATSAPP_PHONE", "+34600111222"),
        ])
        .unwrap();
        assert_eq!(config.contact.whatsapp_phone, "34600111222");
        assert!(config.is_secure());

        assert!(
            load(&[
                ("STOREFRONT_BASE_URL", "https://tickets.example.com"),
                ("CONTACT_WHATSAPP_PHONE", "600 111 222"),
            ])
            .is_err()
        );
    }

    #[test]
    fn test_sample_rate_bounds() {
        let err = load(&[
            ("STOREFRONT_BASE_URL", "http://localhost:3000"),
            ("SENTRY_TRACES_SAMPLE_RATE", "1.5"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "SENTRY_TRACES_SAMPLE_RATE"));
    }
}
