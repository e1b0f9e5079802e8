//! Client construction options.
//!
//! Options can be built in code or loaded from an optional
//! `proxycrawl.toml` plus `PROXYCRAWL_*` environment variables. Loading does
//! not check the token; `ApiClient::new` does.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Public API origin used when no base URL is configured.
pub const PUBLIC_API_URL: &str = "https://api.proxycrawl.com/";

/// Options accepted by `ApiClient::new`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientOptions {
    #[serde(default)]
    pub token: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default)]
    pub base_path: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub debug: bool,

    /// Also asks the transport for wire-level logging.
    #[serde(default)]
    pub advanced_debug: bool,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_api_base_url() -> String {
    PUBLIC_API_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base_url: default_api_base_url(),
            base_path: String::new(),
            timeout_secs: default_timeout_secs(),
            debug: false,
            advanced_debug: false,
        }
    }
}

impl ClientOptions {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = path.into();
        self
    }

    /// Load options from `proxycrawl.toml` (optional) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("proxycrawl")
    }

    /// Like `load`, reading the file named `name` (extension optional).
    pub fn load_from(name: &str) -> Result<Self, ConfigError> {
        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name(name)
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("PROXYCRAWL").try_parsing(true))
            .build()?;

        Ok(cfg.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_public_api() {
        let options = ClientOptions::new("T1");
        assert_eq!(options.token, "T1");
        assert_eq!(options.api_base_url, "https://api.proxycrawl.com/");
        assert_eq!(options.base_path, "");
        assert_eq!(options.timeout_secs, 120);
        assert!(!options.debug);
        assert!(!options.advanced_debug);
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let options: ClientOptions = serde_json::from_str(r#"{"token":"abc","base_path":"scraper"}"#).unwrap();
        assert_eq!(options.token, "abc");
        assert_eq!(options.base_path, "scraper");
        assert_eq!(options.api_base_url, PUBLIC_API_URL);
        assert_eq!(options.timeout_secs, 120);
    }

    #[test]
    fn builder_overrides() {
        let options = ClientOptions::new("T1")
            .with_api_base_url("https://api.example.com/")
            .with_base_path("info");
        assert_eq!(options.api_base_url, "https://api.example.com/");
        assert_eq!(options.base_path, "info");
    }

    #[test]
    #[serial_test::serial]
    fn load_from_missing_file_uses_defaults() {
        let options = ClientOptions::load_from("does-not-exist-proxycrawl-options").unwrap();
        assert_eq!(options.api_base_url, PUBLIC_API_URL);
        assert_eq!(options.timeout_secs, 120);
    }

    #[test]
    #[serial_test::serial]
    fn load_reads_prefixed_environment() {
        std::env::set_var("PROXYCRAWL_TOKEN", "env-token");
        std::env::set_var("PROXYCRAWL_BASE_PATH", "leads");
        std::env::set_var("PROXYCRAWL_TIMEOUT_SECS", "30");

        let loaded = ClientOptions::load_from("does-not-exist-proxycrawl-options");

        std::env::remove_var("PROXYCRAWL_TOKEN");
        std::env::remove_var("PROXYCRAWL_BASE_PATH");
        std::env::remove_var("PROXYCRAWL_TIMEOUT_SECS");

        let options = loaded.unwrap();
        assert_eq!(options.token, "env-token");
        assert_eq!(options.base_path, "leads");
        assert_eq!(options.timeout_secs, 30);
        assert_eq!(options.api_base_url, PUBLIC_API_URL);
    }
}
