//! Environment-driven configuration for the WhatsGPT service.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 3000;
/// Default completion model.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
/// Default OpenAI-compatible API base.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Default WhatsApp bridge endpoint.
pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:3001";
/// Default namespace under which transcripts are stored.
pub const DEFAULT_STORE_NAMESPACE: &str = "links/test";
/// Default pairing wait, in seconds.
const DEFAULT_PAIRING_TIMEOUT_SECS: u64 = 60;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    /// A variable is set but cannot be parsed.
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Why parsing failed.
        reason: String,
    },
    /// URL parse error.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Firebase connection parameters, as handed out by the Firebase console.
#[derive(Clone, Default)]
pub struct FirebaseConfig {
    /// Web API key.
    pub api_key: Option<String>,
    /// Auth domain.
    pub auth_domain: Option<String>,
    /// Realtime Database URL.
    pub database_url: Option<String>,
    /// Project identifier.
    pub project_id: Option<String>,
    /// Storage bucket.
    pub storage_bucket: Option<String>,
    /// Messaging sender id.
    pub messaging_sender_id: Option<String>,
    /// App id.
    pub app_id: Option<String>,
}

impl FirebaseConfig {
    /// Realtime Database URL, falling back to the project's default instance.
    #[must_use]
    pub fn resolved_database_url(&self) -> Option<String> {
        self.database_url.clone().or_else(|| {
            self.project_id
                .as_ref()
                .map(|project| format!("https://{project}-default-rtdb.firebaseio.com"))
        })
    }
}

impl fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("auth_domain", &self.auth_domain)
            .field("database_url", &self.database_url)
            .field("project_id", &self.project_id)
            .field("storage_bucket", &self.storage_bucket)
            .field("messaging_sender_id", &self.messaging_sender_id)
            .field("app_id", &self.app_id)
            .finish()
    }
}

/// Completion service settings.
#[derive(Clone)]
pub struct OpenAiConfig {
    /// Bearer key.
    pub api_key: String,
    /// API base, without trailing `/chat/completions`.
    pub base_url: String,
    /// Model name.
    pub model: String,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Top-level service configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Firebase store settings.
    pub firebase: FirebaseConfig,
    /// Completion settings.
    pub openai: OpenAiConfig,
    /// HTTP listen port.
    pub port: u16,
    /// WhatsApp bridge base URL.
    pub bridge_url: String,
    /// How long the pairing view waits for a code.
    pub pairing_timeout: Duration,
    /// Directory for uploaded contact lists.
    pub upload_dir: PathBuf,
    /// Directory holding the landing page.
    pub static_dir: PathBuf,
    /// Transcript key namespace.
    pub store_namespace: String,
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns an error if a required variable is missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    /// Returns an error if a required variable is missing or malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let firebase = FirebaseConfig {
            api_key: get("API_KEY"),
            auth_domain: get("AUTH_DOMAIN"),
            database_url: get("DATABASE_URL"),
            project_id: get("PROJECT_ID"),
            storage_bucket: get("STORAGE_BUCKET"),
            messaging_sender_id: get("MESSAGING_SENDER_ID"),
            app_id: get("APP_ID"),
        };

        let openai = OpenAiConfig {
            api_key: get("OPEN_AI_KEY").ok_or(ConfigError::Missing("OPEN_AI_KEY"))?,
            base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|err| ConfigError::Invalid {
                name: "PORT",
                reason: format!("{err}"),
            })?,
            None => DEFAULT_PORT,
        };

        let pairing_secs = match get("PAIRING_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|err| ConfigError::Invalid {
                name: "PAIRING_TIMEOUT_SECS",
                reason: format!("{err}"),
            })?,
            None => DEFAULT_PAIRING_TIMEOUT_SECS,
        };

        let config = Self {
            firebase,
            openai,
            port,
            bridge_url: get("WHATSAPP_BRIDGE_URL").unwrap_or_else(|| DEFAULT_BRIDGE_URL.to_string()),
            pairing_timeout: Duration::from_secs(pairing_secs),
            upload_dir: get("UPLOAD_DIR").map_or_else(|| PathBuf::from("uploads"), PathBuf::from),
            static_dir: get("STATIC_DIR").map_or_else(|| PathBuf::from("static"), PathBuf::from),
            store_namespace: get("STORE_NAMESPACE")
                .unwrap_or_else(|| DEFAULT_STORE_NAMESPACE.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pairing_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "PAIRING_TIMEOUT_SECS",
                reason: "must be > 0".to_string(),
            });
        }

        if self.store_namespace.trim_matches('/').is_empty() {
            return Err(ConfigError::Invalid {
                name: "STORE_NAMESPACE",
                reason: "must not be empty".to_string(),
            });
        }

        Url::parse(&self.openai.base_url)?;
        Url::parse(&self.bridge_url)?;
        if let Some(database_url) = self.firebase.resolved_database_url() {
            Url::parse(&database_url)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("OPEN_AI_KEY", "sk-test")])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.openai.model, "gpt-3.5-turbo");
        assert_eq!(config.store_namespace, "links/test");
        assert_eq!(config.pairing_timeout, Duration::from_secs(60));
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert!(config.firebase.resolved_database_url().is_none());
    }

    #[test]
    fn test_missing_openai_key() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "8080")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("OPEN_AI_KEY")));
    }

    #[test]
    fn test_invalid_port() {
        let err = AppConfig::from_lookup(lookup(&[("OPEN_AI_KEY", "k"), ("PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn test_database_url_falls_back_to_project() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OPEN_AI_KEY", "k"),
            ("PROJECT_ID", "whatsgpt-demo"),
        ]))
        .unwrap();
        assert_eq!(
            config.firebase.resolved_database_url().as_deref(),
            Some("https://whatsgpt-demo-default-rtdb.firebaseio.com")
        );
    }

    #[test]
    fn test_zero_pairing_timeout_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("OPEN_AI_KEY", "k"),
            ("PAIRING_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PAIRING_TIMEOUT_SECS", .. }));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OPEN_AI_KEY", "sk-very-secret"),
            ("API_KEY", "firebase-secret"),
        ]))
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-very-secret"));
        assert!(!rendered.contains("firebase-secret"));
    }
}
