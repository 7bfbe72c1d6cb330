//! Hook configuration.
//!
//! Values are layered: built-in defaults, then the YAML file, then
//! `SCHLUND_`-prefixed environment variables (`SCHLUND_PASSWORD`,
//! `SCHLUND_TTL`, ...). A missing file is not an error.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use schlund_core::{Credentials, GatewayClient, UreqTransport, GATEWAY_URL};
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/schlund-hook/config.yaml";
pub const ENV_PREFIX: &str = "SCHLUND_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to load configuration: {0}")]
    Load(#[from] figment::Error),

    #[error("missing gateway credential `{0}` (set it in the config file or SCHLUND_{upper})", upper = .0.to_ascii_uppercase())]
    MissingCredential(&'static str),
}

#[derive(Clone, Serialize, Deserialize)]
pub struct HookConfig {
    #[serde(default, deserialize_with = "text", skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, deserialize_with = "text", skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "text", skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub ttl: u32,
    pub propagation_seconds: u64,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            user: None,
            password: None,
            context: None,
            ttl: 60,
            propagation_seconds: 30,
            endpoint: GATEWAY_URL.to_string(),
            timeout_secs: None,
        }
    }
}

impl fmt::Debug for HookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookConfig")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("context", &self.context)
            .field("ttl", &self.ttl)
            .field("propagation_seconds", &self.propagation_seconds)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl HookConfig {
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(HookConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::figment(path).extract()?)
    }

    /// Gateway credentials; empty values count as missing.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        fn required<'a>(value: &'a Option<String>, key: &'static str) -> Result<&'a str, ConfigError> {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingCredential(key))
        }
        Ok(Credentials::new(
            required(&self.user, "user")?,
            required(&self.password, "password")?,
            required(&self.context, "context")?,
        ))
    }

    pub fn client(&self) -> Result<GatewayClient, ConfigError> {
        let client = GatewayClient::new(self.credentials()?, self.ttl).with_endpoint(&self.endpoint);
        Ok(match self.timeout_secs {
            Some(secs) => client.with_transport(UreqTransport::with_timeout(Duration::from_secs(secs))),
            None => client,
        })
    }
}

/// Accept numbers where text is expected. Customer ids and contexts are
/// numeric, and both YAML and the environment provider parse them as such.
fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        String(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(Option::<Text>::deserialize(deserializer)?.map(|t| match t {
        Text::String(s) => s,
        Text::Unsigned(n) => n.to_string(),
        Text::Signed(n) => n.to_string(),
    }))
}
