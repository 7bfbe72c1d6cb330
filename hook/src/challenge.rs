//! Challenge arguments: which record to publish, in which zone.

use clap::Args;

pub const CHALLENGE_LABEL: &str = "_acme-challenge";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChallengeError {
    #[error("no challenge domain given (use --domain or CERTBOT_DOMAIN)")]
    MissingDomain,

    #[error("no validation value given (use --validation or CERTBOT_VALIDATION)")]
    MissingValidation,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ChallengeArgs {
    /// Domain being validated
    #[arg(long, env = "CERTBOT_DOMAIN")]
    pub domain: Option<String>,

    /// Validation value to publish in the TXT record
    #[arg(long, env = "CERTBOT_VALIDATION")]
    pub validation: Option<String>,

    /// Full TXT record name [default: _acme-challenge.<domain>]
    #[arg(long)]
    pub record_name: Option<String>,

    /// Zone managed by the gateway, when it differs from the domain
    #[arg(long)]
    pub zone: Option<String>,
}

/// A resolved challenge, ready for the gateway client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub zone: String,
    pub record_name: String,
    pub value: String,
}

impl ChallengeArgs {
    pub fn resolve(&self) -> Result<Challenge, ChallengeError> {
        let domain = normalize(self.domain.as_deref()).ok_or(ChallengeError::MissingDomain)?;
        let domain = match domain.strip_prefix("*.") {
            Some(base) => base.to_string(),
            None => domain,
        };
        let value = self
            .validation
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(ChallengeError::MissingValidation)?
            .to_string();

        let record_name = normalize(self.record_name.as_deref())
            .unwrap_or_else(|| format!("{CHALLENGE_LABEL}.{domain}"));
        let zone = normalize(self.zone.as_deref()).unwrap_or(domain);

        Ok(Challenge {
            zone,
            record_name,
            value,
        })
    }
}

/// Lower-case a DNS name and drop the root label's trailing dot.
fn normalize(name: Option<&str>) -> Option<String> {
    let name = name?.trim().trim_end_matches('.');
    (!name.is_empty()).then(|| name.to_ascii_lowercase())
}
