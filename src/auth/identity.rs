use async_trait::async_trait;
use serde::Deserialize;

use crate::config::IdentityConfig;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The provider answered but refused the session id.
    #[error("identity provider rejected the session (status {0})")]
    Rejected(u16),

    #[error("identity provider sent an unusable reply: {0}")]
    Malformed(String),

    #[error("identity provider unreachable: {0}")]
    Unavailable(#[from] reqwest::Error),
}

/// The account facts an external login hands back.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExternalIdentity {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Exchanges a third-party session id for the identity behind it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn exchange(&self, session_id: &str) -> Result<ExternalIdentity, IdentityError>;
}

pub struct HttpIdentityProvider {
    http: reqwest::Client,
    url: String,
}

impl HttpIdentityProvider {
    pub fn new(http: reqwest::Client, config: &IdentityConfig) -> Self {
        Self {
            http,
            url: config.session_data_url.clone(),
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn exchange(&self, session_id: &str) -> Result<ExternalIdentity, IdentityError> {
        let response = self
            .http
            .get(&self.url)
            .header("X-Session-ID", session_id)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::Rejected(status.as_u16()));
        }

        let body = response.text().await?;
        let identity: ExternalIdentity =
            serde_json::from_str(&body).map_err(|e| IdentityError::Malformed(e.to_string()))?;
        if identity.email.trim().is_empty() {
            return Err(IdentityError::Malformed("empty email".into()));
        }
        Ok(identity)
    }
}
