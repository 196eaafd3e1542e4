use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use url::Url;

const CLIENT_SECRET_POINTER: &str = "/result/client_secret/value";

/// Ephemeral key authorizing one signaling exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    ephemeral_key: String,
}

impl Credential {
    #[must_use]
    pub fn new(ephemeral_key: impl Into<String>) -> Self {
        Self { ephemeral_key: ephemeral_key.into() }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.ephemeral_key
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential").field("ephemeral_key", &"<redacted>").finish()
    }
}

/// Key for the financial data provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Source of the secrets a session needs.
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    /// Mint an ephemeral credential for the next signaling exchange.
    async fn session_credential(&self) -> Result<Credential>;

    /// Fetch the data-provider API key.
    async fn api_key(&self) -> Result<ApiKey>;
}

#[derive(Debug, Deserialize)]
struct ApiKeysResponse {
    #[serde(rename = "rapidApiKey")]
    rapid_api_key: String,
}

/// Broker backed by the page's own backend (`GET /session`, `GET /api-keys`).
#[derive(Clone, Debug)]
pub struct HttpCredentialBroker {
    client: Client,
    base: Url,
}

impl HttpCredentialBroker {
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    #[allow(clippy::result_large_err)]
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base: Url::parse(base_url)? })
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.base.join(path)?;
        let res = self.client.get(url).send().await?.error_for_status()?;
        Ok(res.json().await?)
    }
}

#[async_trait]
impl CredentialBroker for HttpCredentialBroker {
    async fn session_credential(&self) -> Result<Credential> {
        let body = self.get_json("/session").await?;
        parse_session_credential(&body)
    }

    async fn api_key(&self) -> Result<ApiKey> {
        let body = self.get_json("/api-keys").await?;
        let keys: ApiKeysResponse = serde_json::from_value(body)?;
        Ok(ApiKey::new(keys.rapid_api_key))
    }
}

#[allow(clippy::result_large_err)]
fn parse_session_credential(body: &Value) -> Result<Credential> {
    body.pointer(CLIENT_SECRET_POINTER)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(Credential::new)
        .ok_or_else(|| Error::Credential("missing result.client_secret.value".to_string()))
}
