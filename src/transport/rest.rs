use reqwest::{Client, header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE}};
use crate::error::{Error, Result};
use crate::transport::backend::Credential;
use crate::transport::peer::SessionDescription;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const SDP_MIME: &str = "application/sdp";

/// Offer/answer exchange with the realtime RTC endpoint.
#[derive(Clone, Debug)]
pub struct SignalingClient {
    client: Client,
    endpoint: Url,
}

impl SignalingClient {
    /// Create a client posting offers to `{base_url}?model={model}`.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    #[allow(clippy::result_large_err)]
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        Self::new_with_timeouts(base_url, model, DEFAULT_TIMEOUT, DEFAULT_POOL_IDLE_TIMEOUT)
    }

    /// Create a client with custom timeouts.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    #[allow(clippy::result_large_err)]
    pub fn new_with_timeouts(
        base_url: &str,
        model: &str,
        timeout: Duration,
        pool_idle_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(pool_idle_timeout)
            .build()?;

        let mut endpoint = Url::parse(base_url)?;
        endpoint.query_pairs_mut().append_pair("model", model);

        Ok(Self { client, endpoint })
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Post the local offer and return the remote answer.
    ///
    /// # Errors
    /// Returns an error if the request fails or the endpoint answers with a non-success status.
    pub async fn exchange(&self, offer: &SessionDescription, credential: &Credential) -> Result<SessionDescription> {
        let auth_header = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))?;

        let res = self.client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, auth_header)
            .header(CONTENT_TYPE, SDP_MIME)
            .body(offer.sdp.clone())
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(Error::Signaling { status: status.as_u16(), body });
        }

        tracing::debug!(bytes = body.len(), "Received SDP answer");
        Ok(SessionDescription::answer(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_carries_model_query() {
        let client = SignalingClient::new("https://example.test/v1/realtimertc", "gpt-4o-mini-realtime-preview").unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://example.test/v1/realtimertc?model=gpt-4o-mini-realtime-preview"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = SignalingClient::new("not a url", "m").unwrap_err();
        assert!(matches!(err, Error::Url(_)));
    }
}
