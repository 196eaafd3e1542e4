use crate::protocol::models::Modality;
use crate::sdk::UnknownToolPolicy;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_REALTIME_URL: &str = "https://eastus2.realtimeapi-preview.ai.azure.com/v1/realtimertc";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini-realtime-preview";
pub const DEFAULT_FINANCE_HOST: &str = "yahoo-finance-real-time1.p.rapidapi.com";
pub const DEFAULT_DATA_CHANNEL_LABEL: &str = "oai-events";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8787";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for an assistant.
///
/// Every field has a default, so a config document only needs to name what it overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AssistantConfig {
    /// Realtime RTC endpoint the SDP offer is posted to.
    pub realtime_url: String,
    pub model: String,
    /// Origin serving `/session` and `/api-keys`.
    pub backend_url: String,
    /// Value of the `x-rapidapi-host` header.
    pub finance_host: String,
    /// Base URL for data-provider requests; defaults to `https://{finance_host}`.
    pub finance_base_url: Option<String>,
    pub data_channel_label: String,
    pub modalities: Vec<Modality>,
    pub instructions: Option<String>,
    pub voice: Option<String>,
    pub unknown_tool_policy: UnknownToolPolicy,
    pub request_timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            realtime_url: DEFAULT_REALTIME_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            finance_host: DEFAULT_FINANCE_HOST.to_string(),
            finance_base_url: None,
            data_channel_label: DEFAULT_DATA_CHANNEL_LABEL.to_string(),
            modalities: vec![Modality::Text, Modality::Audio],
            instructions: None,
            voice: None,
            unknown_tool_policy: UnknownToolPolicy::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl AssistantConfig {
    /// Load a config from a JSON document, filling omitted fields with defaults.
    ///
    /// # Errors
    /// Returns an error if the document is not valid JSON or has mistyped fields.
    #[allow(clippy::result_large_err)]
    pub fn from_json(doc: &str) -> Result<Self> {
        Ok(serde_json::from_str(doc)?)
    }

    #[must_use]
    pub fn finance_base_url(&self) -> String {
        self.finance_base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.finance_host))
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
