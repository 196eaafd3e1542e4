use crate::config::AssistantConfig;
use crate::tools::finance::{self, FinanceClient};
use crate::tools::hand::{self, Actuator};
use crate::tools::page::{self, PageSurface};
use crate::tools::presentation::{NullPresentation, PresentationSink};
use crate::transport::backend::{CredentialBroker, HttpCredentialBroker};
use crate::transport::peer::{AudioSink, LoggingAudioSink, MediaDevices, PeerFactory};
use crate::transport::rest::SignalingClient;
use crate::{Error, Result};

use super::context::SessionContext;
use super::dispatcher::UnknownToolPolicy;
use super::session::Assistant;
use super::tools::ToolRegistry;
use std::sync::Arc;

pub struct AssistantBuilder {
    config: AssistantConfig,
    tools: ToolRegistry,
    media: Option<Arc<dyn MediaDevices>>,
    peers: Option<Arc<dyn PeerFactory>>,
    broker: Option<Arc<dyn CredentialBroker>>,
    audio_sink: Arc<dyn AudioSink>,
    presentation: Arc<dyn PresentationSink>,
    page: Option<Arc<dyn PageSurface>>,
    actuator: Option<Arc<dyn Actuator>>,
    finance_tools: bool,
}

impl AssistantBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: AssistantConfig::default(),
            tools: ToolRegistry::new(),
            media: None,
            peers: None,
            broker: None,
            audio_sink: Arc::new(LoggingAudioSink),
            presentation: Arc::new(NullPresentation),
            page: None,
            actuator: None,
            finance_tools: true,
        }
    }

    #[must_use]
    pub fn config(mut self, config: AssistantConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    #[must_use]
    pub fn realtime_url(mut self, url: impl Into<String>) -> Self {
        self.config.realtime_url = url.into();
        self
    }

    #[must_use]
    pub fn backend_url(mut self, url: impl Into<String>) -> Self {
        self.config.backend_url = url.into();
        self
    }

    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.config.instructions = Some(instructions.into());
        self
    }

    #[must_use]
    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.config.voice = Some(voice.into());
        self
    }

    #[must_use]
    pub const fn unknown_tool_policy(mut self, policy: UnknownToolPolicy) -> Self {
        self.config.unknown_tool_policy = policy;
        self
    }

    #[must_use]
    pub fn media_devices(mut self, media: Arc<dyn MediaDevices>) -> Self {
        self.media = Some(media);
        self
    }

    #[must_use]
    pub fn peer_factory(mut self, peers: Arc<dyn PeerFactory>) -> Self {
        self.peers = Some(peers);
        self
    }

    /// Override the default HTTP broker built from `backend_url`.
    #[must_use]
    pub fn credential_broker(mut self, broker: Arc<dyn CredentialBroker>) -> Self {
        self.broker = Some(broker);
        self
    }

    #[must_use]
    pub fn audio_sink(mut self, sink: Arc<dyn AudioSink>) -> Self {
        self.audio_sink = sink;
        self
    }

    #[must_use]
    pub fn presentation(mut self, sink: Arc<dyn PresentationSink>) -> Self {
        self.presentation = sink;
        self
    }

    /// Enable `changeBackgroundColor`, `changeTextColor` and `getPageHTML`.
    #[must_use]
    pub fn page_surface(mut self, page: Arc<dyn PageSurface>) -> Self {
        self.page = Some(page);
        self
    }

    /// Enable `showFingers`.
    #[must_use]
    pub fn actuator(mut self, actuator: Arc<dyn Actuator>) -> Self {
        self.actuator = Some(actuator);
        self
    }

    #[must_use]
    pub const fn finance_tools(mut self, enabled: bool) -> Self {
        self.finance_tools = enabled;
        self
    }

    /// Extra tools, registered after the built-in ones.
    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    /// Assemble the assistant and its tool catalogue.
    ///
    /// # Errors
    /// Returns an error if a required collaborator is missing, a URL is invalid,
    /// or two tools share a name.
    #[allow(clippy::result_large_err)]
    pub fn build(self) -> Result<Assistant> {
        let media = self.media.ok_or_else(|| Error::Configuration("media devices required".to_string()))?;
        let peers = self.peers.ok_or_else(|| Error::Configuration("peer factory required".to_string()))?;
        let broker: Arc<dyn CredentialBroker> = match self.broker {
            Some(broker) => broker,
            None => Arc::new(HttpCredentialBroker::new(&self.config.backend_url, self.config.request_timeout())?),
        };
        let signaling = SignalingClient::new_with_timeouts(
            &self.config.realtime_url,
            &self.config.model,
            self.config.request_timeout(),
            self.config.request_timeout() * 3,
        )?;
        let context = Arc::new(SessionContext::new(self.presentation));

        let mut registry = ToolRegistry::new();
        if let Some(page) = self.page {
            page::register(&mut registry, page)?;
        }
        if let Some(actuator) = self.actuator {
            hand::register(&mut registry, actuator)?;
        }
        if self.finance_tools {
            let client = FinanceClient::new(&self.config, Arc::clone(&context))?;
            finance::register(&mut registry, Arc::new(client))?;
        }
        registry.extend(self.tools)?;
        tracing::debug!(?registry, "Tool catalogue assembled");

        Ok(Assistant {
            config: self.config,
            registry: Arc::new(registry),
            context,
            media,
            peers,
            broker,
            audio_sink: self.audio_sink,
            signaling,
        })
    }
}

impl Default for AssistantBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Assistant {
    #[must_use]
    pub fn builder() -> AssistantBuilder {
        AssistantBuilder::new()
    }
}
