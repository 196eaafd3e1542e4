use crate::config::AssistantConfig;
use crate::protocol::client_events::ClientEvent;
use crate::protocol::models::{SessionUpdate, Voice};
use crate::transport::backend::CredentialBroker;
use crate::transport::peer::{
    AudioSink, AudioTrack, ChannelEvent, DataChannelHandle, MediaDevices, PeerConnection, PeerFactory,
    TransceiverDirection,
};
use crate::transport::rest::SignalingClient;
use crate::{Error, Result};

use super::context::SessionContext;
use super::dispatcher::{DispatchOutcome, ToolDispatcher};
use super::tools::ToolRegistry;
use super::transport::EventSender;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};

/// Lifecycle of one started session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Offer/answer applied; waiting for the data channel to open.
    Negotiated,
    /// Manifest sent; tool calls are serviced.
    Open,
    /// Channel closed or errored. Terminal.
    Closed,
}

/// A configured assistant. Each `start()` builds a fresh peer connection.
pub struct Assistant {
    pub(super) config: AssistantConfig,
    pub(super) registry: Arc<ToolRegistry>,
    pub(super) context: Arc<SessionContext>,
    pub(super) media: Arc<dyn MediaDevices>,
    pub(super) peers: Arc<dyn PeerFactory>,
    pub(super) broker: Arc<dyn CredentialBroker>,
    pub(super) audio_sink: Arc<dyn AudioSink>,
    pub(super) signaling: SignalingClient,
}

impl Assistant {
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    #[must_use]
    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    #[must_use]
    pub const fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Fetch the data-provider key into the shared context.
    ///
    /// # Errors
    /// Returns an error if the broker cannot supply the key.
    pub async fn load_api_key(&self) -> Result<()> {
        let key = self.broker.api_key().await?;
        self.context.set_api_key(key).await;
        tracing::info!("API keys loaded");
        Ok(())
    }

    /// The configuration message sent once the data channel opens.
    #[must_use]
    pub fn session_update(&self) -> SessionUpdate {
        let mut update = SessionUpdate::new(self.config.modalities.clone(), self.registry.as_tools());
        update.instructions.clone_from(&self.config.instructions);
        update.voice = self.config.voice.clone().map(Voice::from);
        update
    }

    /// Open a session: capture the microphone, negotiate the peer connection and
    /// start servicing the data channel.
    ///
    /// The data-provider key is fetched first if none is loaded yet. A failed
    /// fetch is logged and the session still starts; data-provider tools then
    /// answer with a failure until a key is loaded.
    ///
    /// Nothing is retried; callers may simply call `start()` again.
    ///
    /// # Errors
    /// Returns `Error::MediaAccess` if the microphone is unavailable, or the
    /// credential/signaling error that aborted the handshake.
    pub async fn start(&self) -> Result<Session> {
        if self.context.api_key().await.is_none() {
            if let Err(err) = self.load_api_key().await {
                tracing::error!("Failed to load data provider API key: {err}");
            }
        }

        let tracks = self.media.microphone().await?;
        tracing::info!(tracks = tracks.len(), "Microphone captured");

        let peer = self.peers.create().await?;
        let sink = Arc::clone(&self.audio_sink);
        peer.on_track(Box::new(move |track| sink.play(track)));

        match self.negotiate(peer.as_ref(), tracks).await {
            Ok(handle) => Ok(self.spawn_session(peer, handle)),
            Err(err) => {
                tracing::error!("Failed to start realtime session: {err}");
                if let Err(close_err) = peer.close().await {
                    tracing::debug!("Closing failed peer: {close_err}");
                }
                Err(err)
            }
        }
    }

    async fn negotiate(
        &self,
        peer: &dyn PeerConnection,
        tracks: Vec<AudioTrack>,
    ) -> Result<DataChannelHandle> {
        for track in tracks {
            peer.add_transceiver(track, TransceiverDirection::SendRecv).await?;
        }
        let handle = peer.create_data_channel(&self.config.data_channel_label).await?;

        let offer = peer.create_offer().await?;
        peer.set_local_description(offer.clone()).await?;

        let credential = self.broker.session_credential().await?;
        let answer = self.signaling.exchange(&offer, &credential).await?;
        peer.set_remote_description(answer).await?;
        tracing::info!(endpoint = %self.signaling.endpoint(), "Remote description applied");

        Ok(handle)
    }

    fn spawn_session(&self, peer: Arc<dyn PeerConnection>, handle: DataChannelHandle) -> Session {
        let DataChannelHandle { channel, events } = handle;
        let sender = EventSender::new(channel);
        let dispatcher = ToolDispatcher::new(Arc::clone(&self.registry))
            .with_policy(self.config.unknown_tool_policy);
        let (state_tx, state_rx) = watch::channel(SessionState::Negotiated);
        let (outcome_tx, outcome_rx) = mpsc::channel(64);

        let task = tokio::spawn(run_channel(ChannelLoop {
            events,
            sender: sender.clone(),
            dispatcher,
            update: self.session_update(),
            state: state_tx,
            outcomes: outcome_tx,
        }));

        Session { peer, sender, state_rx, outcome_rx, task }
    }
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// A live session. Dropping it stops servicing the channel.
pub struct Session {
    peer: Arc<dyn PeerConnection>,
    sender: EventSender,
    state_rx: watch::Receiver<SessionState>,
    outcome_rx: mpsc::Receiver<DispatchOutcome>,
    task: JoinHandle<()>,
}

impl Session {
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Wait until the channel has opened and the manifest was sent.
    ///
    /// # Errors
    /// Returns `Error::ConnectionClosed` if the session ends first.
    pub async fn opened(&mut self) -> Result<()> {
        let state = self
            .state_rx
            .wait_for(|state| *state != SessionState::Negotiated)
            .await
            .map_err(|_| Error::ConnectionClosed)?;
        match *state {
            SessionState::Open => Ok(()),
            SessionState::Negotiated | SessionState::Closed => Err(Error::ConnectionClosed),
        }
    }

    /// Wait until the data channel closes.
    pub async fn closed(&mut self) {
        let _ = self.state_rx.wait_for(|state| *state == SessionState::Closed).await;
    }

    /// Await the outcome of the next handled frame.
    ///
    /// Outcomes are buffered up to 64 unread entries; later ones are dropped
    /// while the buffer is full. Tool replies are sent regardless.
    pub async fn next_outcome(&mut self) -> Option<DispatchOutcome> {
        self.outcome_rx.recv().await
    }

    /// Send a raw client event on the data channel.
    ///
    /// # Errors
    /// Returns an error if serialization or the send fails.
    pub async fn send_raw(&self, event: ClientEvent) -> Result<()> {
        self.sender.send(&event).await
    }

    /// Close the peer connection and stop the channel loop.
    ///
    /// # Errors
    /// Returns an error if the peer fails to close.
    pub async fn close(self) -> Result<()> {
        self.task.abort();
        self.peer.close().await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct ChannelLoop {
    events: mpsc::Receiver<ChannelEvent>,
    sender: EventSender,
    dispatcher: ToolDispatcher,
    update: SessionUpdate,
    state: watch::Sender<SessionState>,
    outcomes: mpsc::Sender<DispatchOutcome>,
}

/// Services the data channel until it closes.
///
/// Channel events are consumed in order, so `session.update` goes out before any
/// inbound frame is looked at. Each frame is then handled on its own task, and
/// replies complete in whatever order the tools finish.
async fn run_channel(mut ctx: ChannelLoop) {
    let mut open = false;
    let mut in_flight = JoinSet::new();

    while let Some(event) = ctx.events.recv().await {
        match event {
            ChannelEvent::Open => {
                if open {
                    continue;
                }
                tracing::info!("Data channel open; configuring session");
                let update = ClientEvent::session_update(ctx.update.clone());
                if let Err(err) = ctx.sender.send(&update).await {
                    tracing::error!("Failed to send session.update: {err}");
                    break;
                }
                open = true;
                ctx.state.send_replace(SessionState::Open);
            }
            ChannelEvent::Message(text) => {
                if !open {
                    tracing::debug!("Dropping frame received before the channel opened");
                    continue;
                }
                let dispatcher = ctx.dispatcher.clone();
                let sender = ctx.sender.clone();
                let outcomes = ctx.outcomes.clone();
                in_flight.spawn(async move {
                    match dispatcher.handle_frame(&text, &sender).await {
                        Ok(outcome) => {
                            if let Err(err) = outcomes.try_send(outcome) {
                                tracing::trace!("Dropping dispatch outcome: {err}");
                            }
                        }
                        Err(err) => tracing::error!("Failed to deliver tool output: {err}"),
                    }
                });
            }
            ChannelEvent::Close => {
                tracing::info!("Data channel closed");
                break;
            }
            ChannelEvent::Error(err) => {
                tracing::error!("Data channel error: {err}");
                break;
            }
        }

        while in_flight.try_join_next().is_some() {}
    }

    ctx.state.send_replace(SessionState::Closed);
}
