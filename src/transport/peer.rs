//! Abstractions over the peer connection, data channel and audio devices.
//!
//! The assistant drives these through traits so it can run against a browser
//! binding, a native WebRTC stack, or in-memory doubles in tests.

use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpType {
    Offer,
    Answer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    pub kind: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    #[must_use]
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self { kind: SdpType::Offer, sdp: sdp.into() }
    }

    #[must_use]
    pub fn answer(sdp: impl Into<String>) -> Self {
        Self { kind: SdpType::Answer, sdp: sdp.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransceiverDirection {
    #[default]
    SendRecv,
    SendOnly,
    RecvOnly,
}

/// A captured local audio track (e.g. a microphone).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    pub id: String,
    pub label: String,
}

/// A media track announced by the remote peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: Option<String>,
}

/// Lifecycle notifications for a data channel, delivered in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Open,
    Message(String),
    Close,
    Error(String),
}

#[async_trait]
pub trait DataChannel: Send + Sync {
    fn label(&self) -> &str;

    /// Send one text frame.
    async fn send_text(&self, text: String) -> Result<()>;
}

/// A freshly created data channel: the send half plus its event feed.
pub struct DataChannelHandle {
    pub channel: Arc<dyn DataChannel>,
    pub events: mpsc::Receiver<ChannelEvent>,
}

pub type TrackHandler = Box<dyn Fn(RemoteTrack) + Send + Sync>;

#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Install the callback invoked for each remote media track.
    fn on_track(&self, handler: TrackHandler);

    async fn add_transceiver(&self, track: AudioTrack, direction: TransceiverDirection) -> Result<()>;

    async fn create_data_channel(&self, label: &str) -> Result<DataChannelHandle>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Creates a new, unconnected peer connection per session attempt.
#[async_trait]
pub trait PeerFactory: Send + Sync {
    async fn create(&self) -> Result<Arc<dyn PeerConnection>>;
}

#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Capture the microphone.
    ///
    /// # Errors
    /// Returns `Error::MediaAccess` when permission is denied or no input device exists.
    async fn microphone(&self) -> Result<Vec<AudioTrack>>;
}

/// Playback target for the model's voice.
pub trait AudioSink: Send + Sync {
    fn play(&self, track: RemoteTrack);
}

/// Sink that only records the track in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingAudioSink;

impl AudioSink for LoggingAudioSink {
    fn play(&self, track: RemoteTrack) {
        tracing::info!(track = %track.id, "Remote audio track available");
    }
}
