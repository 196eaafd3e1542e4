#![allow(dead_code)]

use async_trait::async_trait;
use rt_assistant::transport::backend::{ApiKey, Credential, CredentialBroker};
use rt_assistant::transport::peer::{
    AudioSink, AudioTrack, ChannelEvent, DataChannel, DataChannelHandle, MediaDevices,
    PeerConnection, PeerFactory, RemoteTrack, SessionDescription, TrackHandler,
    TransceiverDirection,
};
use rt_assistant::{AssistantBuilder, Error, Result};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const OFFER_SDP: &str = "v=0 offer";
pub const ANSWER_SDP: &str = "v=0 answer";
pub const SIGNALING_PATH: &str = "/v1/realtimertc";

pub struct MockChannel {
    label: String,
    outbound: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl DataChannel for MockChannel {
    fn label(&self) -> &str {
        &self.label
    }

    async fn send_text(&self, text: String) -> Result<()> {
        self.outbound.send(text).map_err(|_| Error::ConnectionClosed)
    }
}

/// Peer double that records the negotiation steps it sees.
pub struct MockPeer {
    events: Mutex<Option<mpsc::Receiver<ChannelEvent>>>,
    outbound: mpsc::UnboundedSender<String>,
    track_handler: Mutex<Option<TrackHandler>>,
    pub steps: Mutex<Vec<String>>,
    pub remote: Mutex<Option<SessionDescription>>,
    pub closed: AtomicBool,
}

impl MockPeer {
    pub fn new() -> (Arc<Self>, mpsc::Sender<ChannelEvent>, mpsc::UnboundedReceiver<String>) {
        let (events_tx, events_rx) = mpsc::channel(16);
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let peer = Arc::new(Self {
            events: Mutex::new(Some(events_rx)),
            outbound: out_tx,
            track_handler: Mutex::new(None),
            steps: Mutex::new(Vec::new()),
            remote: Mutex::new(None),
            closed: AtomicBool::new(false),
        });
        (peer, events_tx, out_rx)
    }

    pub fn emit_track(&self, track: RemoteTrack) {
        if let Some(handler) = self.track_handler.lock().unwrap().as_ref() {
            handler(track);
        }
    }

    pub fn steps(&self) -> Vec<String> {
        self.steps.lock().unwrap().clone()
    }

    fn step(&self, step: impl Into<String>) {
        self.steps.lock().unwrap().push(step.into());
    }
}

#[async_trait]
impl PeerConnection for MockPeer {
    fn on_track(&self, handler: TrackHandler) {
        *self.track_handler.lock().unwrap() = Some(handler);
    }

    async fn add_transceiver(&self, track: AudioTrack, direction: TransceiverDirection) -> Result<()> {
        self.step(format!("transceiver:{}:{direction:?}", track.id));
        Ok(())
    }

    async fn create_data_channel(&self, label: &str) -> Result<DataChannelHandle> {
        self.step(format!("channel:{label}"));
        let events = self
            .events
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| Error::Transport("channel already created".to_string()))?;
        let channel = Arc::new(MockChannel { label: label.to_string(), outbound: self.outbound.clone() });
        Ok(DataChannelHandle { channel, events })
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        self.step("offer");
        Ok(SessionDescription::offer(OFFER_SDP))
    }

    async fn set_local_description(&self, _description: SessionDescription) -> Result<()> {
        self.step("local");
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.step("remote");
        *self.remote.lock().unwrap() = Some(description);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub struct MockFactory {
    peer: Arc<MockPeer>,
    pub created: AtomicUsize,
}

impl MockFactory {
    pub fn new(peer: Arc<MockPeer>) -> Self {
        Self { peer, created: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl PeerFactory for MockFactory {
    async fn create(&self) -> Result<Arc<dyn PeerConnection>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let peer: Arc<dyn PeerConnection> = self.peer.clone();
        Ok(peer)
    }
}

pub struct MockMedia {
    pub denied: bool,
}

#[async_trait]
impl MediaDevices for MockMedia {
    async fn microphone(&self) -> Result<Vec<AudioTrack>> {
        if self.denied {
            return Err(Error::MediaAccess("permission denied".to_string()));
        }
        Ok(vec![AudioTrack { id: "mic-1".to_string(), label: "Default".to_string() }])
    }
}

pub struct StaticBroker;

#[async_trait]
impl CredentialBroker for StaticBroker {
    async fn session_credential(&self) -> Result<Credential> {
        Ok(Credential::new("ek_test"))
    }

    async fn api_key(&self) -> Result<ApiKey> {
        Ok(ApiKey::new("rk_test"))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub tracks: Mutex<Vec<RemoteTrack>>,
}

impl AudioSink for RecordingSink {
    fn play(&self, track: RemoteTrack) {
        self.tracks.lock().unwrap().push(track);
    }
}

/// A mock server answering offers with `ANSWER_SDP`.
pub async fn signaling_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SIGNALING_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_string(ANSWER_SDP))
        .mount(&server)
        .await;
    server
}

pub struct Harness {
    pub builder: AssistantBuilder,
    pub peer: Arc<MockPeer>,
    pub factory: Arc<MockFactory>,
    pub events: mpsc::Sender<ChannelEvent>,
    pub outbound: mpsc::UnboundedReceiver<String>,
}

/// Builder wired to mock media, peer and broker, signaling against `server`.
pub fn harness(server: &MockServer) -> Harness {
    let (peer, events, outbound) = MockPeer::new();
    let factory = Arc::new(MockFactory::new(peer.clone()));
    let builder = AssistantBuilder::new()
        .realtime_url(format!("{}{SIGNALING_PATH}", server.uri()))
        .media_devices(Arc::new(MockMedia { denied: false }))
        .peer_factory(factory.clone())
        .credential_broker(Arc::new(StaticBroker))
        .finance_tools(false);
    Harness { builder, peer, factory, events, outbound }
}

pub async fn next_frame(outbound: &mut mpsc::UnboundedReceiver<String>) -> Value {
    let text = outbound.recv().await.expect("channel closed");
    serde_json::from_str(&text).expect("outbound frame is JSON")
}

pub fn call_frame(name: &str, call_id: &str, arguments: &Value) -> String {
    serde_json::json!({
        "type": "response.function_call_arguments.done",
        "event_id": format!("evt_{call_id}"),
        "response_id": "resp_1",
        "item_id": format!("item_{call_id}"),
        "output_index": 0,
        "name": name,
        "call_id": call_id,
        "arguments": arguments.to_string(),
    })
    .to_string()
}
