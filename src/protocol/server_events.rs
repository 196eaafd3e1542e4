use serde::{Deserialize, Deserializer};
use super::models::ArbitraryJson;
use crate::error::ServerError;

/// Inbound data-channel events.
///
/// Only the kinds the assistant acts on are typed; everything else, including
/// known types with an unexpected shape, lands in `Unknown` with the raw JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Error {
        event_id: Option<String>,
        error: ServerError,
    },
    SessionCreated {
        event_id: Option<String>,
        session: ArbitraryJson,
    },
    SessionUpdated {
        event_id: Option<String>,
        session: ArbitraryJson,
    },
    ResponseCreated {
        event_id: Option<String>,
        response: ArbitraryJson,
    },
    ResponseDone {
        event_id: Option<String>,
        response: ArbitraryJson,
    },
    ResponseFunctionCallArgumentsDelta {
        event_id: Option<String>,
        call_id: String,
        delta: String,
    },
    ResponseFunctionCallArgumentsDone {
        event_id: Option<String>,
        response_id: Option<String>,
        item_id: Option<String>,
        output_index: Option<u32>,
        name: String,
        call_id: String,
        /// JSON-encoded argument object, exactly as the model produced it.
        arguments: String,
    },
    Unknown(ArbitraryJson),
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ServerEventRepr {
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        event_id: Option<String>,
        error: ServerError,
    },
    #[serde(rename = "session.created")]
    SessionCreated {
        #[serde(default)]
        event_id: Option<String>,
        session: ArbitraryJson,
    },
    #[serde(rename = "session.updated")]
    SessionUpdated {
        #[serde(default)]
        event_id: Option<String>,
        session: ArbitraryJson,
    },
    #[serde(rename = "response.created")]
    ResponseCreated {
        #[serde(default)]
        event_id: Option<String>,
        response: ArbitraryJson,
    },
    #[serde(rename = "response.done")]
    ResponseDone {
        #[serde(default)]
        event_id: Option<String>,
        response: ArbitraryJson,
    },
    #[serde(rename = "response.function_call_arguments.delta")]
    ResponseFunctionCallArgumentsDelta {
        #[serde(default)]
        event_id: Option<String>,
        call_id: String,
        delta: String,
    },
    #[serde(rename = "response.function_call_arguments.done")]
    ResponseFunctionCallArgumentsDone {
        #[serde(default)]
        event_id: Option<String>,
        #[serde(default)]
        response_id: Option<String>,
        #[serde(default)]
        item_id: Option<String>,
        #[serde(default)]
        output_index: Option<u32>,
        name: String,
        call_id: String,
        arguments: String,
    },
}

impl From<ServerEventRepr> for ServerEvent {
    fn from(repr: ServerEventRepr) -> Self {
        match repr {
            ServerEventRepr::Error { event_id, error } => Self::Error { event_id, error },
            ServerEventRepr::SessionCreated { event_id, session } => Self::SessionCreated { event_id, session },
            ServerEventRepr::SessionUpdated { event_id, session } => Self::SessionUpdated { event_id, session },
            ServerEventRepr::ResponseCreated { event_id, response } => Self::ResponseCreated { event_id, response },
            ServerEventRepr::ResponseDone { event_id, response } => Self::ResponseDone { event_id, response },
            ServerEventRepr::ResponseFunctionCallArgumentsDelta { event_id, call_id, delta } => {
                Self::ResponseFunctionCallArgumentsDelta { event_id, call_id, delta }
            }
            ServerEventRepr::ResponseFunctionCallArgumentsDone {
                event_id, response_id, item_id, output_index, name, call_id, arguments,
            } => Self::ResponseFunctionCallArgumentsDone {
                event_id, response_id, item_id, output_index, name, call_id, arguments,
            },
        }
    }
}

impl<'de> Deserialize<'de> for ServerEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = ArbitraryJson::deserialize(deserializer)?;
        match ServerEventRepr::deserialize(value.clone()) {
            Ok(repr) => Ok(repr.into()),
            Err(err) => {
                tracing::trace!("Unrecognized server event: {err}");
                Ok(Self::Unknown(value))
            }
        }
    }
}

impl ServerEvent {
    /// The wire `type` of the event, when it has one.
    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        match self {
            Self::Error { .. } => Some("error"),
            Self::SessionCreated { .. } => Some("session.created"),
            Self::SessionUpdated { .. } => Some("session.updated"),
            Self::ResponseCreated { .. } => Some("response.created"),
            Self::ResponseDone { .. } => Some("response.done"),
            Self::ResponseFunctionCallArgumentsDelta { .. } => Some("response.function_call_arguments.delta"),
            Self::ResponseFunctionCallArgumentsDone { .. } => Some("response.function_call_arguments.done"),
            Self::Unknown(value) => value.get("type").and_then(|v| v.as_str()),
        }
    }

    #[must_use]
    pub fn event_id(&self) -> Option<&str> {
        match self {
            Self::Error { event_id, .. }
            | Self::SessionCreated { event_id, .. }
            | Self::SessionUpdated { event_id, .. }
            | Self::ResponseCreated { event_id, .. }
            | Self::ResponseDone { event_id, .. }
            | Self::ResponseFunctionCallArgumentsDelta { event_id, .. }
            | Self::ResponseFunctionCallArgumentsDone { event_id, .. } => event_id.as_deref(),
            Self::Unknown(value) => value.get("event_id").and_then(|v| v.as_str()),
        }
    }
}
