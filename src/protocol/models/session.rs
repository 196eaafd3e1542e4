use serde::{Deserialize, Serialize};

use super::{Modality, Tool, Voice};

/// Body of the `session.update` event sent once the data channel opens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUpdate {
    pub modalities: Vec<Modality>,
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<Voice>,
}

impl SessionUpdate {
    #[must_use]
    pub const fn new(modalities: Vec<Modality>, tools: Vec<Tool>) -> Self {
        Self {
            modalities,
            tools,
            instructions: None,
            voice: None,
        }
    }
}
