use serde::{Deserialize, Serialize};

use crate::identity::SessionId;

/// Envelopes written to the conversational endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEnvelope {
    Init {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        name: String,
    },
    Message {
        content: String,
    },
    Reset,
}

impl OutboundEnvelope {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Message { .. } => "message",
            Self::Reset => "reset",
        }
    }
}

/// Envelopes read from the conversational endpoint. Only `message` carries meaning for the
/// session; every other type decodes to `Unsupported`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEnvelope {
    Message {
        content: String,
    },
    #[serde(other)]
    Unsupported,
}
