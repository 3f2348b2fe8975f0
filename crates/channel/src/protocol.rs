use taskdesk_core::protocol::{InboundEnvelope, OutboundEnvelope};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("could not encode `{kind}` envelope: {reason}")]
    Encode { kind: &'static str, reason: String },
    #[error("could not decode inbound frame: {0}")]
    Decode(String),
}

pub fn encode(envelope: &OutboundEnvelope) -> Result<String, ProtocolError> {
    serde_json::to_string(envelope)
        .map_err(|error| ProtocolError::Encode { kind: envelope.kind(), reason: error.to_string() })
}

pub fn decode(frame: &str) -> Result<InboundEnvelope, ProtocolError> {
    serde_json::from_str(frame).map_err(|error| ProtocolError::Decode(error.to_string()))
}
