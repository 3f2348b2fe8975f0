//! Conversation channel for taskdesk.
//!
//! - **Manager** (`manager`) - owns the live session and applies transition effects
//! - **Transport** (`transport`, `websocket`) - duplex connection per session identity
//! - **Protocol** (`protocol`) - JSON envelope codec
//!
//! ```text
//! ToolRouter → AgentBinding → ChannelManager → ChannelTransport → agent endpoint
//!                                  ↓
//!                    ReviewGate → TranscriptStore
//! ```

pub mod manager;
pub mod protocol;
pub mod transport;
pub mod websocket;

pub use manager::{ChannelError, ChannelManager, ChannelUpdate, Resolution};
pub use protocol::ProtocolError;
pub use transport::{
    ChannelTransport, NoopChannelTransport, TransportError, TransportEvent, TransportEventKind,
};
pub use websocket::WebSocketTransport;
