use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub content: String,
    /// Position in the transcript; strictly increasing in acceptance order.
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub(crate) fn new(sender: Sender, content: String, sequence: u64) -> Self {
        Self {
            id: MessageId(Uuid::new_v4().to_string()),
            sender,
            content,
            sequence,
            created_at: Utc::now(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}
