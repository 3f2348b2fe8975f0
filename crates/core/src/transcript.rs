use crate::domain::message::{Message, Sender};

/// Append-only log of accepted messages for one session. The only destructive operation is
/// a full [`TranscriptStore::clear`] on session reset.
#[derive(Clone, Debug, Default)]
pub struct TranscriptStore {
    messages: Vec<Message>,
    next_sequence: u64,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, sender: Sender, content: impl Into<String>) -> Message {
        let message = Message::new(sender, content.into(), self.next_sequence);
        self.next_sequence += 1;
        self.messages.push(message.clone());
        message
    }

    pub fn append_user(&mut self, content: impl Into<String>) -> Message {
        self.append(Sender::User, content)
    }

    pub fn append_assistant(&mut self, content: impl Into<String>) -> Message {
        self.append(Sender::Assistant, content)
    }

    // Sequence numbers keep counting so messages from before a reset never compare equal
    // to messages appended after it.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
