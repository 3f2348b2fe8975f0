use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::message::Message;
use crate::review::{ReviewClassifier, ReviewDecision};
use crate::transcript::TranscriptStore;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewId(pub String);

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReview {
    pub review_id: ReviewId,
    pub content: String,
    pub arrived_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct QueuedReply {
    content: String,
    arrived_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateOutcome {
    Appended(Message),
    PendingCreated(PendingReview),
    Queued { position: usize },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolutionOutcome {
    /// The reviewer-approved message, `None` for a cancellation.
    pub appended: Option<Message>,
    /// Queued replies evaluated after the slot freed up, in arrival order.
    pub promoted: Vec<GateOutcome>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReviewError {
    #[error("no reply is awaiting review")]
    NothingPending,
    #[error("review `{received}` does not match the pending review `{pending}`")]
    ReviewMismatch { pending: ReviewId, received: ReviewId },
}

/// Human-in-the-loop checkpoint for generated replies. At most one reply is pending at any
/// time; replies that arrive meanwhile wait in FIFO order and are classified only once the
/// slot frees up, so the transcript never reorders assistant replies.
pub struct ReviewGate {
    classifier: Arc<dyn ReviewClassifier>,
    pending: Option<PendingReview>,
    queue: VecDeque<QueuedReply>,
}

impl fmt::Debug for ReviewGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewGate")
            .field("pending", &self.pending)
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl ReviewGate {
    pub fn new(classifier: Arc<dyn ReviewClassifier>) -> Self {
        Self { classifier, pending: None, queue: VecDeque::new() }
    }

    pub fn pending(&self) -> Option<&PendingReview> {
        self.pending.as_ref()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn submit(
        &mut self,
        content: impl Into<String>,
        transcript: &mut TranscriptStore,
    ) -> GateOutcome {
        let reply = QueuedReply { content: content.into(), arrived_at: Utc::now() };
        if self.pending.is_some() {
            self.queue.push_back(reply);
            return GateOutcome::Queued { position: self.queue.len() };
        }

        self.evaluate(reply, transcript)
    }

    pub fn approve(
        &mut self,
        review_id: &ReviewId,
        content: impl Into<String>,
        transcript: &mut TranscriptStore,
    ) -> Result<ResolutionOutcome, ReviewError> {
        self.take_pending(review_id)?;
        let appended = transcript.append_assistant(content);
        let promoted = self.drain(transcript);
        Ok(ResolutionOutcome { appended: Some(appended), promoted })
    }

    pub fn cancel(
        &mut self,
        review_id: &ReviewId,
        transcript: &mut TranscriptStore,
    ) -> Result<ResolutionOutcome, ReviewError> {
        self.take_pending(review_id)?;
        let promoted = self.drain(transcript);
        Ok(ResolutionOutcome { appended: None, promoted })
    }

    /// Drops the pending review and everything queued behind it.
    pub fn clear(&mut self) {
        self.pending = None;
        self.queue.clear();
    }

    fn take_pending(&mut self, review_id: &ReviewId) -> Result<PendingReview, ReviewError> {
        let Some(pending) = self.pending.as_ref() else {
            return Err(ReviewError::NothingPending);
        };
        if &pending.review_id != review_id {
            return Err(ReviewError::ReviewMismatch {
                pending: pending.review_id.clone(),
                received: review_id.clone(),
            });
        }

        self.pending.take().ok_or(ReviewError::NothingPending)
    }

    fn evaluate(&mut self, reply: QueuedReply, transcript: &mut TranscriptStore) -> GateOutcome {
        match self.classifier.classify(&reply.content) {
            ReviewDecision::AutoApprove => {
                GateOutcome::Appended(transcript.append_assistant(reply.content))
            }
            ReviewDecision::NeedsReview => {
                let pending = PendingReview {
                    review_id: ReviewId(Uuid::new_v4().to_string()),
                    content: reply.content,
                    arrived_at: reply.arrived_at,
                };
                self.pending = Some(pending.clone());
                GateOutcome::PendingCreated(pending)
            }
        }
    }

    fn drain(&mut self, transcript: &mut TranscriptStore) -> Vec<GateOutcome> {
        let mut promoted = Vec::new();
        while self.pending.is_none() {
            let Some(reply) = self.queue.pop_front() else {
                break;
            };
            promoted.push(self.evaluate(reply, transcript));
        }
        promoted
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::domain::message::Sender;
    use crate::review::{
        AlwaysApprove, AlwaysReview, KeywordClassifier, ReviewClassifier, ReviewDecision,
    };
    use crate::transcript::TranscriptStore;

    use super::{GateOutcome, ReviewError, ReviewGate, ReviewId};

    fn contents(transcript: &TranscriptStore) -> Vec<(Sender, String)> {
        transcript.messages().iter().map(|m| (m.sender, m.content.clone())).collect()
    }

    fn pending_id(gate: &ReviewGate) -> ReviewId {
        gate.pending().map(|pending| pending.review_id.clone()).unwrap_or(ReviewId(String::new()))
    }

    #[test]
    fn auto_approved_reply_appends_unmodified() {
        let mut gate = ReviewGate::new(Arc::new(AlwaysApprove));
        let mut transcript = TranscriptStore::new();

        let outcome = gate.submit("hi", &mut transcript);
        assert!(matches!(outcome, GateOutcome::Appended(ref message) if message.content == "hi"));
        assert!(gate.pending().is_none());
        assert_eq!(contents(&transcript), vec![(Sender::Assistant, "hi".to_owned())]);
    }

    #[test]
    fn reply_needing_review_does_not_touch_transcript() {
        let mut gate = ReviewGate::new(Arc::new(AlwaysReview));
        let mut transcript = TranscriptStore::new();

        let outcome = gate.submit("draft X", &mut transcript);
        assert!(matches!(outcome, GateOutcome::PendingCreated(ref p) if p.content == "draft X"));
        assert!(transcript.is_empty());
    }

    #[test]
    fn approve_appends_edited_content() {
        let mut gate = ReviewGate::new(Arc::new(AlwaysReview));
        let mut transcript = TranscriptStore::new();
        gate.submit("draft X", &mut transcript);

        let id = pending_id(&gate);
        let resolution = gate.approve(&id, "draft X edited", &mut transcript).expect("approve");
        assert_eq!(resolution.appended.map(|m| m.content), Some("draft X edited".to_owned()));
        assert!(gate.pending().is_none());
        assert_eq!(contents(&transcript), vec![(Sender::Assistant, "draft X edited".to_owned())]);
    }

    #[test]
    fn cancel_never_appends() {
        let mut gate = ReviewGate::new(Arc::new(AlwaysReview));
        let mut transcript = TranscriptStore::new();
        gate.submit("draft", &mut transcript);

        let id = pending_id(&gate);
        let resolution = gate.cancel(&id, &mut transcript).expect("cancel");
        assert!(resolution.appended.is_none());
        assert!(transcript.is_empty());
        assert!(gate.pending().is_none());
    }

    #[test]
    fn second_review_is_queued_and_promoted_in_order() {
        let mut gate = ReviewGate::new(Arc::new(AlwaysReview));
        let mut transcript = TranscriptStore::new();

        gate.submit("first", &mut transcript);
        let queued = gate.submit("second", &mut transcript);
        assert_eq!(queued, GateOutcome::Queued { position: 1 });
        gate.submit("third", &mut transcript);
        assert_eq!(gate.queued(), 2);
        assert_eq!(gate.pending().map(|p| p.content.as_str()), Some("first"));

        let first = pending_id(&gate);
        let resolution = gate.approve(&first, "first", &mut transcript).expect("approve first");
        assert!(matches!(
            resolution.promoted.as_slice(),
            [GateOutcome::PendingCreated(pending)] if pending.content == "second"
        ));
        assert_eq!(gate.queued(), 1);

        let second = pending_id(&gate);
        gate.cancel(&second, &mut transcript).expect("cancel second");
        assert_eq!(gate.pending().map(|p| p.content.as_str()), Some("third"));
        assert_eq!(gate.queued(), 0);
    }

    #[test]
    fn replies_arriving_behind_a_review_keep_their_order() {
        let mut gate = ReviewGate::new(Arc::new(KeywordClassifier::new(["risky"])));
        let mut transcript = TranscriptStore::new();

        gate.submit("risky change", &mut transcript);
        let queued = gate.submit("plain follow-up", &mut transcript);
        assert_eq!(queued, GateOutcome::Queued { position: 1 });
        assert!(transcript.is_empty(), "auto-approvable reply must wait behind the review");

        let id = pending_id(&gate);
        let resolution = gate.approve(&id, "risky change (approved)", &mut transcript).expect("ok");
        assert!(matches!(resolution.promoted.as_slice(), [GateOutcome::Appended(_)]));
        assert_eq!(
            contents(&transcript),
            vec![
                (Sender::Assistant, "risky change (approved)".to_owned()),
                (Sender::Assistant, "plain follow-up".to_owned()),
            ]
        );
    }

    #[test]
    fn never_more_than_one_pending_review() {
        struct Alternating(std::sync::atomic::AtomicUsize);
        impl ReviewClassifier for Alternating {
            fn classify(&self, _content: &str) -> ReviewDecision {
                let n = self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                if n % 2 == 0 {
                    ReviewDecision::NeedsReview
                } else {
                    ReviewDecision::AutoApprove
                }
            }
        }

        let mut gate = ReviewGate::new(Arc::new(Alternating(Default::default())));
        let mut transcript = TranscriptStore::new();
        for index in 0..6 {
            gate.submit(format!("reply-{index}"), &mut transcript);
        }

        let mut resolved = 0;
        while let Some(id) = gate.pending().map(|p| p.review_id.clone()) {
            gate.approve(&id, "approved", &mut transcript).expect("approve");
            resolved += 1;
            assert!(resolved <= 6);
        }
        assert_eq!(gate.queued(), 0);
        assert_eq!(transcript.len(), 6);
    }

    #[test]
    fn resolution_requires_matching_review() {
        let mut gate = ReviewGate::new(Arc::new(AlwaysReview));
        let mut transcript = TranscriptStore::new();

        let error = gate
            .approve(&ReviewId("missing".to_owned()), "x", &mut transcript)
            .expect_err("nothing pending");
        assert_eq!(error, ReviewError::NothingPending);

        gate.submit("draft", &mut transcript);
        let error =
            gate.cancel(&ReviewId("other".to_owned()), &mut transcript).expect_err("mismatch");
        assert!(matches!(error, ReviewError::ReviewMismatch { .. }));
        assert!(gate.pending().is_some());
    }

    #[test]
    fn clear_drops_pending_and_queue() {
        let mut gate = ReviewGate::new(Arc::new(AlwaysReview));
        let mut transcript = TranscriptStore::new();
        gate.submit("one", &mut transcript);
        gate.submit("two", &mut transcript);

        gate.clear();
        assert!(gate.pending().is_none());
        assert_eq!(gate.queued(), 0);
    }
}
