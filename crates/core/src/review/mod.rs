pub mod gate;

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::{ReviewConfig, ReviewPolicy};

pub use gate::{GateOutcome, PendingReview, ResolutionOutcome, ReviewError, ReviewGate, ReviewId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewDecision {
    AutoApprove,
    NeedsReview,
}

/// Decides whether a generated reply may enter the transcript without a human decision.
pub trait ReviewClassifier: Send + Sync {
    fn classify(&self, content: &str) -> ReviewDecision;
}

#[derive(Clone, Debug, Default)]
pub struct AlwaysApprove;

impl ReviewClassifier for AlwaysApprove {
    fn classify(&self, _content: &str) -> ReviewDecision {
        ReviewDecision::AutoApprove
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlwaysReview;

impl ReviewClassifier for AlwaysReview {
    fn classify(&self, _content: &str) -> ReviewDecision {
        ReviewDecision::NeedsReview
    }
}

/// Holds a reply for review when it mentions any configured keyword (case-insensitive).
#[derive(Clone, Debug)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl KeywordClassifier {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|keyword| keyword.as_ref().trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl ReviewClassifier for KeywordClassifier {
    fn classify(&self, content: &str) -> ReviewDecision {
        let lowered = content.to_lowercase();
        if self.keywords.iter().any(|keyword| lowered.contains(keyword.as_str())) {
            ReviewDecision::NeedsReview
        } else {
            ReviewDecision::AutoApprove
        }
    }
}

/// Holds a reply for review when a uniform sample in `[0, 1)` exceeds `threshold`.
/// Demonstration policy; seed it to make runs reproducible.
#[derive(Debug)]
pub struct SampledClassifier {
    threshold: f64,
    rng: Mutex<StdRng>,
}

impl SampledClassifier {
    pub fn new(threshold: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { threshold, rng: Mutex::new(rng) }
    }
}

impl ReviewClassifier for SampledClassifier {
    fn classify(&self, _content: &str) -> ReviewDecision {
        let sample: f64 = match self.rng.lock() {
            Ok(mut rng) => rng.gen(),
            Err(poisoned) => poisoned.into_inner().gen(),
        };
        if sample > self.threshold {
            ReviewDecision::NeedsReview
        } else {
            ReviewDecision::AutoApprove
        }
    }
}

pub fn classifier_from_config(config: &ReviewConfig) -> Arc<dyn ReviewClassifier> {
    match config.policy {
        ReviewPolicy::Never => Arc::new(AlwaysApprove),
        ReviewPolicy::Always => Arc::new(AlwaysReview),
        ReviewPolicy::Keyword => Arc::new(KeywordClassifier::new(&config.keywords)),
        ReviewPolicy::Sampled => {
            Arc::new(SampledClassifier::new(config.sample_threshold, config.seed))
        }
    }
}
