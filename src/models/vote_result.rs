use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The outcome of one voting round for a single step.
///
/// `cost_usd` is the winning sample's own agent cost (the first-observed
/// sample for `canonical_hash`), not a sum across every sample run during
/// the round — matching how the executor attributes one step's cost to
/// the output it actually kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResult {
    pub output: Value,
    pub canonical_hash: String,
    pub total_samples: usize,
    pub red_flagged: usize,
    pub vote_counts: HashMap<String, usize>,
    pub cost_usd: f64,
}

/// A compressed projection of [`VoteResult`] suitable for event payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingSummary {
    pub strategy: String,
    pub total_samples: usize,
    pub red_flagged: usize,
    pub winning_votes: usize,
}

impl VoteResult {
    pub fn summary(&self, strategy: impl Into<String>) -> VotingSummary {
        let winning_votes = self
            .vote_counts
            .get(&self.canonical_hash)
            .copied()
            .unwrap_or(1);
        VotingSummary {
            strategy: strategy.into(),
            total_samples: self.total_samples,
            red_flagged: self.red_flagged,
            winning_votes,
        }
    }
}
