use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use crate::agent_runner::AgentRunner;
use crate::canonical;
use crate::events::{now_timestamp, Event, EventBus};
use crate::models::{PlanStep, TaskConfig, VoteResult};
use crate::red_flag;

use super::{VoteError, Voter};

/// Runs agents one at a time until the leading hash's count exceeds the
/// runner-up's by at least `voting_k`.
pub struct FirstToKVoter {
    runner: Arc<AgentRunner>,
}

impl FirstToKVoter {
    pub fn new(runner: Arc<AgentRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Voter for FirstToKVoter {
    async fn vote(
        &self,
        step: &PlanStep,
        context: &str,
        config: &TaskConfig,
        events: &EventBus,
    ) -> Result<VoteResult, VoteError> {
        let mut vote_counts: IndexMap<String, usize> = IndexMap::new();
        let mut hash_to_output: IndexMap<String, Value> = IndexMap::new();
        let mut hash_to_cost: IndexMap<String, f64> = IndexMap::new();
        let mut total_samples = 0;
        let mut red_flagged = 0;

        while total_samples < config.max_voting_samples {
            let result = self.runner.run(step, context, config).await;
            total_samples += 1;

            let (flagged, reason) = red_flag::check_with_reason(&result);
            if flagged {
                red_flagged += 1;
                events.emit(Event::AgentSampleRedFlagged {
                    timestamp: now_timestamp(),
                    step: step.step,
                    sample_index: total_samples - 1,
                    reason,
                });
                continue;
            }

            events.emit(Event::AgentSampleCompleted {
                timestamp: now_timestamp(),
                step: step.step,
                sample_index: total_samples - 1,
                output: result.output.clone(),
                cost_usd: result.cost_usd,
                duration_ms: result.duration_ms,
            });

            let hash = canonical::hash(&result.output);
            *vote_counts.entry(hash.clone()).or_insert(0) += 1;
            hash_to_output.entry(hash.clone()).or_insert(result.output);
            hash_to_cost.entry(hash).or_insert(result.cost_usd);

            let (leader_hash, leader_count, runner_up_count) = ranked_top_two(&vote_counts);
            if leader_count - runner_up_count >= config.voting_k {
                let vote_result = VoteResult {
                    output: hash_to_output[&leader_hash].clone(),
                    cost_usd: hash_to_cost[&leader_hash],
                    canonical_hash: leader_hash,
                    total_samples,
                    red_flagged,
                    vote_counts: vote_counts.into_iter().collect(),
                };
                events.emit(Event::VoteCompleted {
                    timestamp: now_timestamp(),
                    step: step.step,
                    winner: vote_result.output.clone(),
                    total_samples: vote_result.total_samples,
                    red_flagged: vote_result.red_flagged,
                });
                return Ok(vote_result);
            }
        }

        Err(VoteError::NoLeadReached {
            step: step.step,
            max_voting_samples: config.max_voting_samples,
            voting_k: config.voting_k,
        })
    }
}

/// The leading hash plus its count, and the runner-up's count (`0` if only
/// one hash has been seen so far). Ties broken by first-observed-hash-wins:
/// a stable sort on count preserves `vote_counts`' insertion order among
/// equal counts, mirroring `Counter.most_common`'s tie behavior.
fn ranked_top_two(vote_counts: &IndexMap<String, usize>) -> (String, usize, usize) {
    let mut entries: Vec<(&String, usize)> =
        vote_counts.iter().map(|(hash, count)| (hash, *count)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    let (leader_hash, leader_count) = entries[0];
    let runner_up_count = entries.get(1).map(|(_, count)| *count).unwrap_or(0);
    (leader_hash.clone(), leader_count, runner_up_count)
}
