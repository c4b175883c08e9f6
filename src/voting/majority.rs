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

/// Runs agents up to `max_voting_samples`, returning as soon as one hash
/// holds a strict majority of the valid samples collected so far (checked
/// only once at least `voting_n` valid samples have accumulated).
pub struct MajorityVoter {
    runner: Arc<AgentRunner>,
}

impl MajorityVoter {
    pub fn new(runner: Arc<AgentRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Voter for MajorityVoter {
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

            let valid_samples: usize = vote_counts.values().sum();
            if valid_samples >= config.voting_n {
                let (leader_hash, leader_count) = leading_hash(&vote_counts);
                if leader_count * 2 > valid_samples {
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
        }

        Err(VoteError::NoMajorityReached {
            step: step.step,
            max_voting_samples: config.max_voting_samples,
        })
    }
}

/// The hash with the highest count; ties go to whichever hash was
/// inserted first, matching `Counter.most_common`'s stable ordering.
fn leading_hash(vote_counts: &IndexMap<String, usize>) -> (String, usize) {
    let mut entries: Vec<(&String, usize)> =
        vote_counts.iter().map(|(hash, count)| (hash, *count)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    let (hash, count) = entries[0];
    (hash.clone(), count)
}
