use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::agent_runner::AgentRunner;
use crate::canonical;
use crate::events::{now_timestamp, Event, EventBus};
use crate::models::{PlanStep, TaskConfig, VoteResult};
use crate::red_flag;

use super::{VoteError, Voter};

/// Runs one agent with retries. No voting, just the first usable result.
pub struct NoVoter {
    runner: Arc<AgentRunner>,
}

impl NoVoter {
    pub fn new(runner: Arc<AgentRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Voter for NoVoter {
    async fn vote(
        &self,
        step: &PlanStep,
        context: &str,
        config: &TaskConfig,
        events: &EventBus,
    ) -> Result<VoteResult, VoteError> {
        let max_attempts = config.step_max_retries + 1;
        let mut total_samples = 0;
        let mut red_flagged = 0;

        for sample_index in 0..max_attempts {
            let result = self.runner.run(step, context, config).await;
            total_samples += 1;

            let (flagged, reason) = red_flag::check_with_reason(&result);
            if flagged {
                red_flagged += 1;
                events.emit(Event::AgentSampleRedFlagged {
                    timestamp: now_timestamp(),
                    step: step.step,
                    sample_index,
                    reason,
                });
                continue;
            }

            events.emit(Event::AgentSampleCompleted {
                timestamp: now_timestamp(),
                step: step.step,
                sample_index,
                output: result.output.clone(),
                cost_usd: result.cost_usd,
                duration_ms: result.duration_ms,
            });

            let hash = canonical::hash(&result.output);
            let mut vote_counts = HashMap::new();
            vote_counts.insert(hash.clone(), 1);

            let vote_result = VoteResult {
                output: result.output,
                canonical_hash: hash,
                total_samples,
                red_flagged,
                vote_counts,
                cost_usd: result.cost_usd,
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

        Err(VoteError::RetriesExhausted {
            step: step.step,
            attempts: max_attempts,
        })
    }
}
