mod error;
mod first_to_k;
mod majority;
mod no_voter;

pub use error::{VoteError, VoterFactoryError};
pub use first_to_k::FirstToKVoter;
pub use majority::MajorityVoter;
pub use no_voter::NoVoter;

use std::sync::Arc;

use async_trait::async_trait;

use crate::agent_runner::AgentRunner;
use crate::events::EventBus;
use crate::models::{PlanStep, TaskConfig, VoteResult, VotingStrategy};

/// Runs agent sample(s) for one step and returns the winning output.
#[async_trait]
pub trait Voter: Send + Sync {
    async fn vote(
        &self,
        step: &PlanStep,
        context: &str,
        config: &TaskConfig,
        events: &EventBus,
    ) -> Result<VoteResult, VoteError>;
}

/// Dispatches on [`VotingStrategy`] to build the right [`Voter`].
/// Unlike the string-keyed Python factory, an unrecognized strategy can't
/// reach this function at all (`VotingStrategy` is a closed enum) — kept
/// as a fallible constructor anyway so the error path (and its message
/// format) stays available to anything deserializing a strategy from a
/// loosely-typed config source upstream.
pub fn create_voter(strategy: VotingStrategy, runner: Arc<AgentRunner>) -> Box<dyn Voter> {
    match strategy {
        VotingStrategy::None => Box::new(NoVoter::new(runner)),
        VotingStrategy::Majority => Box::new(MajorityVoter::new(runner)),
        VotingStrategy::FirstToK => Box::new(FirstToKVoter::new(runner)),
    }
}

/// Dispatches on a raw strategy name, for config sources (CLI flags, YAML
/// config files) that carry the strategy as a string before it's parsed
/// into [`VotingStrategy`]. Grounded 1:1 on `voting/factory.py`'s
/// string-keyed dispatch and its exact error message.
pub fn create_voter_by_name(
    strategy: &str,
    runner: Arc<AgentRunner>,
) -> Result<Box<dyn Voter>, VoterFactoryError> {
    match strategy {
        "none" => Ok(Box::new(NoVoter::new(runner))),
        "majority" => Ok(Box::new(MajorityVoter::new(runner))),
        "first_to_k" => Ok(Box::new(FirstToKVoter::new(runner))),
        other => Err(VoterFactoryError::UnknownStrategy(other.to_string())),
    }
}
