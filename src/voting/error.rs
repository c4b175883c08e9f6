use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VoteError {
    #[error("All {attempts} retries exhausted for step {step}")]
    RetriesExhausted { step: i64, attempts: usize },

    #[error("Reached max_voting_samples ({max_voting_samples}) with no majority for step {step}")]
    NoMajorityReached { step: i64, max_voting_samples: usize },

    #[error(
        "Reached max_voting_samples ({max_voting_samples}) without K={voting_k} lead for step {step}"
    )]
    NoLeadReached {
        step: i64,
        max_voting_samples: usize,
        voting_k: usize,
    },
}

#[derive(Debug, Error)]
pub enum VoterFactoryError {
    #[error("Unknown voting strategy: {0}")]
    UnknownStrategy(String),
}
