use thiserror::Error;

/// Raised when YAML cannot be parsed even after every repair stage runs.
/// This is the one internal error type this crate ever raises as a
/// `Result::Err`; callers convert it into an [`crate::models::AgentResult`]
/// error or a planner-attempt failure rather than letting it propagate.
#[derive(Debug, Error)]
pub enum YamlParseError {
    #[error("Empty or whitespace-only input")]
    Empty,

    #[error("All repair attempts failed. Original error: {original}")]
    AllStagesFailed {
        original: String,
        #[source]
        repair_error: Box<dyn std::error::Error + Send + Sync>,
    },
}
