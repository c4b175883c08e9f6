use thiserror::Error;

/// Raised when a freshly-parsed YAML value can't become a [`crate::models::Plan`].
#[derive(Debug, Error)]
pub enum PlanParseError {
    #[error("Plan must be a dict")]
    NotAMapping,
    #[error("Plan must have 'reasoning' field")]
    MissingReasoning,
    #[error("Plan must have 'plan' or 'steps' field")]
    MissingStepList,
    #[error("'plan'/'steps' must be a list")]
    StepListNotAList,
    #[error("step is missing required field '{0}'")]
    MissingField(String),
    #[error("step field '{field}' has the wrong type: {message}")]
    WrongFieldType { field: String, message: String },
}

/// Raised when the planner's model call itself comes back unusable.
#[derive(Debug, Error)]
pub enum PlannerRunError {
    #[error("No AssistantMessage received from SDK")]
    NoAssistantMessage,
    #[error("No TextBlock found in final AssistantMessage")]
    NoTextBlock,
    #[error(transparent)]
    YamlParse(#[from] crate::yaml_repair::YamlParseError),
    #[error(transparent)]
    PlanParse(#[from] PlanParseError),
}
