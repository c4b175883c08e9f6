mod bus;

pub use bus::EventBus;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Plan, TaskConfig, VotingSummary};

/// One entry of `ValidationFailed.errors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    pub check: String,
    pub message: String,
}

/// Seconds since the Unix epoch, for the `timestamp` field every event
/// carries. Falls back to `0.0` on a clock error rather than panicking.
pub fn now_timestamp() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// The stable, tagged event taxonomy emitted by the orchestrator.
///
/// `#[serde(tag = "type")]` gives every variant the same stable snake_case
/// `type` discriminant the original dataclasses carry as a literal field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[allow(clippy::large_enum_variant)]
pub enum Event {
    TaskSubmitted {
        timestamp: f64,
        instruction: String,
        config: TaskConfig,
    },
    PlanCreated {
        timestamp: f64,
        plan: Plan,
    },
    ValidationPassed {
        timestamp: f64,
        checks_passed: usize,
    },
    ValidationFailed {
        timestamp: f64,
        errors: Vec<ValidationError>,
    },
    StepStarted {
        timestamp: f64,
        step: i64,
        title: String,
    },
    AgentSampleCompleted {
        timestamp: f64,
        step: i64,
        sample_index: usize,
        output: Value,
        cost_usd: f64,
        duration_ms: u64,
    },
    AgentSampleRedFlagged {
        timestamp: f64,
        step: i64,
        sample_index: usize,
        reason: String,
    },
    VoteCompleted {
        timestamp: f64,
        step: i64,
        winner: Value,
        total_samples: usize,
        red_flagged: usize,
    },
    StepCompleted {
        timestamp: f64,
        step: i64,
        title: String,
        output: Value,
        voting_summary: VotingSummary,
        cost_usd: f64,
        duration_ms: u64,
    },
    StepFailed {
        timestamp: f64,
        step: i64,
        title: String,
        error: String,
    },
    TaskCompleted {
        timestamp: f64,
        result: Value,
        total_cost_usd: f64,
        total_duration_ms: u64,
    },
    TaskFailed {
        timestamp: f64,
        error: String,
        step: i64,
    },
}

impl Event {
    /// The stable snake_case tag, e.g. `"step_completed"`.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::TaskSubmitted { .. } => "task_submitted",
            Self::PlanCreated { .. } => "plan_created",
            Self::ValidationPassed { .. } => "validation_passed",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::StepStarted { .. } => "step_started",
            Self::AgentSampleCompleted { .. } => "agent_sample_completed",
            Self::AgentSampleRedFlagged { .. } => "agent_sample_red_flagged",
            Self::VoteCompleted { .. } => "vote_completed",
            Self::StepCompleted { .. } => "step_completed",
            Self::StepFailed { .. } => "step_failed",
            Self::TaskCompleted { .. } => "task_completed",
            Self::TaskFailed { .. } => "task_failed",
        }
    }
}
