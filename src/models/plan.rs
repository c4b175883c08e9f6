use serde::{Deserialize, Serialize};

/// Sentinel values for [`PlanStep::next_step_sequence_number`].
pub const NEXT_STEP_TERMINAL: i64 = -1;
pub const NEXT_STEP_CONDITIONAL: i64 = -2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    ActionStep,
    ConditionalStep,
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ActionStep => "action_step",
            Self::ConditionalStep => "conditional_step",
        };
        write!(f, "{s}")
    }
}

/// One unit of work in a [`Plan`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub step: i64,
    pub task_type: TaskType,
    pub title: String,
    pub task_description: String,
    pub output_schema: String,
    #[serde(default)]
    pub primary_tools: Vec<String>,
    #[serde(default)]
    pub fallback_tools: Vec<String>,
    #[serde(default)]
    pub primary_tool_instructions: String,
    #[serde(default)]
    pub fallback_tool_instructions: String,
    #[serde(default)]
    pub input_variables: Vec<String>,
    pub output_variable: String,
    pub next_step_sequence_number: i64,
}

/// An ordered sequence of steps the executor walks by following
/// `next_step_sequence_number` pointers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub reasoning: String,
    pub steps: Vec<PlanStep>,
}

impl Plan {
    /// Look up a step by its `step` id.
    pub fn step(&self, step_id: i64) -> Option<&PlanStep> {
        self.steps.iter().find(|s| s.step == step_id)
    }

    /// The step that starts execution, i.e. the one numbered `0`.
    pub fn first_step(&self) -> Option<&PlanStep> {
        self.step(0)
    }
}
