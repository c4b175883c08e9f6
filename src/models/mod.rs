mod agent_result;
mod plan;
mod task_config;
mod tool_info;
mod vote_result;

pub use agent_result::AgentResult;
pub use plan::{Plan, PlanStep, TaskType, NEXT_STEP_CONDITIONAL, NEXT_STEP_TERMINAL};
pub use task_config::{
    McpServerConfig, TaskConfig, TaskConfigBuilder, TaskConfigError, VotingStrategy,
};
pub use tool_info::{ToolInfo, ToolSource};
pub use vote_result::{VoteResult, VotingSummary};
