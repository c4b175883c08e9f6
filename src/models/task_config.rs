use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One MCP server's launch configuration, as registered with a [`crate::registry::ToolRegistry`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct McpServerConfig {
    pub command: String,
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Voting strategy selector. Dispatched by [`crate::voting::create_voter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingStrategy {
    None,
    Majority,
    FirstToK,
}

impl std::fmt::Display for VotingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Majority => "majority",
            Self::FirstToK => "first_to_k",
        };
        write!(f, "{s}")
    }
}

/// Errors raised when a [`TaskConfig`] is built with inconsistent values.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskConfigError {
    #[error("voting_k must be between 1 and max_voting_samples ({max_voting_samples}), got {voting_k}")]
    InvalidVotingK {
        voting_k: usize,
        max_voting_samples: usize,
    },
    #[error("voting_n must not exceed max_voting_samples ({max_voting_samples}), got {voting_n}")]
    InvalidVotingN {
        voting_n: usize,
        max_voting_samples: usize,
    },
    #[error("max_voting_samples must be at least 1")]
    ZeroMaxVotingSamples,
}

/// The immutable job request driving one orchestrator run.
///
/// Built once via [`TaskConfigBuilder`] and never mutated afterwards; the
/// orchestrator, planner, validator, and executor all borrow it read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    pub instruction: String,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default)]
    pub voting_strategy: VotingStrategy,
    #[serde(default = "default_voting_n")]
    pub voting_n: usize,
    #[serde(default = "default_voting_k")]
    pub voting_k: usize,
    #[serde(default = "default_max_voting_samples")]
    pub max_voting_samples: usize,
    #[serde(default = "default_step_max_retries")]
    pub step_max_retries: usize,
    #[serde(default = "default_max_planner_retries")]
    pub max_planner_retries: usize,
    #[serde(default)]
    pub enable_quality_checks: bool,
    #[serde(default)]
    pub mcp_servers: HashMap<String, McpServerConfig>,
    #[serde(default)]
    pub allowed_builtin_tools: Option<Vec<String>>,
}

impl Default for VotingStrategy {
    fn default() -> Self {
        Self::None
    }
}

fn default_model_name() -> String {
    "claude-sonnet-4-5".to_string()
}
fn default_voting_n() -> usize {
    3
}
fn default_voting_k() -> usize {
    2
}
fn default_max_voting_samples() -> usize {
    10
}
fn default_step_max_retries() -> usize {
    2
}
fn default_max_planner_retries() -> usize {
    2
}

impl TaskConfig {
    pub fn builder(instruction: impl Into<String>) -> TaskConfigBuilder {
        TaskConfigBuilder::new(instruction)
    }

    /// Re-checks the `1 <= voting_k <= max_voting_samples` and
    /// `voting_n <= max_voting_samples` invariants. [`TaskConfigBuilder::build`]
    /// already runs this; callers that build a `TaskConfig` by other means
    /// (deserializing one, then overlaying CLI flags) should call it again
    /// once every field is settled.
    pub fn validate(&self) -> Result<(), TaskConfigError> {
        if self.max_voting_samples == 0 {
            return Err(TaskConfigError::ZeroMaxVotingSamples);
        }
        if self.voting_k == 0 || self.voting_k > self.max_voting_samples {
            return Err(TaskConfigError::InvalidVotingK {
                voting_k: self.voting_k,
                max_voting_samples: self.max_voting_samples,
            });
        }
        if self.voting_n > self.max_voting_samples {
            return Err(TaskConfigError::InvalidVotingN {
                voting_n: self.voting_n,
                max_voting_samples: self.max_voting_samples,
            });
        }
        Ok(())
    }
}

/// Builder enforcing the `1 <= voting_k <= max_voting_samples` and
/// `voting_n <= max_voting_samples` invariants at construction time.
pub struct TaskConfigBuilder {
    config: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            config: TaskConfig {
                instruction: instruction.into(),
                model_name: default_model_name(),
                voting_strategy: VotingStrategy::None,
                voting_n: default_voting_n(),
                voting_k: default_voting_k(),
                max_voting_samples: default_max_voting_samples(),
                step_max_retries: default_step_max_retries(),
                max_planner_retries: default_max_planner_retries(),
                enable_quality_checks: false,
                mcp_servers: HashMap::new(),
                allowed_builtin_tools: None,
            },
        }
    }

    pub fn model_name(mut self, model_name: impl Into<String>) -> Self {
        self.config.model_name = model_name.into();
        self
    }

    pub fn voting_strategy(mut self, strategy: VotingStrategy) -> Self {
        self.config.voting_strategy = strategy;
        self
    }

    pub fn voting_n(mut self, voting_n: usize) -> Self {
        self.config.voting_n = voting_n;
        self
    }

    pub fn voting_k(mut self, voting_k: usize) -> Self {
        self.config.voting_k = voting_k;
        self
    }

    pub fn max_voting_samples(mut self, max_voting_samples: usize) -> Self {
        self.config.max_voting_samples = max_voting_samples;
        self
    }

    pub fn step_max_retries(mut self, step_max_retries: usize) -> Self {
        self.config.step_max_retries = step_max_retries;
        self
    }

    pub fn max_planner_retries(mut self, max_planner_retries: usize) -> Self {
        self.config.max_planner_retries = max_planner_retries;
        self
    }

    pub fn enable_quality_checks(mut self, enable: bool) -> Self {
        self.config.enable_quality_checks = enable;
        self
    }

    pub fn mcp_servers(mut self, mcp_servers: HashMap<String, McpServerConfig>) -> Self {
        self.config.mcp_servers = mcp_servers;
        self
    }

    pub fn allowed_builtin_tools(mut self, tools: Vec<String>) -> Self {
        self.config.allowed_builtin_tools = Some(tools);
        self
    }

    pub fn build(self) -> Result<TaskConfig, TaskConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_k_above_cap() {
        let err = TaskConfig::builder("do the thing")
            .max_voting_samples(5)
            .voting_k(6)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            TaskConfigError::InvalidVotingK {
                voting_k: 6,
                max_voting_samples: 5
            }
        );
    }

    #[test]
    fn builder_rejects_zero_k() {
        let err = TaskConfig::builder("do the thing")
            .voting_k(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, TaskConfigError::InvalidVotingK { .. }));
    }

    #[test]
    fn builder_rejects_n_above_cap() {
        let err = TaskConfig::builder("do the thing")
            .max_voting_samples(5)
            .voting_n(6)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            TaskConfigError::InvalidVotingN {
                voting_n: 6,
                max_voting_samples: 5
            }
        );
    }

    #[test]
    fn builder_accepts_defaults() {
        let config = TaskConfig::builder("do the thing").build().unwrap();
        assert_eq!(config.model_name, "claude-sonnet-4-5");
        assert_eq!(config.voting_strategy, VotingStrategy::None);
    }
}
