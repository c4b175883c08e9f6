use serde_json::{json, Value};

use crate::models::VotingSummary;

/// Accumulates per-step outcomes and running totals across one task run.
pub struct ResultCollector {
    instruction: String,
    steps: Vec<Value>,
    total_cost_usd: f64,
    total_duration_ms: u64,
}

/// The `TaskCompleted.result` payload, plus the totals the event's own
/// `total_cost_usd`/`total_duration_ms` fields duplicate.
pub struct FinalizedResult {
    pub value: Value,
    pub total_cost_usd: f64,
    pub total_duration_ms: u64,
}

impl ResultCollector {
    pub fn new(instruction: String) -> Self {
        Self {
            instruction,
            steps: Vec::new(),
            total_cost_usd: 0.0,
            total_duration_ms: 0,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_step(
        &mut self,
        step: i64,
        title: String,
        output: Value,
        voting_summary: VotingSummary,
        cost_usd: f64,
        duration_ms: u64,
    ) {
        self.steps.push(json!({
            "step": step,
            "title": title,
            "output": output,
            "voting": {
                "strategy": voting_summary.strategy,
                "samples": voting_summary.total_samples,
                "red_flagged": voting_summary.red_flagged,
                "winning_votes": voting_summary.winning_votes,
            },
            "cost_usd": cost_usd,
            "duration_ms": duration_ms,
        }));
        self.total_cost_usd += cost_usd;
        self.total_duration_ms += duration_ms;
    }

    pub fn finalize(self, status: &str) -> FinalizedResult {
        let value = json!({
            "task": self.instruction,
            "status": status,
            "steps": self.steps,
            "total_cost_usd": self.total_cost_usd,
            "total_duration_ms": self.total_duration_ms,
        });
        FinalizedResult {
            value,
            total_cost_usd: self.total_cost_usd,
            total_duration_ms: self.total_duration_ms,
        }
    }
}
