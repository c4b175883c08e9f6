use async_trait::async_trait;

use crate::models::{Plan, PlanStep};

const DEFAULT_MAX_K: usize = 5;

const CHECKS: &[&str] = &[
    "single_purpose",
    "self_contained",
    "max_k_tools",
    "non_overlapping",
    "maximally_decomposed",
    "appropriately_merged",
];

/// The outcome of one informational quality check. Never gates
/// `ValidationPassed`/`ValidationFailed` — for an external consumer to log
/// or display only.
#[derive(Debug, Clone)]
pub struct QualityResult {
    pub name: &'static str,
    pub score: f64,
    pub details: String,
}

/// External collaborator: scores one quality-check prompt. Out of scope
/// for this crate's own implementation — spec.md names "quality LLM-scoring
/// of plans" as an external collaborator, interface contract only.
#[async_trait]
pub trait QualityScorer: Send + Sync {
    async fn score(&self, prompt: &str) -> Result<f64, Box<dyn std::error::Error + Send + Sync>>;
}

/// A scorer that always fails, matching the original's
/// `_call_llm_for_score` before real model scoring was wired up.
pub struct UnimplementedScorer;

#[async_trait]
impl QualityScorer for UnimplementedScorer {
    async fn score(&self, _prompt: &str) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        Err("LLM scoring not yet wired up".into())
    }
}

/// Runs the six named quality checks over a plan, swallowing any scorer
/// failure as a zero-score, zero-detail result rather than letting it
/// affect validation's pass/fail outcome.
pub async fn run_all(plan: &Plan, scorer: &dyn QualityScorer) -> Vec<QualityResult> {
    let mut results = Vec::with_capacity(CHECKS.len());
    for &check_name in CHECKS {
        let prompt = build_prompt(check_name, plan);
        match scorer.score(&prompt).await {
            Ok(score) => results.push(QualityResult {
                name: check_name,
                score,
                details: format!("Score: {score}"),
            }),
            Err(_) => results.push(QualityResult {
                name: check_name,
                score: 0.0,
                details: "not scored".to_string(),
            }),
        }
    }
    results
}

/// Equally-weighted average of all quality scores; `0.0` for an empty set.
pub fn aggregate_score(results: &[QualityResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64
}

fn build_prompt(check_name: &str, plan: &Plan) -> String {
    let plan_text = plan_to_text(plan);
    if check_name == "max_k_tools" {
        format!("{check_name}(max_k={DEFAULT_MAX_K}):\n{plan_text}")
    } else {
        format!("{check_name}:\n{plan_text}")
    }
}

fn plan_to_text(plan: &Plan) -> String {
    let mut lines = vec![format!("Reasoning: {}", plan.reasoning)];
    for step in &plan.steps {
        lines.push(step_to_text(step));
    }
    lines.join("\n")
}

fn step_to_text(step: &PlanStep) -> String {
    format!(
        "Step {}: [{}] {}\n  Description: {}\n  Tools: {:?} (fallback: {:?})\n  Output: {} ({})",
        step.step,
        step.task_type,
        step.title,
        step.task_description,
        step.primary_tools,
        step.fallback_tools,
        step.output_variable,
        step.output_schema
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskType;

    fn plan() -> Plan {
        Plan {
            reasoning: "because".to_string(),
            steps: vec![PlanStep {
                step: 0,
                task_type: TaskType::ActionStep,
                title: "t".to_string(),
                task_description: "d".to_string(),
                output_schema: "s".to_string(),
                primary_tools: vec![],
                fallback_tools: vec![],
                primary_tool_instructions: String::new(),
                fallback_tool_instructions: String::new(),
                input_variables: vec![],
                output_variable: "step_0_output".to_string(),
                next_step_sequence_number: -1,
            }],
        }
    }

    #[tokio::test]
    async fn unimplemented_scorer_yields_zero_scores() {
        let results = run_all(&plan(), &UnimplementedScorer).await;
        assert_eq!(results.len(), 6);
        assert!(results.iter().all(|r| r.score == 0.0));
        assert_eq!(aggregate_score(&results), 0.0);
    }

    struct FixedScorer(f64);

    #[async_trait]
    impl QualityScorer for FixedScorer {
        async fn score(
            &self,
            _prompt: &str,
        ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn aggregate_score_averages_results() {
        let results = run_all(&plan(), &FixedScorer(0.5)).await;
        assert_eq!(aggregate_score(&results), 0.5);
    }
}
