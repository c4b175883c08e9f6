mod deterministic;
mod quality;

pub use deterministic::{run_all_deterministic_checks, CheckResult};
pub use quality::{aggregate_score, QualityResult, QualityScorer, UnimplementedScorer};

use crate::events::ValidationError;
use crate::models::{Plan, TaskConfig};
use crate::registry::ToolRegistry;

/// The result of validating one plan: either it passed (with the count of
/// checks run) or it failed with one error per failing deterministic
/// check. Quality results, when requested, ride alongside but never flip
/// `passed`.
pub struct ValidationOutcome {
    pub passed: bool,
    pub checks_passed: usize,
    pub errors: Vec<ValidationError>,
    pub quality_results: Vec<QualityResult>,
}

/// Validates a plan against the registry: deterministic checks gate
/// pass/fail; quality checks, if enabled, are informational only.
pub async fn validate(
    plan: &Plan,
    registry: &ToolRegistry,
    config: &TaskConfig,
    scorer: &dyn QualityScorer,
) -> ValidationOutcome {
    let results = run_all_deterministic_checks(plan, registry);
    let failures: Vec<&CheckResult> = results.iter().filter(|r| !r.passed).collect();

    if !failures.is_empty() {
        return ValidationOutcome {
            passed: false,
            checks_passed: 0,
            errors: failures
                .into_iter()
                .map(|r| ValidationError {
                    check: r.name.to_string(),
                    message: r.message.clone(),
                })
                .collect(),
            quality_results: Vec::new(),
        };
    }

    let quality_results = if config.enable_quality_checks {
        quality::run_all(plan, scorer).await
    } else {
        Vec::new()
    };

    ValidationOutcome {
        passed: true,
        checks_passed: results.len(),
        errors: Vec::new(),
        quality_results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlanStep, TaskType};

    fn valid_plan() -> Plan {
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
    async fn valid_plan_passes_without_quality_checks() {
        let registry = ToolRegistry::new();
        let config = TaskConfig::builder("t").build().unwrap();
        let outcome = validate(&valid_plan(), &registry, &config, &UnimplementedScorer).await;
        assert!(outcome.passed);
        assert_eq!(outcome.checks_passed, 13);
        assert!(outcome.quality_results.is_empty());
    }

    #[tokio::test]
    async fn invalid_plan_fails_with_errors() {
        let mut plan = valid_plan();
        plan.reasoning = String::new();
        let registry = ToolRegistry::new();
        let config = TaskConfig::builder("t").build().unwrap();
        let outcome = validate(&plan, &registry, &config, &UnimplementedScorer).await;
        assert!(!outcome.passed);
        assert!(outcome.errors.iter().any(|e| e.check == "reasoning_present"));
    }

    #[tokio::test]
    async fn quality_checks_run_when_enabled_but_never_gate() {
        let mut plan = valid_plan();
        plan.reasoning = String::new();
        let registry = ToolRegistry::new();
        let config = TaskConfig::builder("t")
            .enable_quality_checks(true)
            .build()
            .unwrap();
        // deterministic failure still short-circuits before quality runs
        let outcome = validate(&plan, &registry, &config, &UnimplementedScorer).await;
        assert!(!outcome.passed);
        assert!(outcome.quality_results.is_empty());

        let outcome = validate(&valid_plan(), &registry, &config, &UnimplementedScorer).await;
        assert!(outcome.passed);
        assert_eq!(outcome.quality_results.len(), 6);
    }
}
