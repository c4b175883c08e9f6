use std::collections::{HashMap, HashSet, VecDeque};

use crate::models::{Plan, PlanStep, TaskType};
use crate::registry::ToolRegistry;

/// The outcome of one deterministic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    pub message: String,
}

impl CheckResult {
    fn pass(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            message: message.into(),
        }
    }

    fn fail(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            message: message.into(),
        }
    }
}

/// Every field of [`PlanStep`] is required by the type itself — a `Plan`
/// couldn't deserialize with one missing — so this check can only ever
/// pass. Kept as its own check (rather than folded away) since it's
/// check #1 in the fixed, numbered sequence every caller expects.
pub fn check_required_fields(_plan: &Plan) -> CheckResult {
    CheckResult::pass("required_fields", "All required fields present")
}

pub fn check_step_numbering(plan: &Plan) -> CheckResult {
    let mut step_numbers: Vec<i64> = plan.steps.iter().map(|s| s.step).collect();
    step_numbers.sort();
    let expected: Vec<i64> = (0..plan.steps.len() as i64).collect();
    if step_numbers != expected {
        if let Some(&first) = step_numbers.first() {
            if first != 0 {
                return CheckResult::fail(
                    "step_numbering",
                    format!("Steps must start at 0, got {first}"),
                );
            }
        }
        return CheckResult::fail(
            "step_numbering",
            format!(
                "Steps not sequential — expected {expected:?}, got {step_numbers:?}. Gap in numbering."
            ),
        );
    }
    CheckResult::pass("step_numbering", "Step numbering is sequential")
}

pub fn check_task_type_valid(plan: &Plan) -> CheckResult {
    for step in &plan.steps {
        // TaskType is a closed Rust enum deserialized from `{action_step,
        // conditional_step}`; any other tag fails at deserialization, so
        // every step here is already one of the two valid variants.
        let _ = step.task_type;
    }
    CheckResult::pass("task_type_valid", "All task types valid")
}

pub fn check_reasoning_present(plan: &Plan) -> CheckResult {
    if plan.reasoning.trim().is_empty() {
        return CheckResult::fail("reasoning_present", "Plan reasoning is empty");
    }
    CheckResult::pass("reasoning_present", "Reasoning present")
}

pub fn check_tools_mutually_exclusive(plan: &Plan) -> CheckResult {
    for step in &plan.steps {
        let primary: HashSet<&String> = step.primary_tools.iter().collect();
        let fallback: HashSet<&String> = step.fallback_tools.iter().collect();
        let overlap: Vec<&&String> = primary.intersection(&fallback).collect();
        if !overlap.is_empty() {
            let mut names: Vec<String> = overlap.iter().map(|s| s.to_string()).collect();
            names.sort();
            return CheckResult::fail(
                "tools_mutually_exclusive",
                format!(
                    "Step {} has tools in both primary and fallback: {{{}}}",
                    step.step,
                    names.join(", ")
                ),
            );
        }
    }
    CheckResult::pass("tools_mutually_exclusive", "Tools are mutually exclusive")
}

pub fn check_tools_are_valid(plan: &Plan, registry: &ToolRegistry) -> CheckResult {
    for step in &plan.steps {
        for tool in step.primary_tools.iter().chain(step.fallback_tools.iter()) {
            if !registry.validate_tool_name(tool) {
                return CheckResult::fail(
                    "tools_are_valid",
                    format!("Step {} references unknown tool '{tool}'", step.step),
                );
            }
        }
    }
    CheckResult::pass("tools_are_valid", "All tools are valid")
}

pub fn check_conditional_step_no_tools(plan: &Plan) -> CheckResult {
    for step in &plan.steps {
        if step.task_type == TaskType::ConditionalStep
            && (!step.primary_tools.is_empty() || !step.fallback_tools.is_empty())
        {
            return CheckResult::fail(
                "conditional_step_no_tools",
                format!("Conditional step {} must not have tools", step.step),
            );
        }
    }
    CheckResult::pass("conditional_step_no_tools", "Conditional steps have no tools")
}

pub fn check_conditional_step_no_instructions(plan: &Plan) -> CheckResult {
    for step in &plan.steps {
        if step.task_type == TaskType::ConditionalStep
            && (!step.primary_tool_instructions.is_empty()
                || !step.fallback_tool_instructions.is_empty())
        {
            return CheckResult::fail(
                "conditional_step_no_instructions",
                format!(
                    "Conditional step {} must not have tool instructions",
                    step.step
                ),
            );
        }
    }
    CheckResult::pass(
        "conditional_step_no_instructions",
        "Conditional steps have no instructions",
    )
}

pub fn check_next_step_valid(plan: &Plan) -> CheckResult {
    let step_numbers: HashSet<i64> = plan.steps.iter().map(|s| s.step).collect();
    for step in &plan.steps {
        let nsn = step.next_step_sequence_number;
        // -2 is only a valid sentinel for conditional steps: it means "the
        // real next step is decided at run time", which only a
        // conditional step can produce.
        if nsn == -2 && step.task_type != TaskType::ConditionalStep {
            return CheckResult::fail(
                "next_step_valid",
                format!("Step {} points to nonexistent step {nsn}", step.step),
            );
        }
        if nsn != -1 && nsn != -2 && !step_numbers.contains(&nsn) {
            return CheckResult::fail(
                "next_step_valid",
                format!("Step {} points to nonexistent step {nsn}", step.step),
            );
        }
    }
    CheckResult::pass("next_step_valid", "All next_step references valid")
}

pub fn check_conditional_returns_minus_2(plan: &Plan) -> CheckResult {
    for step in &plan.steps {
        if step.task_type == TaskType::ConditionalStep && step.next_step_sequence_number != -2 {
            return CheckResult::fail(
                "conditional_returns_minus_2",
                format!(
                    "Conditional step {} must have next_step_sequence_number=-2, got {}",
                    step.step, step.next_step_sequence_number
                ),
            );
        }
    }
    CheckResult::pass("conditional_returns_minus_2", "Conditional steps return -2")
}

pub fn check_final_step_returns_minus_1(plan: &Plan) -> CheckResult {
    let Some(last_step) = plan.steps.iter().max_by_key(|s| s.step) else {
        return CheckResult::pass("final_step_returns_minus_1", "No steps to check");
    };
    if last_step.task_type == TaskType::ConditionalStep {
        return CheckResult::pass(
            "final_step_returns_minus_1",
            "Final step is conditional (exempt)",
        );
    }
    if last_step.next_step_sequence_number != -1 {
        return CheckResult::fail(
            "final_step_returns_minus_1",
            format!(
                "Final step {} must have next_step_sequence_number=-1",
                last_step.step
            ),
        );
    }
    CheckResult::pass("final_step_returns_minus_1", "Final step returns -1")
}

pub fn check_no_orphan_steps(plan: &Plan) -> CheckResult {
    if plan.steps.len() <= 1 {
        return CheckResult::pass("no_orphan_steps", "No orphan steps");
    }

    let step_map: HashMap<i64, &PlanStep> = plan.steps.iter().map(|s| (s.step, s)).collect();
    let mut reachable: HashSet<i64> = HashSet::from([0]);
    let mut queue: VecDeque<i64> = VecDeque::from([0]);

    while let Some(current) = queue.pop_front() {
        let Some(step) = step_map.get(&current) else {
            continue;
        };
        let nsn = step.next_step_sequence_number;
        if nsn >= 0 && reachable.insert(nsn) {
            queue.push_back(nsn);
        }
    }

    let mut orphans: Vec<i64> = plan
        .steps
        .iter()
        .map(|s| s.step)
        .filter(|s| !reachable.contains(s))
        .collect();
    if !orphans.is_empty() {
        orphans.sort();
        return CheckResult::fail(
            "no_orphan_steps",
            format!("Orphan steps not reachable from step 0: {orphans:?}"),
        );
    }
    CheckResult::pass("no_orphan_steps", "No orphan steps")
}

pub fn check_output_schema_exists(plan: &Plan) -> CheckResult {
    for step in &plan.steps {
        if step.output_schema.trim().is_empty() {
            return CheckResult::fail(
                "output_schema_exists",
                format!("Step {} has empty output_schema", step.step),
            );
        }
    }
    CheckResult::pass("output_schema_exists", "All steps have output schemas")
}

/// Runs all thirteen checks, in the fixed order the original pipeline runs
/// them in.
pub fn run_all_deterministic_checks(plan: &Plan, registry: &ToolRegistry) -> Vec<CheckResult> {
    vec![
        check_required_fields(plan),
        check_step_numbering(plan),
        check_task_type_valid(plan),
        check_reasoning_present(plan),
        check_tools_mutually_exclusive(plan),
        check_tools_are_valid(plan, registry),
        check_conditional_step_no_tools(plan),
        check_conditional_step_no_instructions(plan),
        check_next_step_valid(plan),
        check_conditional_returns_minus_2(plan),
        check_final_step_returns_minus_1(plan),
        check_no_orphan_steps(plan),
        check_output_schema_exists(plan),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(step: i64, task_type: TaskType, next: i64) -> PlanStep {
        PlanStep {
            step,
            task_type,
            title: "t".to_string(),
            task_description: "d".to_string(),
            output_schema: "s".to_string(),
            primary_tools: vec![],
            fallback_tools: vec![],
            primary_tool_instructions: String::new(),
            fallback_tool_instructions: String::new(),
            input_variables: vec![],
            output_variable: format!("step_{step}_output"),
            next_step_sequence_number: next,
        }
    }

    fn linear_plan(n: usize) -> Plan {
        let steps = (0..n as i64)
            .map(|i| {
                let next = if i == n as i64 - 1 { -1 } else { i + 1 };
                step(i, TaskType::ActionStep, next)
            })
            .collect();
        Plan {
            reasoning: "because".to_string(),
            steps,
        }
    }

    #[test]
    fn step_numbering_reports_non_zero_start() {
        let mut plan = linear_plan(2);
        plan.steps[0].step = 1;
        plan.steps[1].step = 2;
        let result = check_step_numbering(&plan);
        assert!(!result.passed);
        assert_eq!(result.message, "Steps must start at 0, got 1");
    }

    #[test]
    fn step_numbering_reports_gap() {
        let mut plan = linear_plan(3);
        plan.steps[2].step = 5;
        let result = check_step_numbering(&plan);
        assert!(!result.passed);
        assert!(result.message.contains("Gap in numbering"));
    }

    #[test]
    fn no_orphan_steps_short_circuits_for_tiny_plans() {
        let plan = linear_plan(1);
        assert!(check_no_orphan_steps(&plan).passed);
        let empty = Plan {
            reasoning: "x".to_string(),
            steps: vec![],
        };
        assert!(check_no_orphan_steps(&empty).passed);
    }

    #[test]
    fn no_orphan_steps_detects_unreachable_step() {
        let mut plan = linear_plan(3);
        plan.steps[0].next_step_sequence_number = -1;
        let result = check_no_orphan_steps(&plan);
        assert!(!result.passed);
        assert_eq!(result.message, "Orphan steps not reachable from step 0: [1, 2]");
    }

    #[test]
    fn conditional_step_pointing_elsewhere_fails_conditional_returns_minus_2() {
        let mut plan = linear_plan(2);
        plan.steps[0].task_type = TaskType::ConditionalStep;
        let result = check_conditional_returns_minus_2(&plan);
        assert!(!result.passed);
    }

    #[test]
    fn next_step_valid_rejects_minus_2_on_action_step() {
        let mut plan = linear_plan(1);
        plan.steps[0].next_step_sequence_number = -2;
        let result = check_next_step_valid(&plan);
        assert!(!result.passed);
        assert_eq!(result.message, "Step 0 points to nonexistent step -2");
    }

    #[test]
    fn all_checks_pass_for_a_clean_linear_plan() {
        let plan = linear_plan(3);
        let registry = ToolRegistry::new();
        let results = run_all_deterministic_checks(&plan, &registry);
        assert!(results.iter().all(|r| r.passed), "{results:?}");
        assert_eq!(results.len(), 13);
    }
}
