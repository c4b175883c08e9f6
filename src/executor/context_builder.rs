use std::collections::{BTreeSet, HashMap};

use serde_json::Value;
use thiserror::Error;

use crate::models::PlanStep;

#[derive(Debug, Error)]
pub enum ContextBuildError {
    #[error("Step output '{name}' not found. Available: [{available}]")]
    MissingStepOutput { name: String, available: String },
}

/// Assembles the next step's context string from the accumulated outputs
/// of prior steps, by dotted-path reference in `input_variables`.
pub fn build(
    step: &PlanStep,
    step_outputs: &HashMap<String, Value>,
) -> Result<String, ContextBuildError> {
    if step.input_variables.is_empty() {
        return Ok(String::new());
    }

    let step_names: BTreeSet<&str> = step
        .input_variables
        .iter()
        .map(|var| var.split('.').next().unwrap_or(var))
        .collect();

    let mut context = serde_json::Map::new();
    for name in step_names {
        let output = step_outputs.get(name).ok_or_else(|| {
            let mut available: Vec<&String> = step_outputs.keys().collect();
            available.sort();
            ContextBuildError::MissingStepOutput {
                name: name.to_string(),
                available: available
                    .iter()
                    .map(|k| format!("'{k}'"))
                    .collect::<Vec<_>>()
                    .join(", "),
            }
        })?;
        context.insert(name.to_string(), output.clone());
    }

    let yaml = serde_yaml::to_string(&Value::Object(context))
        .expect("serializing a JSON map to YAML cannot fail");
    Ok(yaml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskType;
    use serde_json::json;

    fn step_with_vars(vars: Vec<&str>) -> PlanStep {
        PlanStep {
            step: 1,
            task_type: TaskType::ActionStep,
            title: "t".to_string(),
            task_description: "d".to_string(),
            output_schema: "s".to_string(),
            primary_tools: vec![],
            fallback_tools: vec![],
            primary_tool_instructions: String::new(),
            fallback_tool_instructions: String::new(),
            input_variables: vars.into_iter().map(String::from).collect(),
            output_variable: "step_1_output".to_string(),
            next_step_sequence_number: -1,
        }
    }

    #[test]
    fn empty_input_variables_yields_empty_context() {
        let step = step_with_vars(vec![]);
        let outputs = HashMap::new();
        assert_eq!(build(&step, &outputs).unwrap(), "");
    }

    #[test]
    fn missing_step_output_fails_with_available_list() {
        let step = step_with_vars(vec!["step_0.field"]);
        let outputs = HashMap::new();
        let err = build(&step, &outputs).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Step output 'step_0' not found. Available: []"
        );
    }

    #[test]
    fn includes_entire_output_of_each_referenced_step() {
        let step = step_with_vars(vec!["step_0.a", "step_0.b", "step_1.x"]);
        let mut outputs = HashMap::new();
        outputs.insert("step_0".to_string(), json!({"a": 1, "b": 2, "c": 3}));
        outputs.insert("step_1".to_string(), json!({"x": "y"}));
        let context = build(&step, &outputs).unwrap();
        assert!(context.contains("a: 1"));
        assert!(context.contains("c: 3"));
        assert!(context.contains("x: y"));
    }
}
