use serde_json::Value;

use crate::models::{Plan, PlanStep, TaskType};

use super::error::PlanParseError;

/// Parses a raw YAML-as-JSON value into a [`Plan`], mapping the wire
/// format's `plan` key onto `steps` (falling back to a literal `steps` key).
pub fn parse_plan(raw: &Value) -> Result<Plan, PlanParseError> {
    let map = raw.as_object().ok_or(PlanParseError::NotAMapping)?;

    let reasoning = map
        .get("reasoning")
        .ok_or(PlanParseError::MissingReasoning)?
        .as_str()
        .ok_or_else(|| PlanParseError::WrongFieldType {
            field: "reasoning".to_string(),
            message: "expected a string".to_string(),
        })?
        .to_string();

    let step_list = map
        .get("plan")
        .or_else(|| map.get("steps"))
        .ok_or(PlanParseError::MissingStepList)?
        .as_array()
        .ok_or(PlanParseError::StepListNotAList)?;

    let steps = step_list
        .iter()
        .map(parse_step)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Plan { reasoning, steps })
}

fn parse_step(raw: &Value) -> Result<PlanStep, PlanParseError> {
    let map = raw.as_object().ok_or(PlanParseError::NotAMapping)?;

    let field = |name: &str| -> Result<&Value, PlanParseError> {
        map.get(name)
            .ok_or_else(|| PlanParseError::MissingField(name.to_string()))
    };

    let as_str = |name: &str| -> Result<String, PlanParseError> {
        field(name)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| wrong_type(name, "a string"))
    };

    let as_i64 = |name: &str| -> Result<i64, PlanParseError> {
        field(name)?
            .as_i64()
            .ok_or_else(|| wrong_type(name, "an integer"))
    };

    let as_str_list = |name: &str| -> Result<Vec<String>, PlanParseError> {
        field(name)?
            .as_array()
            .ok_or_else(|| wrong_type(name, "a list"))?
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| wrong_type(name, "a list of strings"))
            })
            .collect()
    };

    let task_type = match as_str("task_type")?.as_str() {
        "action_step" => TaskType::ActionStep,
        "conditional_step" => TaskType::ConditionalStep,
        other => {
            return Err(PlanParseError::WrongFieldType {
                field: "task_type".to_string(),
                message: format!("unknown task_type '{other}'"),
            })
        }
    };

    Ok(PlanStep {
        step: as_i64("step")?,
        task_type,
        title: as_str("title")?,
        task_description: as_str("task_description")?,
        output_schema: as_str("output_schema")?,
        primary_tools: as_str_list("primary_tools")?,
        fallback_tools: as_str_list("fallback_tools")?,
        primary_tool_instructions: as_str("primary_tool_instructions")?,
        fallback_tool_instructions: as_str("fallback_tool_instructions")?,
        input_variables: as_str_list("input_variables")?,
        output_variable: as_str("output_variable")?,
        next_step_sequence_number: as_i64("next_step_sequence_number")?,
    })
}

fn wrong_type(field: &str, expected: &str) -> PlanParseError {
    PlanParseError::WrongFieldType {
        field: field.to_string(),
        message: format!("expected {expected}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_plan_key_as_steps() {
        let raw = json!({
            "reasoning": "because",
            "plan": [{
                "step": 0,
                "task_type": "action_step",
                "title": "t",
                "task_description": "d",
                "output_schema": "s",
                "primary_tools": [],
                "fallback_tools": [],
                "primary_tool_instructions": "",
                "fallback_tool_instructions": "",
                "input_variables": [],
                "output_variable": "step_0_output",
                "next_step_sequence_number": -1,
            }]
        });
        let plan = parse_plan(&raw).unwrap();
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].task_type, TaskType::ActionStep);
    }

    #[test]
    fn missing_reasoning_fails() {
        let raw = json!({"plan": []});
        let err = parse_plan(&raw).unwrap_err();
        assert!(matches!(err, PlanParseError::MissingReasoning));
    }

    #[test]
    fn missing_step_field_fails() {
        let raw = json!({
            "reasoning": "because",
            "plan": [{"step": 0}]
        });
        let err = parse_plan(&raw).unwrap_err();
        assert!(matches!(err, PlanParseError::MissingField(_)));
    }
}
