use crate::models::AgentResult;

/// Classifies an [`AgentResult`] as usable or discardable.
///
/// Grounded on the rule that a result is unusable if the agent reported an
/// error, or if its output isn't a mapping (a bare scalar or list can't be
/// merged into `step_outputs`).
pub fn check(result: &AgentResult) -> bool {
    check_with_reason(result).0
}

/// Same as [`check`] but also returns why.
pub fn check_with_reason(result: &AgentResult) -> (bool, String) {
    if let Some(error) = &result.error {
        return (true, format!("Agent error: {error}"));
    }
    if !result.output.is_object() {
        return (
            true,
            format!("Output is not a dict (got {})", value_type_name(&result.output)),
        );
    }
    (false, String::new())
}

fn value_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "NoneType",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        serde_json::Value::Number(_) => "float",
        serde_json::Value::String(_) => "str",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok_result(output: serde_json::Value) -> AgentResult {
        AgentResult {
            output,
            raw_response: String::new(),
            was_repaired: false,
            cost_usd: 0.0,
            duration_ms: 0,
            tokens: 0,
            error: None,
        }
    }

    #[test]
    fn flags_agent_error() {
        let result = AgentResult::error("boom", 0.0, 0);
        let (flagged, reason) = check_with_reason(&result);
        assert!(flagged);
        assert_eq!(reason, "Agent error: boom");
    }

    #[test]
    fn flags_non_mapping_output() {
        let result = ok_result(json!([1, 2, 3]));
        let (flagged, reason) = check_with_reason(&result);
        assert!(flagged);
        assert_eq!(reason, "Output is not a dict (got list)");
    }

    #[test]
    fn passes_mapping_output() {
        let result = ok_result(json!({"a": 1}));
        assert!(!check(&result));
    }
}
