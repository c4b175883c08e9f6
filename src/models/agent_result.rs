use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The outcome of one model invocation.
///
/// `output` holds the parsed YAML-as-JSON mapping on success; on failure it
/// is `Value::Null` and `error` carries the reason. `tokens` and `cost_usd`
/// are best-effort: a terminal agent response that never arrived (or that
/// reported no usage) leaves both at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub output: Value,
    pub raw_response: String,
    pub was_repaired: bool,
    pub cost_usd: f64,
    pub duration_ms: u64,
    pub tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentResult {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(message: impl Into<String>, cost_usd: f64, duration_ms: u64) -> Self {
        Self {
            output: Value::Null,
            raw_response: String::new(),
            was_repaired: false,
            cost_usd,
            duration_ms,
            tokens: 0,
            error: Some(message.into()),
        }
    }
}
