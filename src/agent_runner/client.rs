use async_trait::async_trait;
use futures::stream::BoxStream;

/// One request to run an isolated model-driven agent sample for a single
/// step. Built by [`super::AgentRunner::run`] from the step's description,
/// the assembled context string, and the task's model name.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub prompt: String,
    /// Empty for step execution; the planner's system-level instructions
    /// when this request is built for plan generation instead.
    pub system_prompt: String,
    pub allowed_tools: Vec<String>,
    pub model: String,
}

/// A block of content inside an assistant-shaped message. Tool-use blocks
/// are carried opaquely; only text blocks matter to the agent runner's
/// "last text block of the last assistant message" rule.
#[derive(Debug, Clone)]
pub enum ContentBlock {
    Text(String),
    ToolUse(serde_json::Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSubtype {
    Success,
    Error,
}

/// One message in the stream an [`AgentClient`] yields for a single run.
#[derive(Debug, Clone)]
pub enum AgentMessage {
    Assistant {
        content: Vec<ContentBlock>,
    },
    Result {
        total_cost_usd: f64,
        duration_ms: u64,
        subtype: ResultSubtype,
    },
}

/// External collaborator: the actual model/tool-use client. Out of scope
/// for this crate (spec's "the language-model client" is named as an
/// external collaborator, interface contract only) — any embedder wires a
/// real client in here.
#[async_trait]
pub trait AgentClient: Send + Sync {
    async fn run(&self, request: AgentRequest) -> BoxStream<'static, AgentMessage>;
}
