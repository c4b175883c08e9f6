mod client;

pub use client::{AgentClient, AgentMessage, AgentRequest, ContentBlock, ResultSubtype};

use std::sync::Arc;

use futures::StreamExt;
use indoc::formatdoc;

use crate::models::{AgentResult, PlanStep, TaskConfig};
use crate::yaml_repair::{self, YamlRepairer};

/// Drives one isolated model-driven agent sample for a single step.
pub struct AgentRunner {
    client: Arc<dyn AgentClient>,
    repairer: Arc<dyn YamlRepairer>,
}

impl AgentRunner {
    pub fn new(client: Arc<dyn AgentClient>, repairer: Arc<dyn YamlRepairer>) -> Self {
        Self { client, repairer }
    }

    /// Builds the step prompt, invokes the client, and parses the result
    /// through the YAML repair pipeline.
    pub async fn run(&self, step: &PlanStep, context: &str, config: &TaskConfig) -> AgentResult {
        let prompt = build_prompt(step, context);

        let mut allowed_tools = step.primary_tools.clone();
        allowed_tools.extend(step.fallback_tools.clone());
        if !allowed_tools.iter().any(|t| t == "AskUserQuestion") {
            allowed_tools.push("AskUserQuestion".to_string());
        }

        let request = AgentRequest {
            prompt,
            system_prompt: String::new(),
            allowed_tools,
            model: config.model_name.clone(),
        };

        let mut stream = self.client.run(request).await;

        let mut assistant_messages: Vec<Vec<ContentBlock>> = Vec::new();
        let mut result_message: Option<(f64, u64, ResultSubtype)> = None;

        while let Some(message) = stream.next().await {
            match message {
                AgentMessage::Assistant { content } => assistant_messages.push(content),
                AgentMessage::Result {
                    total_cost_usd,
                    duration_ms,
                    subtype,
                } => result_message = Some((total_cost_usd, duration_ms, subtype)),
            }
        }

        let (cost_usd, duration_ms) = result_message
            .map(|(cost, duration, _)| (cost, duration))
            .unwrap_or((0.0, 0));

        if assistant_messages.is_empty() {
            return AgentResult::error("No assistant messages received", cost_usd, duration_ms);
        }

        if let Some((_, _, ResultSubtype::Error)) = result_message {
            return AgentResult::error("Agent returned error status", cost_usd, duration_ms);
        }

        let raw_text = assistant_messages
            .last()
            .expect("checked non-empty above")
            .iter()
            .rev()
            .find_map(|block| match block {
                ContentBlock::Text(text) => Some(text.clone()),
                ContentBlock::ToolUse(_) => None,
            })
            .unwrap_or_default();

        match yaml_repair::parse(&raw_text, self.repairer.as_ref()).await {
            Ok((output, was_repaired)) => AgentResult {
                output,
                raw_response: raw_text,
                was_repaired,
                cost_usd,
                duration_ms,
                tokens: 0,
                error: None,
            },
            Err(e) => {
                let mut result =
                    AgentResult::error(format!("YAML parse error: {e}"), cost_usd, duration_ms);
                result.raw_response = raw_text;
                result
            }
        }
    }
}

fn build_prompt(step: &PlanStep, context: &str) -> String {
    let context = if context.is_empty() { "None" } else { context };
    formatdoc! {"
        {task_description}

        Context:
        {context}

        Output schema:
        {output_schema}
    ",
        task_description = step.task_description,
        context = context,
        output_schema = step.output_schema,
    }
}
