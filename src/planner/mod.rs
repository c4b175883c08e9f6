mod error;
mod parser;

pub use error::{PlanParseError, PlannerRunError};
pub use parser::parse_plan;

use std::sync::Arc;

use futures::StreamExt;
use indoc::formatdoc;

use crate::agent_runner::{AgentClient, AgentMessage, AgentRequest, ContentBlock};
use crate::events::ValidationError;
use crate::models::{Plan, TaskConfig, ToolInfo};
use crate::registry::ToolRegistry;
use crate::yaml_repair::{self, YamlRepairer};

const SYSTEM_PROMPT: &str = indoc::indoc! {"
    You are the planning module of an autonomous task orchestrator. Given a
    natural-language instruction and a list of available tools, produce a
    plan: a sequence of steps, each either an action step or a conditional
    step, that accomplishes the instruction. Respond with YAML only.
"};

/// Drives the model to produce a [`Plan`] for a submitted instruction,
/// retrying with validation feedback when a prior attempt failed.
pub struct PlannerModule {
    registry: Arc<ToolRegistry>,
    client: Arc<dyn AgentClient>,
    repairer: Arc<dyn YamlRepairer>,
}

impl PlannerModule {
    pub fn new(
        registry: Arc<ToolRegistry>,
        client: Arc<dyn AgentClient>,
        repairer: Arc<dyn YamlRepairer>,
    ) -> Self {
        Self {
            registry,
            client,
            repairer,
        }
    }

    /// Produces one plan attempt for `instruction`. `validation_feedback`
    /// carries the previous attempt's failing checks, if any, so the model
    /// can correct course; `None` on the first attempt.
    pub async fn plan(
        &self,
        instruction: &str,
        config: &TaskConfig,
        validation_feedback: Option<&[ValidationError]>,
    ) -> Result<Plan, PlannerRunError> {
        let tools_list = self.format_tools();
        let user_prompt = build_user_prompt(instruction, &tools_list, validation_feedback);

        let request = AgentRequest {
            prompt: user_prompt,
            system_prompt: SYSTEM_PROMPT.to_string(),
            allowed_tools: Vec::new(),
            model: config.model_name.clone(),
        };

        let mut stream = self.client.run(request).await;
        let mut last_assistant: Option<Vec<ContentBlock>> = None;

        while let Some(message) = stream.next().await {
            if let AgentMessage::Assistant { content } = message {
                last_assistant = Some(content);
            }
        }

        let content = last_assistant.ok_or(PlannerRunError::NoAssistantMessage)?;
        let raw_text = content
            .iter()
            .rev()
            .find_map(|block| match block {
                ContentBlock::Text(text) => Some(text.clone()),
                ContentBlock::ToolUse(_) => None,
            })
            .ok_or(PlannerRunError::NoTextBlock)?;

        let (parsed, _was_repaired) = yaml_repair::parse(&raw_text, self.repairer.as_ref()).await?;
        let plan = parse_plan(&parsed)?;
        Ok(plan)
    }

    /// Tools sorted by name, each rendered `"- {name}: {description}"`,
    /// with `" (MCP: {server_name})"` appended when contributed by an MCP
    /// server.
    fn format_tools(&self) -> String {
        let mut tools: Vec<&ToolInfo> = self.registry.list_tools();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
            .iter()
            .map(|tool| match &tool.server_name {
                Some(server_name) => {
                    format!("- {}: {} (MCP: {server_name})", tool.name, tool.description)
                }
                None => format!("- {}: {}", tool.name, tool.description),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn build_user_prompt(
    instruction: &str,
    tools_list: &str,
    validation_feedback: Option<&[ValidationError]>,
) -> String {
    let feedback_block = validation_feedback
        .filter(|errors| !errors.is_empty())
        .map(|errors| {
            let lines: Vec<String> = errors
                .iter()
                .map(|e| format!("- {}: {}", e.check, e.message))
                .collect();
            format!(
                "\nThe previous plan failed validation:\n{}\n",
                lines.join("\n")
            )
        })
        .unwrap_or_default();

    formatdoc! {"
        Instruction:
        {instruction}

        Available tools:
        {tools_list}
        {feedback_block}
    ",
        instruction = instruction,
        tools_list = tools_list,
        feedback_block = feedback_block,
    }
}
