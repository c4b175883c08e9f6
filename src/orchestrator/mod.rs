use std::sync::Arc;

use async_stream::stream;
use futures::{Stream, StreamExt};

use crate::agent_runner::{AgentClient, AgentRunner};
use crate::events::{now_timestamp, Event, ValidationError};
use crate::executor::ExecutorModule;
use crate::models::TaskConfig;
use crate::planner::PlannerModule;
use crate::registry::ToolRegistry;
use crate::validator::{self, QualityScorer, UnimplementedScorer};
use crate::voting::{create_voter, Voter};
use crate::yaml_repair::YamlRepairer;

/// Drives one task end to end: plan, validate (retrying with feedback on
/// failure), then execute — exposed as a single lazy event stream so a
/// consumer can stop pulling at any point without wasting unread work.
pub struct Orchestrator {
    config: TaskConfig,
    registry: Arc<ToolRegistry>,
    client: Arc<dyn AgentClient>,
    repairer: Arc<dyn YamlRepairer>,
    scorer: Arc<dyn QualityScorer>,
}

impl Orchestrator {
    pub fn new(
        config: TaskConfig,
        registry: Arc<ToolRegistry>,
        client: Arc<dyn AgentClient>,
        repairer: Arc<dyn YamlRepairer>,
    ) -> Self {
        Self {
            config,
            registry,
            client,
            repairer,
            scorer: Arc::new(UnimplementedScorer),
        }
    }

    /// Swaps in a real quality scorer in place of the no-op default.
    pub fn with_quality_scorer(mut self, scorer: Arc<dyn QualityScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn run(self) -> impl Stream<Item = Event> {
        stream! {
            let Orchestrator { config, registry, client, repairer, scorer } = self;
            yield Event::TaskSubmitted {
                timestamp: now_timestamp(),
                instruction: config.instruction.clone(),
                config: config.clone(),
            };

            let planner = PlannerModule::new(registry.clone(), client.clone(), repairer.clone());
            let mut validated_plan = None;
            let mut last_feedback: Option<Vec<ValidationError>> = None;
            let total_attempts = config.max_planner_retries + 1;

            for _attempt in 0..total_attempts {
                let plan = match planner
                    .plan(&config.instruction, &config, last_feedback.as_deref())
                    .await
                {
                    Ok(plan) => plan,
                    Err(e) => {
                        // A planner run failure (model error, unparsable YAML) is
                        // treated the same as a failing validation check: retry
                        // with no extra feedback rather than aborting the task,
                        // since the model may simply succeed on the next attempt.
                        log::warn!("planner attempt failed: {e}");
                        last_feedback = None;
                        continue;
                    }
                };
                yield Event::PlanCreated {
                    timestamp: now_timestamp(),
                    plan: plan.clone(),
                };

                let outcome = validator::validate(&plan, &registry, &config, scorer.as_ref()).await;
                if outcome.passed {
                    yield Event::ValidationPassed {
                        timestamp: now_timestamp(),
                        checks_passed: outcome.checks_passed,
                    };
                    validated_plan = Some(plan);
                    break;
                }

                yield Event::ValidationFailed {
                    timestamp: now_timestamp(),
                    errors: outcome.errors.clone(),
                };
                last_feedback = Some(outcome.errors);
            }

            let Some(plan) = validated_plan else {
                yield Event::TaskFailed {
                    timestamp: now_timestamp(),
                    error: format!("Plan validation failed after {total_attempts} attempts"),
                    step: -1,
                };
                return;
            };

            let runner = Arc::new(AgentRunner::new(client.clone(), repairer.clone()));
            let voter: Arc<dyn Voter> = Arc::from(create_voter(config.voting_strategy, runner));

            let executor = ExecutorModule::new(Arc::new(config), Arc::new(plan), voter);
            let exec_stream = executor.run();
            futures::pin_mut!(exec_stream);
            while let Some(event) = exec_stream.next().await {
                yield event;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_runner::{AgentMessage, AgentRequest, ContentBlock, ResultSubtype};
    use crate::models::VotingStrategy;
    use crate::yaml_repair::UnimplementedRepairer;
    use async_trait::async_trait;
    use futures::stream::{self, BoxStream};
    use indoc::indoc;

    const PLAN_YAML: &str = indoc! {"
        reasoning: a single step plan
        steps:
          - step: 0
            task_type: action_step
            title: do the thing
            task_description: do it
            output_schema: '{}'
            output_variable: step_0_output
            next_step_sequence_number: -1
    "};

    const AGENT_OUTPUT: &str = "result: done";

    /// A client that hands back a fixed plan on its first call and a fixed
    /// agent result on every call after that, regardless of which step.
    struct ScriptedClient;

    #[async_trait]
    impl AgentClient for ScriptedClient {
        async fn run(&self, request: AgentRequest) -> BoxStream<'static, AgentMessage> {
            let text = if request.system_prompt.is_empty() {
                AGENT_OUTPUT.to_string()
            } else {
                PLAN_YAML.to_string()
            };
            Box::pin(stream::iter(vec![
                AgentMessage::Assistant {
                    content: vec![ContentBlock::Text(text)],
                },
                AgentMessage::Result {
                    total_cost_usd: 0.01,
                    duration_ms: 1,
                    subtype: ResultSubtype::Success,
                },
            ]))
        }
    }

    #[tokio::test]
    async fn happy_path_completes_the_task() {
        let config = TaskConfig::builder("run a single step")
            .voting_strategy(VotingStrategy::None)
            .build()
            .unwrap();
        let orchestrator = Orchestrator::new(
            config,
            Arc::new(ToolRegistry::new()),
            Arc::new(ScriptedClient),
            Arc::new(UnimplementedRepairer),
        );

        let stream = orchestrator.run();
        futures::pin_mut!(stream);
        let mut tags = Vec::new();
        while let Some(event) = stream.next().await {
            tags.push(event.tag());
        }

        assert_eq!(tags.first(), Some(&"task_submitted"));
        assert!(tags.contains(&"plan_created"));
        assert!(tags.contains(&"validation_passed"));
        assert_eq!(tags.last(), Some(&"task_completed"));
    }

    struct AlwaysFailingClient;

    #[async_trait]
    impl AgentClient for AlwaysFailingClient {
        async fn run(&self, _request: AgentRequest) -> BoxStream<'static, AgentMessage> {
            Box::pin(stream::empty())
        }
    }

    #[tokio::test]
    async fn planner_never_producing_an_assistant_message_fails_the_task() {
        let config = TaskConfig::builder("do something")
            .max_planner_retries(1)
            .build()
            .unwrap();
        let orchestrator = Orchestrator::new(
            config,
            Arc::new(ToolRegistry::new()),
            Arc::new(AlwaysFailingClient),
            Arc::new(UnimplementedRepairer),
        );

        let stream = orchestrator.run();
        futures::pin_mut!(stream);
        let mut events = Vec::new();
        while let Some(event) = stream.next().await {
            events.push(event);
        }

        assert!(matches!(events.last(), Some(Event::TaskFailed { .. })));
    }
}
