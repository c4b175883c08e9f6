mod context_builder;
mod result_collector;

pub use context_builder::{build as build_context, ContextBuildError};
pub use result_collector::{FinalizedResult, ResultCollector};

use std::collections::HashMap;
use std::sync::Arc;

use async_stream::stream;
use futures::{Stream, StreamExt};
use serde_json::Value;

use crate::events::{now_timestamp, Event, EventBus};
use crate::models::{Plan, PlanStep, TaskConfig, TaskType};
use crate::voting::Voter;

/// Walks a validated [`Plan`] by `next_step_sequence_number` pointers,
/// invoking the voter once per step and accumulating outputs into
/// `step_outputs`, which grows monotonically and is never overwritten.
pub struct ExecutorModule {
    config: Arc<TaskConfig>,
    plan: Arc<Plan>,
    voter: Arc<dyn Voter>,
}

impl ExecutorModule {
    pub fn new(config: Arc<TaskConfig>, plan: Arc<Plan>, voter: Arc<dyn Voter>) -> Self {
        Self {
            config,
            plan,
            voter,
        }
    }

    /// Runs the plan to completion, yielding `StepStarted`, every event the
    /// voter emits for that step, and `StepCompleted`/`StepFailed` in
    /// sequence, finishing with `TaskCompleted` or (on the first failure)
    /// `TaskFailed` — then ending the stream.
    pub fn run(self) -> impl Stream<Item = Event> {
        stream! {
            let step_map: HashMap<i64, &PlanStep> =
                self.plan.steps.iter().map(|s| (s.step, s)).collect();
            let mut step_outputs: HashMap<String, Value> = HashMap::new();
            let mut collector = ResultCollector::new(self.config.instruction.clone());
            let mut current = 0i64;

            while current >= 0 {
                let Some(&step) = step_map.get(&current) else {
                    let error = format!("Step {current} not found in plan");
                    log::error!("{error}");
                    yield Event::StepFailed {
                        timestamp: now_timestamp(),
                        step: current,
                        title: "unknown".to_string(),
                        error: error.clone(),
                    };
                    yield Event::TaskFailed {
                        timestamp: now_timestamp(),
                        error,
                        step: current,
                    };
                    return;
                };

                yield Event::StepStarted {
                    timestamp: now_timestamp(),
                    step: step.step,
                    title: step.title.clone(),
                };

                let context = match context_builder::build(step, &step_outputs) {
                    Ok(context) => context,
                    Err(e) => {
                        let error = e.to_string();
                        log::warn!("step {} context build failed: {error}", step.step);
                        yield Event::StepFailed {
                            timestamp: now_timestamp(),
                            step: step.step,
                            title: step.title.clone(),
                            error: error.clone(),
                        };
                        yield Event::TaskFailed {
                            timestamp: now_timestamp(),
                            error,
                            step: step.step,
                        };
                        return;
                    }
                };

                // A fresh bus per step: the voter emits its per-sample events
                // onto it synchronously as it runs, and they're all already
                // buffered by the time `vote` resolves, so draining after
                // `shutdown` replays them in emission order with no need for
                // concurrent polling.
                let mut bus = EventBus::new();
                let mut sub = Box::pin(bus.subscribe());
                let start = std::time::Instant::now();
                let vote_outcome = self.voter.vote(step, &context, &self.config, &bus).await;
                bus.shutdown();
                let duration_ms = start.elapsed().as_millis() as u64;

                while let Some(event) = sub.next().await {
                    yield event;
                }

                let vote_result = match vote_outcome {
                    Ok(vote_result) => vote_result,
                    Err(e) => {
                        let error = e.to_string();
                        log::warn!("step {} voting failed: {error}", step.step);
                        yield Event::StepFailed {
                            timestamp: now_timestamp(),
                            step: step.step,
                            title: step.title.clone(),
                            error: error.clone(),
                        };
                        yield Event::TaskFailed {
                            timestamp: now_timestamp(),
                            error,
                            step: step.step,
                        };
                        return;
                    }
                };

                step_outputs.insert(step.output_variable.clone(), vote_result.output.clone());

                let next = if step.task_type == TaskType::ConditionalStep {
                    match vote_result.output.get("next_step").and_then(Value::as_i64) {
                        Some(next_step) => next_step,
                        None => {
                            let error =
                                "Conditional step output missing 'next_step' field".to_string();
                            log::warn!("step {}: {error}", step.step);
                            yield Event::StepFailed {
                                timestamp: now_timestamp(),
                                step: step.step,
                                title: step.title.clone(),
                                error: error.clone(),
                            };
                            yield Event::TaskFailed {
                                timestamp: now_timestamp(),
                                error,
                                step: step.step,
                            };
                            return;
                        }
                    }
                } else {
                    step.next_step_sequence_number
                };

                let summary = vote_result.summary(self.config.voting_strategy.to_string());
                yield Event::StepCompleted {
                    timestamp: now_timestamp(),
                    step: step.step,
                    title: step.title.clone(),
                    output: vote_result.output.clone(),
                    voting_summary: summary.clone(),
                    cost_usd: vote_result.cost_usd,
                    duration_ms,
                };
                collector.add_step(
                    step.step,
                    step.title.clone(),
                    vote_result.output.clone(),
                    summary,
                    vote_result.cost_usd,
                    duration_ms,
                );

                current = next;
            }

            let result = collector.finalize("completed");
            yield Event::TaskCompleted {
                timestamp: now_timestamp(),
                result: result.value,
                total_cost_usd: result.total_cost_usd,
                total_duration_ms: result.total_duration_ms,
            };
        }
    }
}
