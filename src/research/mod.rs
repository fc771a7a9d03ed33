//! Gap-driven research loop.
//!
//! Each iteration asks a [`Reflector`] for a thought and a [`GapEvaluator`]
//! for a completeness judgment plus outstanding knowledge gaps. Unless the
//! research is complete, the first unaddressed gap is turned into a small
//! batch of [`AgentTask`]s by a [`TaskPlanner`], the batch runs concurrently
//! through the [`Toolbox`], and every result is appended to the history.

mod config;
mod state;
mod task;

pub use config::ResearchConfig;
pub use state::{History, HistoryEntry, ResearchState};
pub use task::{AgentTask, Capability, MAX_TASKS_PER_ITERATION, TaskExecutor, TaskPlan, Toolbox};

use crate::error::{BoxError, Error, Result};
use crate::events::{ResearchCallbacks, ResearchEvent, logging_callbacks};
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::Instant;

/// Gaps beyond this many in one assessment are ignored.
pub const MAX_OUTSTANDING_GAPS: usize = 3;

/// Completeness judgment for the current state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GapAssessment {
    pub research_complete: bool,
    #[serde(default)]
    pub outstanding_gaps: Vec<String>,
}

impl GapAssessment {
    pub fn complete() -> Self {
        Self {
            research_complete: true,
            outstanding_gaps: Vec::new(),
        }
    }

    pub fn gaps<I, S>(gaps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            research_complete: false,
            outstanding_gaps: gaps.into_iter().map(Into::into).collect(),
        }
    }
}

/// Shares its latest thoughts on the research so far.
#[async_trait]
pub trait Reflector: Send + Sync {
    /// On the first iteration the history is empty and the answer should be
    /// start-up guidance.
    async fn reflect(&self, state: &ResearchState) -> std::result::Result<String, BoxError>;
}

/// Judges completeness and lists what is still missing.
#[async_trait]
pub trait GapEvaluator: Send + Sync {
    async fn assess(&self, state: &ResearchState) -> std::result::Result<GapAssessment, BoxError>;
}

/// Turns one knowledge gap into tasks.
#[async_trait]
pub trait TaskPlanner: Send + Sync {
    async fn plan(&self, gap: &str, state: &ResearchState) -> std::result::Result<TaskPlan, BoxError>;
}

/// The external collaborators a research loop depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub reflector: Arc<dyn Reflector>,
    pub evaluator: Arc<dyn GapEvaluator>,
    pub planner: Arc<dyn TaskPlanner>,
    pub toolbox: Toolbox,
}

/// Why the loop stopped. Every variant is a normal termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The evaluator judged the research complete
    Complete,
    /// The evaluator reported no outstanding gaps
    NoGaps,
    /// `max_iterations` was reached. Budgets are checked before an iteration
    /// begins, so the findings of the last iteration were never assessed.
    IterationBudget,
    /// `max_time` elapsed
    TimeBudget,
}

/// Terminal state of a research run.
#[derive(Debug, Clone)]
pub struct ResearchOutcome {
    pub state: ResearchState,
    pub stop_reason: StopReason,
    pub tasks_dispatched: usize,
}

impl ResearchOutcome {
    pub fn iterations(&self) -> u32 {
        self.state.iteration()
    }

    /// Successful findings in history order.
    pub fn findings(&self) -> Vec<&str> {
        self.state.findings()
    }
}

/// Drives the research state machine.
pub struct ResearchLoop {
    config: ResearchConfig,
    collaborators: Collaborators,
    callbacks: ResearchCallbacks,
}

impl ResearchLoop {
    pub fn new(config: ResearchConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            callbacks: ResearchCallbacks::default(),
        }
    }

    /// Log every research event through `tracing`.
    pub fn verbose(mut self, enabled: bool) -> Self {
        if enabled {
            self.callbacks = logging_callbacks();
        }
        self
    }

    /// Replace the event callbacks.
    pub fn callbacks(mut self, callbacks: ResearchCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    fn emit(&self, event: ResearchEvent) {
        self.callbacks.emit(&event);
    }

    /// Iterate until the research is complete or a budget runs out.
    pub async fn run(&self, query: &str, background_context: &str) -> Result<ResearchOutcome> {
        let started = Instant::now();
        let mut state = ResearchState::new(query, background_context);
        let mut addressed: HashSet<String> = HashSet::new();
        let mut tasks_dispatched = 0;

        let stop_reason = loop {
            if state.iteration() >= self.config.max_iterations {
                break StopReason::IterationBudget;
            }
            if let Some(budget) = self.config.max_time
                && started.elapsed() >= budget
            {
                break StopReason::TimeBudget;
            }

            let iteration = state.begin_iteration();
            self.emit(ResearchEvent::IterationStart {
                query: state.query().to_string(),
                iteration,
                max_iterations: self.config.max_iterations,
            });

            let thought = self
                .collaborators
                .reflector
                .reflect(&state)
                .await
                .map_err(|source| Error::Reflection { iteration, source })?;
            self.emit(ResearchEvent::Thought {
                iteration,
                content: thought.clone(),
            });
            state.record(HistoryEntry::Thought {
                iteration,
                text: thought,
            });

            let mut assessment = self
                .collaborators
                .evaluator
                .assess(&state)
                .await
                .map_err(|source| Error::GapEvaluation { iteration, source })?;
            assessment.outstanding_gaps.truncate(MAX_OUTSTANDING_GAPS);
            self.emit(ResearchEvent::GapsAssessed {
                iteration,
                research_complete: assessment.research_complete,
                gaps: assessment.outstanding_gaps.clone(),
            });

            if assessment.research_complete {
                state.mark_complete();
                break StopReason::Complete;
            }
            if assessment.outstanding_gaps.is_empty() {
                break StopReason::NoGaps;
            }

            let selected = select_gaps(
                &assessment.outstanding_gaps,
                &addressed,
                self.config.max_gaps_per_iteration,
            );
            let (batch, planned) = self.plan_batch(&selected, &state, &mut addressed).await?;
            self.emit(ResearchEvent::TasksPlanned {
                iteration,
                planned,
                dispatched: batch.len(),
            });

            let toolbox = &self.collaborators.toolbox;
            let results = join_all(batch.iter().map(|task| toolbox.run(task))).await;

            tasks_dispatched += batch.len();
            for (task, result) in batch.into_iter().zip(results) {
                let (finding, succeeded) = match result {
                    Ok(finding) => (finding, true),
                    Err(e) => {
                        tracing::warn!(task = %task.describe(), "task failed: {}", e);
                        (format!("task failed: {}", e), false)
                    }
                };
                self.emit(ResearchEvent::TaskCompleted {
                    iteration,
                    capability: task.capability,
                    query: task.query.clone(),
                    success: succeeded,
                });
                state.record(HistoryEntry::Action {
                    iteration,
                    task,
                    finding,
                    succeeded,
                });
            }
        };

        tracing::info!(
            iterations = state.iteration(),
            tasks = tasks_dispatched,
            "research stopped: {:?}",
            stop_reason
        );
        self.emit(ResearchEvent::ResearchFinished {
            query: state.query().to_string(),
            iterations: state.iteration(),
            reason: stop_reason,
        });

        Ok(ResearchOutcome {
            state,
            stop_reason,
            tasks_dispatched,
        })
    }

    /// Ask the planner about each selected gap until the batch is full.
    ///
    /// Returns the capped batch and how many tasks were planned in total.
    async fn plan_batch(
        &self,
        gaps: &[String],
        state: &ResearchState,
        addressed: &mut HashSet<String>,
    ) -> Result<(Vec<AgentTask>, usize)> {
        let mut batch = Vec::new();
        let mut planned = 0;

        for gap in gaps {
            if batch.len() >= MAX_TASKS_PER_ITERATION {
                break;
            }
            let plan = self
                .collaborators
                .planner
                .plan(gap, state)
                .await
                .map_err(|source| Error::TaskPlanning {
                    gap: gap.clone(),
                    source,
                })?;

            planned += plan.tasks.len();
            batch.extend(plan.tasks.into_iter().map(|mut task| {
                task.gap.get_or_insert_with(|| gap.clone());
                task
            }));
            addressed.insert(gap.clone());
        }

        batch.truncate(MAX_TASKS_PER_ITERATION);
        Ok((batch, planned))
    }
}

/// Pick up to `limit` gaps not addressed before, falling back to the first
/// gap when every outstanding one has already been tried.
fn select_gaps(gaps: &[String], addressed: &HashSet<String>, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let fresh: Vec<String> = gaps
        .iter()
        .filter(|gap| !addressed.contains(*gap))
        .take(limit)
        .cloned()
        .collect();

    if fresh.is_empty() {
        gaps.iter().take(limit).cloned().collect()
    } else {
        fresh
    }
}
