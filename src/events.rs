//! Research and assembly events and callbacks for observability.

use crate::research::{Capability, StopReason};
use std::sync::{Arc, Mutex};

/// Events emitted while researching and assembling a report.
#[derive(Debug, Clone, PartialEq)]
pub enum ResearchEvent {
    /// Starting a new research iteration on `query`
    IterationStart {
        query: String,
        iteration: u32,
        max_iterations: u32,
    },
    /// The reflector shared its latest thought
    Thought { iteration: u32, content: String },
    /// The evaluator judged completeness and listed outstanding gaps
    GapsAssessed {
        iteration: u32,
        research_complete: bool,
        gaps: Vec<String>,
    },
    /// Tasks were planned for the selected gaps
    TasksPlanned {
        iteration: u32,
        planned: usize,
        dispatched: usize,
    },
    /// A dispatched task returned (successfully or not)
    TaskCompleted {
        iteration: u32,
        capability: Capability,
        query: String,
        success: bool,
    },
    /// The research loop on `query` reached a terminal state
    ResearchFinished {
        query: String,
        iterations: u32,
        reason: StopReason,
    },
    /// About to draft a section
    SectionStart {
        index: usize,
        total: usize,
        title: String,
    },
    /// A section was consolidated, normalized and appended
    SectionAssembled {
        index: usize,
        title: String,
        new_references: usize,
    },
    /// A reference entry could not be parsed and was skipped
    ReferenceSkipped { raw: String },
    /// An error occurred
    Error { message: String },
}

/// Type alias for event callbacks
pub type EventCallback = Arc<dyn Fn(&ResearchEvent) + Send + Sync>;

/// Storage for research callbacks
#[derive(Default, Clone)]
pub struct ResearchCallbacks {
    pub on_iteration_start: Option<EventCallback>,
    pub on_thought: Option<EventCallback>,
    pub on_gaps: Option<EventCallback>,
    pub on_tasks: Option<EventCallback>,
    pub on_section: Option<EventCallback>,
    pub on_finish: Option<EventCallback>,
    pub on_error: Option<EventCallback>,
    /// Catch-all callback for any event
    pub on_event: Option<EventCallback>,
    /// Captured events, drained with [`ResearchCallbacks::take_events`]
    pub(crate) captured_events: Option<Arc<Mutex<Vec<ResearchEvent>>>>,
}

impl ResearchCallbacks {
    /// Emit an event to the appropriate callback(s)
    pub fn emit(&self, event: &ResearchEvent) {
        if let Some(ref events) = self.captured_events
            && let Ok(mut events) = events.lock()
        {
            events.push(event.clone());
        }

        let specific = match event {
            ResearchEvent::IterationStart { .. } => &self.on_iteration_start,
            ResearchEvent::Thought { .. } => &self.on_thought,
            ResearchEvent::GapsAssessed { .. } => &self.on_gaps,
            ResearchEvent::TasksPlanned { .. } | ResearchEvent::TaskCompleted { .. } => {
                &self.on_tasks
            }
            ResearchEvent::SectionStart { .. }
            | ResearchEvent::SectionAssembled { .. }
            | ResearchEvent::ReferenceSkipped { .. } => &self.on_section,
            ResearchEvent::ResearchFinished { .. } => &self.on_finish,
            ResearchEvent::Error { .. } => &self.on_error,
        };

        if let Some(cb) = specific {
            cb(event);
        }

        if let Some(cb) = &self.on_event {
            cb(event);
        }
    }

    /// Start capturing every emitted event.
    pub fn capture(mut self) -> Self {
        self.captured_events = Some(Arc::new(Mutex::new(Vec::new())));
        self
    }

    /// Take the events captured so far.
    pub fn take_events(&self) -> Vec<ResearchEvent> {
        if let Some(ref events) = self.captured_events
            && let Ok(mut events) = events.lock()
        {
            return std::mem::take(&mut *events);
        }
        Vec::new()
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let head: String = text.chars().take(max_chars).collect();
    let suffix = if text.chars().count() > max_chars { "..." } else { "" };
    format!("{}{}", head.replace('\n', "\\n"), suffix)
}

/// Create callbacks that route every event to `tracing`.
pub fn logging_callbacks() -> ResearchCallbacks {
    ResearchCallbacks {
        on_iteration_start: Some(Arc::new(|e| {
            if let ResearchEvent::IterationStart {
                query,
                iteration,
                max_iterations,
            } = e
            {
                tracing::info!("Iteration {}/{} on {}", iteration, max_iterations, preview(query, 60));
            }
        })),
        on_thought: Some(Arc::new(|e| {
            if let ResearchEvent::Thought { content, .. } = e {
                tracing::info!("Thought: {}", preview(content, 100));
            }
        })),
        on_gaps: Some(Arc::new(|e| {
            if let ResearchEvent::GapsAssessed {
                research_complete,
                gaps,
                ..
            } = e
            {
                tracing::info!(complete = research_complete, "Outstanding gaps: {}", gaps.len());
                for gap in gaps {
                    tracing::debug!("  gap: {}", preview(gap, 80));
                }
            }
        })),
        on_tasks: Some(Arc::new(|e| match e {
            ResearchEvent::TasksPlanned {
                planned, dispatched, ..
            } => {
                if planned > dispatched {
                    tracing::warn!("Planner returned {} tasks, dispatching {}", planned, dispatched);
                } else {
                    tracing::info!("Dispatching {} tasks", dispatched);
                }
            }
            ResearchEvent::TaskCompleted {
                capability,
                query,
                success,
                ..
            } => {
                let status = if *success { "✓" } else { "✗" };
                tracing::info!("{} {}({})", status, capability, preview(query, 60));
            }
            _ => {}
        })),
        on_section: Some(Arc::new(|e| match e {
            ResearchEvent::SectionStart {
                index,
                total,
                title,
            } => tracing::info!("Section {}/{}: {}", index + 1, total, title),
            ResearchEvent::SectionAssembled { new_references, .. } => {
                tracing::debug!("Section assembled, {} new references", new_references)
            }
            ResearchEvent::ReferenceSkipped { raw } => {
                tracing::warn!("Skipped reference: {}", preview(raw, 80))
            }
            _ => {}
        })),
        on_finish: Some(Arc::new(|e| {
            if let ResearchEvent::ResearchFinished {
                query,
                iterations,
                reason,
            } = e
            {
                tracing::info!(
                    "Research on {} finished after {} iterations: {:?}",
                    preview(query, 60),
                    iterations,
                    reason
                );
            }
        })),
        on_error: Some(Arc::new(|e| {
            if let ResearchEvent::Error { message } = e {
                tracing::error!("{}", message);
            }
        })),
        ..Default::default()
    }
}
