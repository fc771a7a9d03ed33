//! Research state and its append-only history.

use super::task::AgentTask;
use im::Vector;

/// One record in the research history.
///
/// Entries carry their iteration and task so they stand alone regardless of
/// the order concurrent tasks finished in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEntry {
    /// The reflector's thought at the start of an iteration
    Thought { iteration: u32, text: String },
    /// A dispatched task and what it found
    Action {
        iteration: u32,
        task: AgentTask,
        finding: String,
        succeeded: bool,
    },
}

impl HistoryEntry {
    pub fn iteration(&self) -> u32 {
        match self {
            HistoryEntry::Thought { iteration, .. } | HistoryEntry::Action { iteration, .. } => {
                *iteration
            }
        }
    }
}

/// Append-only log shared structurally between snapshots.
///
/// Cloning is O(1); appending to a clone never changes the original.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: Vector<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new log with `entry` appended.
    pub fn with(&self, entry: HistoryEntry) -> Self {
        let mut entries = self.entries.clone();
        entries.push_back(entry);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Entries recorded during `iteration`, in order.
    pub fn for_iteration(&self, iteration: u32) -> impl Iterator<Item = &HistoryEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.iteration() == iteration)
    }
}

/// Everything the research loop knows.
///
/// Only the loop mutates it. `iteration` never decreases and `complete`,
/// once set, stays set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchState {
    query: String,
    background_context: String,
    history: History,
    iteration: u32,
    complete: bool,
}

impl ResearchState {
    pub fn new(query: impl Into<String>, background_context: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            background_context: background_context.into(),
            history: History::new(),
            iteration: 0,
            complete: false,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn background_context(&self) -> &str {
        &self.background_context
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Number of iterations started so far.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Successful findings in history order.
    pub fn findings(&self) -> Vec<&str> {
        self.history
            .iter()
            .filter_map(|entry| match entry {
                HistoryEntry::Action {
                    finding,
                    succeeded: true,
                    ..
                } => Some(finding.as_str()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn begin_iteration(&mut self) -> u32 {
        self.iteration += 1;
        self.iteration
    }

    pub(crate) fn record(&mut self, entry: HistoryEntry) {
        self.history = self.history.with(entry);
    }

    pub(crate) fn mark_complete(&mut self) {
        self.complete = true;
    }
}
