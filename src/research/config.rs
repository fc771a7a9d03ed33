//! Research loop configuration.

use std::time::Duration;

/// Configuration for the gap-driven research loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchConfig {
    /// Maximum number of iterations before stopping
    pub max_iterations: u32,
    /// Wall-clock budget, checked before each iteration starts
    pub max_time: Option<Duration>,
    /// How many outstanding gaps to plan tasks for per iteration
    pub max_gaps_per_iteration: usize,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            max_time: Some(Duration::from_secs(10 * 60)),
            max_gaps_per_iteration: 1,
        }
    }
}

impl ResearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of iterations.
    pub fn max_iterations(mut self, n: u32) -> Self {
        self.max_iterations = n;
        self
    }

    /// Set the wall-clock budget.
    pub fn max_time(mut self, budget: Duration) -> Self {
        self.max_time = Some(budget);
        self
    }

    /// Remove the wall-clock budget (only the iteration cap applies).
    pub fn no_time_limit(mut self) -> Self {
        self.max_time = None;
        self
    }

    /// Set how many gaps are planned per iteration (at least 1).
    pub fn max_gaps_per_iteration(mut self, n: usize) -> Self {
        self.max_gaps_per_iteration = n.max(1);
        self
    }
}
