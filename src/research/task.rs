//! Tasks dispatched to close knowledge gaps, and the capabilities that run them.

use crate::error::BoxError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Hard cap on tasks dispatched in a single iteration.
pub const MAX_TASKS_PER_ITERATION: usize = 3;

/// The closed set of information-gathering capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Run a web search for a short query
    #[serde(rename = "search", alias = "WebSearchAgent", alias = "web_search")]
    WebSearch,
    /// Crawl a specific site, usually `entity_website`
    #[serde(rename = "crawl", alias = "SiteCrawlerAgent", alias = "site_crawler")]
    Crawl,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::WebSearch => f.write_str("search"),
            Capability::Crawl => f.write_str("crawl"),
        }
    }
}

/// One unit of dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTask {
    /// The knowledge gap being addressed
    #[serde(default)]
    pub gap: Option<String>,
    #[serde(alias = "agent")]
    pub capability: Capability,
    /// Short query for the capability (a few words)
    pub query: String,
    #[serde(default, alias = "entity_locator")]
    pub entity_website: Option<String>,
}

impl AgentTask {
    pub fn new(capability: Capability, query: impl Into<String>) -> Self {
        Self {
            gap: None,
            capability,
            query: query.into(),
            entity_website: None,
        }
    }

    pub fn gap(mut self, gap: impl Into<String>) -> Self {
        self.gap = Some(gap.into());
        self
    }

    pub fn entity_website(mut self, website: impl Into<String>) -> Self {
        self.entity_website = Some(website.into());
        self
    }

    /// One-line description used in history and logs.
    pub fn describe(&self) -> String {
        let mut line = format!("[{}] {}", self.capability, self.query);
        if let Some(site) = &self.entity_website {
            line.push_str(&format!(" (site: {})", site));
        }
        line
    }
}

/// A planner's answer for one gap.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskPlan {
    pub tasks: Vec<AgentTask>,
}

/// Executes tasks for one capability.
///
/// Timeouts and retries belong to the implementation; an `Err` is recorded as
/// a failed finding rather than aborting the iteration.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, task: &AgentTask) -> Result<String, BoxError>;
}

/// One executor per [`Capability`].
#[derive(Clone)]
pub struct Toolbox {
    search: Arc<dyn TaskExecutor>,
    crawl: Arc<dyn TaskExecutor>,
}

impl Toolbox {
    pub fn new(search: Arc<dyn TaskExecutor>, crawl: Arc<dyn TaskExecutor>) -> Self {
        Self { search, crawl }
    }

    /// The executor bound to `capability`.
    pub fn executor(&self, capability: Capability) -> &dyn TaskExecutor {
        match capability {
            Capability::WebSearch => self.search.as_ref(),
            Capability::Crawl => self.crawl.as_ref(),
        }
    }

    /// Run a task through its capability.
    pub async fn run(&self, task: &AgentTask) -> Result<String, BoxError> {
        self.executor(task.capability).execute(task).await
    }
}
