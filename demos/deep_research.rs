//! Deep research pipeline demo.
//!
//! Runs the full pipeline offline with scripted collaborators:
//! - Planner: returns a fixed outline as JSON, decoded into `ReportPlan`
//! - Evaluator: reports one gap per section, then completeness
//! - Tools: canned search / crawl results
//! - Drafter: writes each section with its own local citation numbers
//!
//! Swap any collaborator for an LLM-backed one; the `folio::prompt`
//! helpers render the requests they would send.
//!
//! Run with:
//!   RUST_LOG=folio=debug cargo run --example deep_research "What is virtue?"

use async_trait::async_trait;
use folio::prompt::{render_gap_request, render_research_brief, render_section_request};
use folio::{
    AgentTask, BoxError, Capability, Collaborators, DeepResearch, GapAssessment, GapEvaluator,
    ReportPlan, ReportPlanner, ResearchConfig, ResearchState, SectionDraft, SectionDrafter,
    TaskExecutor, TaskPlan, TaskPlanner, Toolbox,
};
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ═══════════════════════════════════════════════════════════════════════════
// PLANNER
// ═══════════════════════════════════════════════════════════════════════════

const OUTLINE_JSON: &str = r#"{
    "background_context": "Virtue ethics asks what kind of person one should be rather than which rules to follow.",
    "article_title": "Virtue Then and Now",
    "sections": [
        {"title": "Aristotle and the Mean", "key_question": "How does Aristotle define virtue?"},
        {"title": "Stoic Revisions", "key_question": "What did the Stoics change about virtue?"},
        {"title": "Virtue in Practice Today", "key_question": "Where does virtue ethics apply today?"}
    ]
}"#;

struct ScriptedPlanner;

#[async_trait]
impl ReportPlanner for ScriptedPlanner {
    async fn plan(&self, query: &str) -> Result<ReportPlan, BoxError> {
        println!("📋 Planning outline for: {}", query);
        Ok(serde_json::from_str(OUTLINE_JSON)?)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// RESEARCH COLLABORATORS
// ═══════════════════════════════════════════════════════════════════════════

struct Thinker;

#[async_trait]
impl folio::Reflector for Thinker {
    async fn reflect(&self, state: &ResearchState) -> Result<String, BoxError> {
        let brief = render_research_brief(state);
        tracing::debug!("reflector request:\n{}", brief);
        if state.history().is_empty() {
            Ok(format!("Start by finding primary sources on: {}", state.query()))
        } else {
            Ok("The primary sources are in; check whether anything is missing.".to_string())
        }
    }
}

struct Evaluator;

#[async_trait]
impl GapEvaluator for Evaluator {
    async fn assess(&self, state: &ResearchState) -> Result<GapAssessment, BoxError> {
        let json = if state.findings().is_empty() {
            format!(
                r#"{{"research_complete": false, "outstanding_gaps": ["Primary texts for: {}"]}}"#,
                state.query()
            )
        } else {
            r#"{"research_complete": true, "outstanding_gaps": []}"#.to_string()
        };
        Ok(serde_json::from_str(&json)?)
    }
}

struct Planner;

#[async_trait]
impl TaskPlanner for Planner {
    async fn plan(&self, gap: &str, state: &ResearchState) -> Result<TaskPlan, BoxError> {
        tracing::debug!("planner request:\n{}", render_gap_request(gap, state));
        Ok(TaskPlan {
            tasks: vec![
                AgentTask::new(Capability::WebSearch, state.query()),
                AgentTask::new(Capability::Crawl, "primary texts").entity_website("plato.stanford.edu"),
            ],
        })
    }
}

struct Search;

#[async_trait]
impl TaskExecutor for Search {
    async fn execute(&self, task: &AgentTask) -> Result<String, BoxError> {
        Ok(format!(
            "Search results for '{}': an encyclopedia entry and two commentaries.",
            task.query
        ))
    }
}

struct Crawl;

#[async_trait]
impl TaskExecutor for Crawl {
    async fn execute(&self, task: &AgentTask) -> Result<String, BoxError> {
        let site = task
            .entity_website
            .as_deref()
            .ok_or("crawl task without a website")?;
        Ok(format!("Crawled {}: found the relevant entry.", site))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// DRAFTER
// ═══════════════════════════════════════════════════════════════════════════

struct Drafter {
    query: String,
}

#[async_trait]
impl SectionDrafter for Drafter {
    async fn draft(
        &self,
        prior_document: &str,
        heading: &str,
        seed: &str,
    ) -> Result<SectionDraft, BoxError> {
        let request = render_section_request(&self.query, prior_document, heading, seed);
        tracing::debug!("drafter request ({} chars)", request.len());

        let slug: String = heading
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect();
        Ok(SectionDraft {
            title: heading.to_string(),
            body: format!(
                "# {heading}\n\
                 The standard account [1] is refined by recent work [2].\n\n\
                 ## Key Arguments\n\
                 Commentators disagree on the details [2][3]."
            ),
            references: vec![
                "[1] https://plato.stanford.edu/entries/ethics-virtue/".to_string(),
                format!("[2] https://example.org/{}", slug),
                "[3] https://example.org/commentary".to_string(),
            ],
        })
    }
}

fn print_separator(title: &str) {
    println!("\n{}", "═".repeat(70));
    println!("  {}", title);
    println!("{}\n", "═".repeat(70));
}

// ═══════════════════════════════════════════════════════════════════════════
// MAIN PIPELINE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let query = env::args()
        .nth(1)
        .unwrap_or_else(|| "What is virtue, and does it still matter?".to_string());

    print_separator("DEEP RESEARCH PIPELINE");
    println!("  Query: {}", query);

    let collaborators = Collaborators {
        reflector: Arc::new(Thinker),
        evaluator: Arc::new(Evaluator),
        planner: Arc::new(Planner),
        toolbox: Toolbox::new(Arc::new(Search), Arc::new(Crawl)),
    };
    let drafter = Arc::new(Drafter {
        query: query.clone(),
    });

    let pipeline = DeepResearch::new(Arc::new(ScriptedPlanner), collaborators, drafter)
        .research_config(ResearchConfig::default().max_iterations(3))
        .callbacks(folio::events::logging_callbacks());

    let result = pipeline.run(&query).await?;

    print_separator("RESEARCH SUMMARY");
    for (section, outcome) in result.plan.sections.iter().zip(&result.research) {
        println!(
            "  {} → {} iterations, {} tasks, {:?}",
            section.title,
            outcome.iterations(),
            outcome.tasks_dispatched,
            outcome.stop_reason
        );
    }

    print_separator("FINAL REPORT");
    println!("{}", result.report.markdown());

    Ok(())
}
