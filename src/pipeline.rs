//! End-to-end deep research: outline, per-section research, assembly.

use crate::error::{BoxError, Error, Result};
use crate::events::ResearchCallbacks;
use crate::report::{AssembledReport, AssemblyConfig, PlannedSection, ReportAssembler, SectionDrafter};
use crate::research::{Collaborators, ResearchConfig, ResearchLoop, ResearchOutcome};
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Instrument;

/// One planned section of the report outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPlanSection {
    pub title: String,
    /// The question the section has to answer; drives its research loop
    pub key_question: String,
}

/// Outline and background produced before any research starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPlan {
    #[serde(default)]
    pub background_context: String,
    #[serde(alias = "article_title")]
    pub report_title: String,
    pub sections: Vec<ReportPlanSection>,
}

/// Produces the report outline for a query.
#[async_trait]
pub trait ReportPlanner: Send + Sync {
    async fn plan(&self, query: &str) -> std::result::Result<ReportPlan, BoxError>;
}

/// Everything a deep research run produced.
#[derive(Debug, Clone)]
pub struct DeepResearchReport {
    pub plan: ReportPlan,
    /// One outcome per planned section, in outline order
    pub research: Vec<ResearchOutcome>,
    pub report: AssembledReport,
}

/// Plans an outline, researches every section, then assembles the report.
///
/// Section research runs concurrently since the loops share no state;
/// drafting stays sequential inside [`ReportAssembler`].
pub struct DeepResearch {
    planner: Arc<dyn ReportPlanner>,
    collaborators: Collaborators,
    drafter: Arc<dyn SectionDrafter>,
    research_config: ResearchConfig,
    assembly_config: AssemblyConfig,
    callbacks: ResearchCallbacks,
}

impl DeepResearch {
    pub fn new(
        planner: Arc<dyn ReportPlanner>,
        collaborators: Collaborators,
        drafter: Arc<dyn SectionDrafter>,
    ) -> Self {
        Self {
            planner,
            collaborators,
            drafter,
            research_config: ResearchConfig::default(),
            assembly_config: AssemblyConfig::default(),
            callbacks: ResearchCallbacks::default(),
        }
    }

    pub fn research_config(mut self, config: ResearchConfig) -> Self {
        self.research_config = config;
        self
    }

    pub fn assembly_config(mut self, config: AssemblyConfig) -> Self {
        self.assembly_config = config;
        self
    }

    /// Callbacks shared by every research loop and the assembler. Research
    /// events carry the section's key question as their `query`.
    pub fn callbacks(mut self, callbacks: ResearchCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub async fn run(&self, query: &str) -> Result<DeepResearchReport> {
        let plan = self
            .planner
            .plan(query)
            .await
            .map_err(Error::ReportPlanning)?;
        tracing::info!(
            title = %plan.report_title,
            sections = plan.sections.len(),
            "report outline ready"
        );

        let research_loop = ResearchLoop::new(self.research_config.clone(), self.collaborators.clone())
            .callbacks(self.callbacks.clone());

        let runs = plan.sections.iter().map(|section| {
            let research_loop = &research_loop;
            let background = &plan.background_context;
            async move {
                research_loop
                    .run(&section.key_question, background)
                    .await
                    .map_err(|e| Error::SectionResearch {
                        section: section.title.clone(),
                        source: Box::new(e),
                    })
            }
            .instrument(tracing::info_span!("section", title = %section.title))
        });
        let research = join_all(runs).await.into_iter().collect::<Result<Vec<_>>>()?;

        let outline: Vec<PlannedSection> = plan
            .sections
            .iter()
            .zip(&research)
            .map(|(section, outcome)| PlannedSection::new(&section.title, section_seed(section, outcome)))
            .collect();

        let report = ReportAssembler::new(self.assembly_config.clone())
            .callbacks(self.callbacks.clone())
            .assemble(&plan.report_title, &outline, self.drafter.as_ref())
            .await?;

        Ok(DeepResearchReport {
            plan,
            research,
            report,
        })
    }
}

/// First-draft material for a section: its key question and what was found.
fn section_seed(section: &ReportPlanSection, outcome: &ResearchOutcome) -> String {
    let findings = outcome.findings();
    if findings.is_empty() {
        return format!("KEY QUESTION: {}\n\nNo findings were gathered.", section.key_question);
    }
    format!(
        "KEY QUESTION: {}\n\nFINDINGS:\n{}",
        section.key_question,
        findings.join("\n\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SectionDraft;
    use crate::research::{
        AgentTask, Capability, GapAssessment, GapEvaluator, Reflector, ResearchState, TaskExecutor,
        TaskPlan, TaskPlanner, Toolbox,
    };
    use std::sync::Mutex;

    struct OutlinePlanner;

    #[async_trait]
    impl ReportPlanner for OutlinePlanner {
        async fn plan(&self, _query: &str) -> std::result::Result<ReportPlan, BoxError> {
            Ok(ReportPlan {
                background_context: "Virtue ethics overview".to_string(),
                report_title: "On Virtue".to_string(),
                sections: vec![
                    ReportPlanSection {
                        title: "Aristotle".to_string(),
                        key_question: "What is Aristotle's virtue?".to_string(),
                    },
                    ReportPlanSection {
                        title: "Stoics".to_string(),
                        key_question: "What did the Stoics add?".to_string(),
                    },
                ],
            })
        }
    }

    struct Quiet;

    #[async_trait]
    impl Reflector for Quiet {
        async fn reflect(&self, _state: &ResearchState) -> std::result::Result<String, BoxError> {
            Ok("keep going".to_string())
        }
    }

    /// One gap on the first iteration, complete afterwards.
    struct OneGap;

    #[async_trait]
    impl GapEvaluator for OneGap {
        async fn assess(&self, state: &ResearchState) -> std::result::Result<GapAssessment, BoxError> {
            if state.iteration() == 1 {
                Ok(GapAssessment::gaps([format!("sources for {}", state.query())]))
            } else {
                Ok(GapAssessment::complete())
            }
        }
    }

    struct SearchPlanner;

    #[async_trait]
    impl TaskPlanner for SearchPlanner {
        async fn plan(&self, gap: &str, _state: &ResearchState) -> std::result::Result<TaskPlan, BoxError> {
            Ok(TaskPlan {
                tasks: vec![AgentTask::new(Capability::WebSearch, gap)],
            })
        }
    }

    struct Library;

    #[async_trait]
    impl TaskExecutor for Library {
        async fn execute(&self, task: &AgentTask) -> std::result::Result<String, BoxError> {
            Ok(format!("notes on {}", task.query))
        }
    }

    /// Cites a.com in every section plus one section-specific source.
    struct CitingDrafter {
        seeds: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SectionDrafter for CitingDrafter {
        async fn draft(
            &self,
            _prior_document: &str,
            heading: &str,
            seed: &str,
        ) -> std::result::Result<SectionDraft, BoxError> {
            self.seeds.lock().unwrap().push(seed.to_string());
            let slug = heading.to_lowercase();
            Ok(SectionDraft {
                title: heading.to_string(),
                body: format!("# {}\nShared [1], own [2].", heading),
                references: vec!["[1] a.com".to_string(), format!("[2] {}.org", slug)],
            })
        }
    }

    fn collaborators() -> Collaborators {
        Collaborators {
            reflector: Arc::new(Quiet),
            evaluator: Arc::new(OneGap),
            planner: Arc::new(SearchPlanner),
            toolbox: Toolbox::new(Arc::new(Library), Arc::new(Library)),
        }
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let drafter = Arc::new(CitingDrafter {
            seeds: Mutex::new(Vec::new()),
        });
        let pipeline = DeepResearch::new(Arc::new(OutlinePlanner), collaborators(), drafter.clone());

        let result = pipeline.run("What is virtue?").await.unwrap();

        assert_eq!(result.research.len(), 2);
        assert!(result.research.iter().all(|r| r.iterations() == 2));

        let seeds = drafter.seeds.lock().unwrap();
        assert!(seeds[0].contains("KEY QUESTION: What is Aristotle's virtue?"));
        assert!(seeds[0].contains("notes on sources for What is Aristotle's virtue?"));

        let report = &result.report;
        assert_eq!(report.title, "On Virtue");
        assert_eq!(report.references.len(), 3);
        assert_eq!(report.sections[1], "## Stoics\nShared [1], own [3].");
        assert!(report.markdown().contains("1. Aristotle\n2. Stoics"));
    }

    #[tokio::test]
    async fn test_planner_failure() {
        struct NoPlan;

        #[async_trait]
        impl ReportPlanner for NoPlan {
            async fn plan(&self, _query: &str) -> std::result::Result<ReportPlan, BoxError> {
                Err("model unavailable".into())
            }
        }

        let drafter = Arc::new(CitingDrafter {
            seeds: Mutex::new(Vec::new()),
        });
        let err = DeepResearch::new(Arc::new(NoPlan), collaborators(), drafter)
            .run("q")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ReportPlanning(_)));
    }

    #[tokio::test]
    async fn test_section_events_name_their_query() {
        let drafter = Arc::new(CitingDrafter {
            seeds: Mutex::new(Vec::new()),
        });
        let callbacks = ResearchCallbacks::default().capture();
        DeepResearch::new(Arc::new(OutlinePlanner), collaborators(), drafter)
            .callbacks(callbacks.clone())
            .run("What is virtue?")
            .await
            .unwrap();

        let mut finished: Vec<String> = callbacks
            .take_events()
            .into_iter()
            .filter_map(|e| match e {
                crate::events::ResearchEvent::ResearchFinished { query, .. } => Some(query),
                _ => None,
            })
            .collect();
        finished.sort();
        assert_eq!(
            finished,
            vec!["What did the Stoics add?", "What is Aristotle's virtue?"]
        );
    }

    #[test]
    fn test_plan_decodes_article_title() {
        let json = r#"{
            "background_context": "bg",
            "article_title": "The Good Life",
            "sections": [{"title": "Intro", "key_question": "Why?"}]
        }"#;
        let plan: ReportPlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.report_title, "The Good Life");
        assert_eq!(plan.sections.len(), 1);
    }

    #[test]
    fn test_research_runs_on_tokio_test_runtime() {
        let outcome = tokio_test::block_on(
            ResearchLoop::new(ResearchConfig::default(), collaborators()).run("q", "bg"),
        )
        .unwrap();
        assert_eq!(outcome.findings(), vec!["notes on sources for q"]);
    }
}
