//! Folio - report assembly and gap-driven research
//!
//! Folio turns independently drafted sections into one citation-bearing
//! markdown report, and drives the research loop that decides when enough
//! material has been gathered. Content generation, web search and crawling
//! are external collaborators plugged in through async traits.
//!
//! # Quick Start
//!
//! ```ignore
//! use folio::{PlannedSection, ReportAssembler};
//!
//! #[tokio::main]
//! async fn main() -> folio::Result<()> {
//!     let outline = vec![
//!         PlannedSection::new("Aristotle", "findings on the mean"),
//!         PlannedSection::new("The Stoics", "findings on apatheia"),
//!     ];
//!
//!     // `drafter` implements `SectionDrafter`, e.g. backed by an LLM
//!     let report = ReportAssembler::default()
//!         .verbose(true)
//!         .assemble("On Virtue", &outline, &drafter)
//!         .await?;
//!
//!     println!("{}", report.markdown());
//!     Ok(())
//! }
//! ```

mod error;
pub mod events;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod research;

pub use error::{BoxError, Error, Result};
pub use events::{ResearchCallbacks, ResearchEvent};
pub use pipeline::{DeepResearch, DeepResearchReport, ReportPlan, ReportPlanSection, ReportPlanner};
pub use report::{
    AssembledReport, AssemblyConfig, PlannedSection, Reference, ReferenceMap, ReportAssembler,
    SectionDraft, SectionDrafter,
};
pub use research::{
    AgentTask, Capability, Collaborators, GapAssessment, GapEvaluator, Reflector, ResearchConfig,
    ResearchLoop, ResearchOutcome, ResearchState, StopReason, TaskExecutor, TaskPlan, TaskPlanner,
    Toolbox,
};
