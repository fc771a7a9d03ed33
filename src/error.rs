//! Error types for folio.

use thiserror::Error;

/// Boxed error returned by external collaborators (drafters, planners, tools).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while researching or assembling a report.
#[derive(Error, Debug)]
pub enum Error {
    /// The drafting collaborator failed for a section; no partial report is produced
    #[error("drafting section '{section}' failed: {source}")]
    Draft {
        section: String,
        #[source]
        source: BoxError,
    },

    /// The reflection collaborator failed
    #[error("reflection failed on iteration {iteration}: {source}")]
    Reflection {
        iteration: u32,
        #[source]
        source: BoxError,
    },

    /// The completeness / gap evaluation collaborator failed
    #[error("gap evaluation failed on iteration {iteration}: {source}")]
    GapEvaluation {
        iteration: u32,
        #[source]
        source: BoxError,
    },

    /// The task planning collaborator failed for a gap
    #[error("task planning failed for gap '{gap}': {source}")]
    TaskPlanning {
        gap: String,
        #[source]
        source: BoxError,
    },

    /// The report outline could not be produced
    #[error("report planning failed: {0}")]
    ReportPlanning(#[source] BoxError),

    /// The research loop for one planned section failed
    #[error("research for section '{section}' failed: {source}")]
    SectionResearch {
        section: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type for folio operations.
pub type Result<T> = std::result::Result<T, Error>;
