//! Report assembly configuration.

use super::headings::DEFAULT_SECTION_LEVEL;

/// Configuration for [`ReportAssembler`](super::ReportAssembler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyConfig {
    /// Level every section's top heading is rebased to
    pub heading_level: usize,
    /// Whether to render a numbered table of contents after the title
    pub table_of_contents: bool,
    /// Heading text of the trailing reference block
    pub references_heading: String,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            heading_level: DEFAULT_SECTION_LEVEL,
            table_of_contents: true,
            references_heading: "References".to_string(),
        }
    }
}

impl AssemblyConfig {
    /// Set the section heading level (clamped to at least 2, below the title).
    pub fn heading_level(mut self, level: usize) -> Self {
        self.heading_level = level.max(DEFAULT_SECTION_LEVEL);
        self
    }

    /// Enable or disable the table of contents.
    pub fn table_of_contents(mut self, enabled: bool) -> Self {
        self.table_of_contents = enabled;
        self
    }

    /// Set the heading of the reference block.
    pub fn references_heading(mut self, heading: impl Into<String>) -> Self {
        self.references_heading = heading.into();
        self
    }
}
