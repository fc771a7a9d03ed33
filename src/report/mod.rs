//! Report assembly.
//!
//! Sections are drafted one at a time by a [`SectionDrafter`], each seeing the
//! full document written so far. Every draft then goes through reference
//! consolidation and heading normalization before it is appended. The result
//! is a single markdown document with a title, a table of contents, the
//! section bodies and one trailing reference list.

mod config;
pub mod headings;
pub mod references;

pub use config::AssemblyConfig;
pub use references::{ConsolidatedSection, Reference, ReferenceMap, consolidate};

use crate::error::{BoxError, Error, Result};
use crate::events::{ResearchCallbacks, ResearchEvent, logging_callbacks};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A section of the outline waiting to be drafted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedSection {
    pub title: String,
    /// First-draft material (findings, key question) handed to the drafter
    pub seed: String,
}

impl PlannedSection {
    pub fn new(title: impl Into<String>, seed: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            seed: seed.into(),
        }
    }
}

/// A section as returned by the drafting collaborator.
///
/// `references` holds raw `"[n] locator"` strings matching the `[n]` markers
/// in `body`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SectionDraft {
    #[serde(default)]
    pub title: String,
    #[serde(alias = "next_section_markdown")]
    pub body: String,
    #[serde(default)]
    pub references: Vec<String>,
}

/// Produces the final draft of one section.
#[async_trait]
pub trait SectionDrafter: Send + Sync {
    /// Draft `heading` given the document assembled so far and the section seed.
    async fn draft(
        &self,
        prior_document: &str,
        heading: &str,
        seed: &str,
    ) -> std::result::Result<SectionDraft, BoxError>;
}

/// The finished document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledReport {
    pub title: String,
    /// Rendered section bodies in outline order
    pub sections: Vec<String>,
    /// Global reference list in ascending order
    pub references: Vec<Reference>,
    markdown: String,
}

impl AssembledReport {
    /// The full markdown document.
    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    pub fn into_markdown(self) -> String {
        self.markdown
    }
}

/// Document under construction. Consumed by [`ReportBuilder::finish`].
struct ReportBuilder<'a> {
    config: &'a AssemblyConfig,
    title: String,
    text: String,
    sections: Vec<String>,
    references: ReferenceMap,
}

impl<'a> ReportBuilder<'a> {
    fn new(config: &'a AssemblyConfig, title: &str, outline: &[PlannedSection]) -> Self {
        let mut text = format!("# {}\n\n", title);
        if config.table_of_contents && !outline.is_empty() {
            text.push_str("## Table of Contents\n\n");
            let entries: Vec<String> = outline
                .iter()
                .enumerate()
                .map(|(i, s)| format!("{}. {}", i + 1, s.title))
                .collect();
            text.push_str(&entries.join("\n"));
            text.push_str("\n\n");
        }

        Self {
            config,
            title: title.to_string(),
            text,
            sections: Vec::new(),
            references: ReferenceMap::new(),
        }
    }

    /// Consolidate, normalize and append one draft.
    fn push(&mut self, draft: &SectionDraft) -> ConsolidatedSection {
        let mut consolidated = consolidate(&draft.body, &draft.references, &mut self.references);
        // Sections always nest under the `#` title.
        let level = self.config.heading_level.max(headings::DEFAULT_SECTION_LEVEL);
        consolidated.body = headings::normalize(&consolidated.body, level);

        self.text.push_str(&consolidated.body);
        self.text.push_str("\n\n");
        self.sections.push(consolidated.body.clone());
        consolidated
    }

    fn finish(mut self) -> AssembledReport {
        self.text
            .push_str(&format!("## {}\n\n", self.config.references_heading));
        let entries: Vec<String> = self
            .references
            .references()
            .iter()
            .map(ToString::to_string)
            .collect();
        self.text.push_str(&entries.join("  \n"));

        AssembledReport {
            title: self.title,
            sections: self.sections,
            references: self.references.references().to_vec(),
            markdown: self.text,
        }
    }
}

/// Drafts planned sections in order and assembles them into one report.
pub struct ReportAssembler {
    config: AssemblyConfig,
    callbacks: ResearchCallbacks,
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::new(AssemblyConfig::default())
    }
}

impl ReportAssembler {
    pub fn new(config: AssemblyConfig) -> Self {
        Self {
            config,
            callbacks: ResearchCallbacks::default(),
        }
    }

    /// Log every assembly event through `tracing`.
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

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Draft and assemble every section of `outline` under `title`.
    ///
    /// Sections are drafted strictly in order: each drafter call sees the
    /// literal text of all earlier sections. A drafter failure aborts the
    /// whole assembly and names the section.
    pub async fn assemble(
        &self,
        title: &str,
        outline: &[PlannedSection],
        drafter: &dyn SectionDrafter,
    ) -> Result<AssembledReport> {
        let mut report = ReportBuilder::new(&self.config, title, outline);

        for (index, section) in outline.iter().enumerate() {
            self.callbacks.emit(&ResearchEvent::SectionStart {
                index,
                total: outline.len(),
                title: section.title.clone(),
            });

            let draft = match drafter
                .draft(&report.text, &section.title, &section.seed)
                .await
            {
                Ok(draft) => draft,
                Err(source) => {
                    let err = Error::Draft {
                        section: section.title.clone(),
                        source,
                    };
                    self.callbacks.emit(&ResearchEvent::Error {
                        message: err.to_string(),
                    });
                    return Err(err);
                }
            };

            let consolidated = report.push(&draft);
            for raw in consolidated.skipped {
                self.callbacks.emit(&ResearchEvent::ReferenceSkipped { raw });
            }
            self.callbacks.emit(&ResearchEvent::SectionAssembled {
                index,
                title: section.title.clone(),
                new_references: consolidated.added,
            });
        }

        let report = report.finish();
        tracing::info!(
            sections = report.sections.len(),
            references = report.references.len(),
            "report assembled"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Returns canned drafts keyed by heading and records the context it saw.
    struct ScriptedDrafter {
        drafts: HashMap<String, SectionDraft>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedDrafter {
        fn new(drafts: Vec<(&str, &str, Vec<&str>)>) -> Self {
            let drafts = drafts
                .into_iter()
                .map(|(heading, body, refs)| {
                    (
                        heading.to_string(),
                        SectionDraft {
                            title: heading.to_string(),
                            body: body.to_string(),
                            references: refs.into_iter().map(String::from).collect(),
                        },
                    )
                })
                .collect();
            Self {
                drafts,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SectionDrafter for ScriptedDrafter {
        async fn draft(
            &self,
            prior_document: &str,
            heading: &str,
            _seed: &str,
        ) -> std::result::Result<SectionDraft, BoxError> {
            self.seen.lock().unwrap().push(prior_document.to_string());
            self.drafts
                .get(heading)
                .cloned()
                .ok_or_else(|| format!("no draft for {}", heading).into())
        }
    }

    fn outline(titles: &[&str]) -> Vec<PlannedSection> {
        titles.iter().map(|t| PlannedSection::new(*t, "")).collect()
    }

    #[tokio::test]
    async fn test_three_sections_share_references() {
        let drafter = ScriptedDrafter::new(vec![
            ("One", "# One\nFirst claim [1].", vec!["[1] a.com"]),
            ("Two", "# Two\nSecond [1] and third [2].", vec!["[1] b.com", "[2] a.com"]),
            ("Three", "# Three\nAgain [1].", vec!["[1] a.com"]),
        ]);

        let report = ReportAssembler::default()
            .assemble("Report", &outline(&["One", "Two", "Three"]), &drafter)
            .await
            .unwrap();

        assert_eq!(
            report.references,
            vec![Reference::new(1, "a.com"), Reference::new(2, "b.com")]
        );
        assert_eq!(report.sections[0], "## One\nFirst claim [1].");
        assert_eq!(report.sections[1], "## Two\nSecond [2] and third [1].");
        assert_eq!(report.sections[2], "## Three\nAgain [1].");
        assert!(report.markdown().ends_with("## References\n\n[1] a.com  \n[2] b.com"));
    }

    #[tokio::test]
    async fn test_document_layout() {
        let drafter = ScriptedDrafter::new(vec![
            ("Intro", "Opening [1].", vec!["[1] x.org"]),
            ("Body", "## Body\n#### Detail", vec![]),
        ]);

        let report = ReportAssembler::default()
            .assemble("Ethics of AI", &outline(&["Intro", "Body"]), &drafter)
            .await
            .unwrap();

        let expected = "# Ethics of AI\n\n\
                        ## Table of Contents\n\n\
                        1. Intro\n2. Body\n\n\
                        Opening [1].\n\n\
                        ## Body\n#### Detail\n\n\
                        ## References\n\n\
                        [1] x.org";
        assert_eq!(report.markdown(), expected);
    }

    #[tokio::test]
    async fn test_drafter_sees_prior_sections() {
        let drafter = ScriptedDrafter::new(vec![
            ("A", "# A\nalpha", vec![]),
            ("B", "# B\nbeta", vec![]),
        ]);

        ReportAssembler::default()
            .assemble("T", &outline(&["A", "B"]), &drafter)
            .await
            .unwrap();

        let seen = drafter.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(!seen[0].contains("alpha"));
        assert!(seen[1].contains("## A\nalpha"));
        assert!(seen[1].starts_with("# T\n\n## Table of Contents"));
    }

    #[tokio::test]
    async fn test_draft_failure_names_section() {
        let drafter = ScriptedDrafter::new(vec![("A", "alpha", vec![])]);

        let err = ReportAssembler::default()
            .assemble("T", &outline(&["A", "Missing", "C"]), &drafter)
            .await
            .unwrap_err();

        match err {
            Error::Draft { section, .. } => assert_eq!(section, "Missing"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(drafter.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_without_table_of_contents() {
        let drafter = ScriptedDrafter::new(vec![("A", "alpha", vec![])]);
        let assembler = ReportAssembler::new(AssemblyConfig::default().table_of_contents(false));

        let report = assembler
            .assemble("T", &outline(&["A"]), &drafter)
            .await
            .unwrap();
        assert_eq!(report.markdown(), "# T\n\nalpha\n\n## References\n\n");
    }

    #[tokio::test]
    async fn test_heading_level_floor_applies_to_field_writes() {
        let drafter = ScriptedDrafter::new(vec![("A", "# A\ntext\n## B", vec![])]);
        let config = AssemblyConfig {
            heading_level: 0,
            table_of_contents: false,
            ..Default::default()
        };

        let report = ReportAssembler::new(config)
            .assemble("T", &outline(&["A"]), &drafter)
            .await
            .unwrap();
        assert_eq!(report.sections[0], "## A\ntext\n### B");
    }

    #[tokio::test]
    async fn test_skipped_references_emit_events() {
        let drafter = ScriptedDrafter::new(vec![("A", "alpha [1]", vec!["bogus"])]);
        let callbacks = ResearchCallbacks::default().capture();
        let assembler = ReportAssembler::default().callbacks(callbacks.clone());

        let report = assembler
            .assemble("T", &outline(&["A"]), &drafter)
            .await
            .unwrap();

        assert_eq!(report.sections[0], "alpha ");
        let events = callbacks.take_events();
        assert!(events.contains(&ResearchEvent::ReferenceSkipped {
            raw: "bogus".to_string()
        }));
    }

    #[test]
    fn test_section_draft_decodes_writer_output() {
        let json = r#"{
            "next_section_markdown": "Kant [1].",
            "references": ["[1] https://example.com/kant"]
        }"#;
        let draft: SectionDraft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.body, "Kant [1].");
        assert_eq!(draft.references.len(), 1);
        assert!(draft.title.is_empty());
    }
}
