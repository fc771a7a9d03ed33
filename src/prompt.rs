//! Request templates for language-model backed collaborators.
//!
//! The engine hands collaborators structured values; these helpers render
//! them into the plain-text blocks an LLM-backed reflector, evaluator,
//! planner or drafter sends upstream.

use crate::research::{History, HistoryEntry, ResearchState};

/// Placeholder for the document before any section is written.
pub const EMPTY_DRAFT: &str = "No draft yet";

/// Render the history as one block per iteration.
pub fn render_history(history: &History) -> String {
    let mut out = String::new();
    let mut current = 0;
    let mut findings: Vec<&str> = Vec::new();
    let mut actions: Vec<String> = Vec::new();

    for entry in history.iter() {
        if entry.iteration() != current {
            flush_actions(&mut out, &mut actions, &mut findings);
            current = entry.iteration();
            out.push_str(&format!("[ITERATION {}]\n\n", current));
        }
        match entry {
            HistoryEntry::Thought { text, .. } => {
                out.push_str(&format!("<thought>\n{}\n</thought>\n\n", text));
            }
            HistoryEntry::Action { task, finding, .. } => {
                actions.push(task.describe());
                findings.push(finding);
            }
        }
    }
    flush_actions(&mut out, &mut actions, &mut findings);

    out.trim_end().to_string()
}

fn flush_actions(out: &mut String, actions: &mut Vec<String>, findings: &mut Vec<&str>) {
    if !actions.is_empty() {
        out.push_str(&format!("<action>\n{}\n</action>\n\n", actions.join("\n")));
        out.push_str(&format!("<findings>\n{}\n</findings>\n\n", findings.join("\n\n")));
    }
    actions.clear();
    findings.clear();
}

/// The brief sent to the reflector, the evaluator and the task planner.
pub fn render_research_brief(state: &ResearchState) -> String {
    format!(
        "ORIGINAL QUERY:\n{}\n\nBACKGROUND CONTEXT:\n{}\n\nHISTORY OF ACTIONS, FINDINGS AND THOUGHTS:\n{}",
        state.query(),
        state.background_context(),
        render_history(state.history())
    )
}

/// The task planner's request for one gap.
pub fn render_gap_request(gap: &str, state: &ResearchState) -> String {
    format!(
        "ORIGINAL QUERY:\n{}\n\nKNOWLEDGE GAP TO ADDRESS:\n{}\n\nBACKGROUND CONTEXT:\n{}\n\nHISTORY OF ACTIONS, FINDINGS AND THOUGHTS:\n{}",
        state.query(),
        gap,
        state.background_context(),
        render_history(state.history())
    )
}

/// The drafter's request for the next section.
pub fn render_section_request(
    query: &str,
    prior_document: &str,
    heading: &str,
    seed: &str,
) -> String {
    let draft = if prior_document.trim().is_empty() {
        EMPTY_DRAFT
    } else {
        prior_document
    };
    format!(
        "<ORIGINAL QUERY>\n{}\n</ORIGINAL QUERY>\n\n\
         <CURRENT REPORT DRAFT>\n{}\n</CURRENT REPORT DRAFT>\n\n\
         <TITLE OF NEXT SECTION TO WRITE>\n{}\n</TITLE OF NEXT SECTION TO WRITE>\n\n\
         <DRAFT OF NEXT SECTION>\n{}\n</DRAFT OF NEXT SECTION>",
        query, draft, heading, seed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::{AgentTask, Capability};

    fn sample_history() -> History {
        History::new()
            .with(HistoryEntry::Thought {
                iteration: 1,
                text: "Start with Aristotle.".to_string(),
            })
            .with(HistoryEntry::Action {
                iteration: 1,
                task: AgentTask::new(Capability::WebSearch, "aristotle virtue"),
                finding: "Virtue is a mean [1].".to_string(),
                succeeded: true,
            })
            .with(HistoryEntry::Thought {
                iteration: 2,
                text: "Now the Stoics.".to_string(),
            })
    }

    #[test]
    fn test_render_history() {
        let rendered = render_history(&sample_history());
        let expected = "[ITERATION 1]\n\n\
                        <thought>\nStart with Aristotle.\n</thought>\n\n\
                        <action>\n[search] aristotle virtue\n</action>\n\n\
                        <findings>\nVirtue is a mean [1].\n</findings>\n\n\
                        [ITERATION 2]\n\n\
                        <thought>\nNow the Stoics.\n</thought>";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_history_empty() {
        assert_eq!(render_history(&History::new()), "");
    }

    #[test]
    fn test_research_brief_sections() {
        let state = ResearchState::new("What is virtue?", "Greek ethics");
        let brief = render_research_brief(&state);

        assert!(brief.starts_with("ORIGINAL QUERY:\nWhat is virtue?\n\n"));
        assert!(brief.contains("BACKGROUND CONTEXT:\nGreek ethics"));
        assert!(brief.ends_with("HISTORY OF ACTIONS, FINDINGS AND THOUGHTS:\n"));
    }

    #[test]
    fn test_gap_request_names_gap() {
        let state = ResearchState::new("q", "bg");
        let request = render_gap_request("Stoic view of virtue", &state);
        assert!(request.contains("KNOWLEDGE GAP TO ADDRESS:\nStoic view of virtue"));
    }

    #[test]
    fn test_section_request_placeholder() {
        let request = render_section_request("q", "  ", "Intro", "seed text");
        assert!(request.contains("<CURRENT REPORT DRAFT>\nNo draft yet\n</CURRENT REPORT DRAFT>"));
        assert!(request.contains("<TITLE OF NEXT SECTION TO WRITE>\nIntro\n"));
        assert!(request.ends_with("seed text\n</DRAFT OF NEXT SECTION>"));
    }
}
