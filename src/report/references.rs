//! Citation consolidation across independently drafted sections.
//!
//! Each section arrives with its own local numbering (`[1]`, `[2]`, ...) and a
//! list of `"[n] locator"` strings. [`consolidate`] merges those into a single
//! [`ReferenceMap`] owned by the assembly and rewrites the section's in-text
//! markers so they point at the global numbers.

use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]").expect("marker pattern is valid"));

/// A numbered citation. The locator (usually a URL) is its identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub number: u32,
    pub locator: String,
}

impl Reference {
    pub fn new(number: u32, locator: impl Into<String>) -> Self {
        Self {
            number,
            locator: locator.into(),
        }
    }

    /// Parse a `"[n] locator"` entry.
    ///
    /// Returns `None` when there is no leading bracketed integer or the
    /// locator is empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let (head, tail) = raw.trim().split_once(']')?;
        let number = head.trim().strip_prefix('[')?.trim().parse().ok()?;
        let locator = tail.trim();
        if locator.is_empty() {
            return None;
        }
        Some(Self::new(number, locator))
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.number, self.locator)
    }
}

/// The document-wide reference list.
///
/// Numbers are handed out in increasing order starting at 1 and never reused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceMap {
    by_locator: HashMap<String, u32>,
    entries: Vec<Reference>,
}

impl ReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Global number already assigned to a locator.
    pub fn get(&self, locator: &str) -> Option<u32> {
        self.by_locator.get(locator).copied()
    }

    /// Return the locator's number, assigning the next one if it is new.
    ///
    /// The boolean is `true` when a new entry was appended.
    pub fn get_or_assign(&mut self, locator: &str) -> (u32, bool) {
        if let Some(number) = self.get(locator) {
            return (number, false);
        }
        let number = self.max_number() + 1;
        self.by_locator.insert(locator.to_string(), number);
        self.entries.push(Reference::new(number, locator));
        (number, true)
    }

    /// Highest number assigned so far, 0 when empty.
    pub fn max_number(&self) -> u32 {
        self.entries.last().map_or(0, |r| r.number)
    }

    /// All references in ascending number order.
    pub fn references(&self) -> &[Reference] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of consolidating one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidatedSection {
    /// Body with every marker rewritten to a global number or removed
    pub body: String,
    /// Local marker number → global reference number
    pub mapping: BTreeMap<u32, u32>,
    /// Number of references this section added to the global list
    pub added: usize,
    /// Raw entries that could not be parsed
    pub skipped: Vec<String>,
}

/// Merge a section's local references into `global` and rewrite its markers.
///
/// Markers without a declared reference are deleted rather than left dangling.
pub fn consolidate<S: AsRef<str>>(
    body: &str,
    section_refs: &[S],
    global: &mut ReferenceMap,
) -> ConsolidatedSection {
    let mut mapping = BTreeMap::new();
    let mut added = 0;
    let mut skipped = Vec::new();

    for raw in section_refs {
        let raw = raw.as_ref();
        let Some(local) = Reference::parse(raw) else {
            tracing::warn!(reference = raw, "skipping malformed reference");
            skipped.push(raw.to_string());
            continue;
        };

        let (number, is_new) = global.get_or_assign(&local.locator);
        if is_new {
            added += 1;
        }
        if let Some(previous) = mapping.insert(local.number, number)
            && previous != number
        {
            tracing::warn!(
                local = local.number,
                "local reference number declared twice, keeping the last locator"
            );
        }
    }

    let body = rewrite_markers(body, &mapping);
    tracing::debug!(
        mapped = mapping.len(),
        added,
        skipped = skipped.len(),
        "consolidated section references"
    );

    ConsolidatedSection {
        body,
        mapping,
        added,
        skipped,
    }
}

/// Replace every `[n]` marker through `mapping`; unmapped markers become empty.
pub fn rewrite_markers(body: &str, mapping: &BTreeMap<u32, u32>) -> String {
    MARKER
        .replace_all(body, |caps: &Captures<'_>| {
            caps[1]
                .parse::<u32>()
                .ok()
                .and_then(|n| mapping.get(&n))
                .map(|global| format!("[{}]", global))
                .unwrap_or_default()
        })
        .into_owned()
}
