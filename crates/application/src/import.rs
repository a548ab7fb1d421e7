use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use novellog_domain::{Book, BookId, IdSource};

use crate::ApplicationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConflictId(usize);

impl ConflictId {
    pub fn get(self) -> usize {
        self.0
    }
}

impl Display for ConflictId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0 + 1)
    }
}

/// An incoming record whose title matches an existing one, ignoring case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConflict {
    pub id: ConflictId,
    pub existing: Book,
    pub incoming: Book,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Resolution {
    #[default]
    Skip,
    Overwrite,
}

impl FromStr for Resolution {
    type Err = ApplicationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "skip" | "s" => Ok(Self::Skip),
            "overwrite" | "o" => Ok(Self::Overwrite),
            other => Err(ApplicationError::InvalidInput(format!(
                "resolution must be skip or overwrite, got {other}"
            ))),
        }
    }
}

/// Decisions keyed by conflict; a missing key means skip.
pub type Decisions = HashMap<ConflictId, Resolution>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportPlan {
    /// Records with no title clash, already given fresh identifiers.
    pub ready: Vec<Book>,
    /// Clashing records in input order.
    pub conflicts: Vec<ImportConflict>,
    /// Records dropped for having an empty title.
    pub dropped: usize,
}

/// Splits `incoming` into records that can be written directly and records
/// whose title is already taken by one of `existing`.
pub fn plan_import(incoming: Vec<Book>, existing: &[Book], ids: &dyn IdSource) -> ImportPlan {
    let mut by_title: HashMap<String, &Book> = HashMap::new();
    for book in existing {
        by_title.insert(book.title_key(), book);
    }

    let mut plan = ImportPlan::default();
    for mut book in incoming {
        if book.title.trim().is_empty() {
            plan.dropped += 1;
            continue;
        }

        match by_title.get(&book.title_key()) {
            Some(existing) => {
                let id = ConflictId(plan.conflicts.len());
                plan.conflicts.push(ImportConflict {
                    id,
                    existing: (*existing).clone(),
                    incoming: book,
                });
            }
            None => {
                book.id = BookId::fresh(ids);
                plan.ready.push(book);
            }
        }
    }

    plan
}

/// An import whose clean records are stored and whose conflicts await decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImport {
    pub(crate) ready: Vec<Book>,
    pub(crate) conflicts: Vec<ImportConflict>,
    pub(crate) dropped: usize,
}

impl PendingImport {
    pub fn conflicts(&self) -> &[ImportConflict] {
        &self.conflicts
    }

    pub fn ready_count(&self) -> usize {
        self.ready.len()
    }

    pub fn session(&self) -> ImportSession<'_> {
        ImportSession {
            conflicts: &self.conflicts,
            cursor: 0,
            decisions: Decisions::new(),
        }
    }
}

/// Walks the conflicts of a [`PendingImport`] one at a time.
#[derive(Debug)]
pub struct ImportSession<'a> {
    conflicts: &'a [ImportConflict],
    cursor: usize,
    decisions: Decisions,
}

impl<'a> ImportSession<'a> {
    pub fn current(&self) -> Option<&'a ImportConflict> {
        self.conflicts.get(self.cursor)
    }

    pub fn position(&self) -> (usize, usize) {
        (self.cursor.min(self.conflicts.len()), self.conflicts.len())
    }

    /// Records `resolution` for the current conflict and moves to the next one.
    pub fn decide(&mut self, resolution: Resolution) -> bool {
        let Some(conflict) = self.current() else {
            return false;
        };
        self.decisions.insert(conflict.id, resolution);
        self.cursor += 1;
        true
    }

    /// Applies `resolution` to every conflict not yet decided.
    pub fn decide_remaining(&mut self, resolution: Resolution) {
        while self.decide(resolution) {}
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.conflicts.len()
    }

    pub fn into_decisions(self) -> Decisions {
        self.decisions
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Completed(ImportSummary),
    NeedsResolution(PendingImport),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub overwritten: usize,
    pub skipped: usize,
    pub dropped: usize,
    pub exit_edit_context: bool,
}
