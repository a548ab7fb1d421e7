use std::collections::BTreeSet;

use novellog_domain::{BookDraft, BookId, BookPatch, EntryDraft, EntryId, SortField};

use crate::{Decisions, PendingImport, Theme};

#[derive(Debug, Clone, Default)]
pub struct BootstrapCommand;

#[derive(Debug, Clone, Default)]
pub struct CreateBookCommand {
    pub draft: BookDraft,
    /// Note text still sitting in the editor when the book is saved.
    pub unsaved_entry: Option<EntryDraft>,
}

#[derive(Debug, Clone)]
pub struct UpdateBookCommand {
    pub id: BookId,
    pub patch: BookPatch,
    pub unsaved_entry: Option<EntryDraft>,
}

#[derive(Debug, Clone)]
pub struct AddEntryCommand {
    pub book_id: BookId,
    pub entry: EntryDraft,
}

#[derive(Debug, Clone)]
pub struct DeleteEntryCommand {
    pub book_id: BookId,
    pub entry_id: EntryId,
}

#[derive(Debug, Clone)]
pub struct DeleteBookCommand {
    pub id: BookId,
}

#[derive(Debug, Clone, Default)]
pub struct BatchDeleteCommand {
    pub ids: Vec<BookId>,
}

#[derive(Debug, Clone, Default)]
pub struct ClearLibraryCommand;

#[derive(Debug, Clone, Default)]
pub struct ViewQuery {
    pub text: String,
    pub tags: BTreeSet<String>,
    pub sort: SortField,
}

#[derive(Debug, Clone, Default)]
pub struct ExportCommand;

#[derive(Debug, Clone)]
pub struct ImportCommand {
    pub json: String,
}

#[derive(Debug, Clone)]
pub struct FinishImportCommand {
    pub pending: PendingImport,
    pub decisions: Decisions,
}

#[derive(Debug, Clone, Copy)]
pub struct SetThemeCommand {
    pub theme: Theme,
}

#[derive(Debug, Clone)]
pub struct SetLanguageCommand {
    pub language: String,
}
