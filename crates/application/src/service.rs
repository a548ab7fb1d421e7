use novellog_domain::{
    all_tags, migrate_records_with_report, view, Book, BookId, Entry, EntryId, IdSource,
};
use serde_json::Value;

use crate::{
    plan_import, AddEntryCommand, ApplicationError, BatchDeleteCommand, BookRepository, BootstrapCommand,
    ClearLibraryCommand, Clock, CreateBookCommand, DeleteBookCommand, DeleteEntryCommand,
    ExportCommand, FinishImportCommand, ImportCommand, ImportOutcome, ImportSummary,
    PendingImport, PreferenceStore, Preferences, Resolution, SetLanguageCommand,
    SetThemeCommand, Theme, UpdateBookCommand, ViewQuery, LANGUAGE_KEY, THEME_KEY,
};

pub const BACKUP_FILE_PREFIX: &str = "novellog_backup_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub book: Book,
    /// Another book already uses this title, ignoring case. Advisory only.
    pub duplicate_title: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub removed: usize,
    /// The book open in the editor was deleted; the editor must close.
    pub exit_edit_context: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub books: usize,
    pub migrated: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    pub file_name: String,
    pub json: String,
    pub books: usize,
}

/// Owns the in-memory book collection and keeps it in step with the store.
pub struct ApplicationService {
    repository: Box<dyn BookRepository>,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdSource>,
    preference_store: Box<dyn PreferenceStore>,
    books: Vec<Book>,
    editing: Option<BookId>,
    preferences: Preferences,
}

impl ApplicationService {
    pub fn new(
        repository: Box<dyn BookRepository>,
        clock: Box<dyn Clock>,
        ids: Box<dyn IdSource>,
        preference_store: Box<dyn PreferenceStore>,
    ) -> Self {
        Self {
            repository,
            clock,
            ids,
            preference_store,
            books: Vec::new(),
            editing: None,
            preferences: Preferences::default(),
        }
    }

    pub fn bootstrap(
        &mut self,
        _command: BootstrapCommand,
    ) -> Result<BootstrapReport, ApplicationError> {
        self.repository.initialize()?;
        let migrated = self.migrate_legacy_records();
        self.reload()?;
        self.preferences = self.load_preferences().unwrap_or_else(|error| {
            tracing::warn!(%error, "preferences unreadable; using defaults");
            Preferences::default()
        });
        tracing::info!(books = self.books.len(), migrated, "library loaded");
        Ok(BootstrapReport {
            books: self.books.len(),
            migrated,
        })
    }

    /// Upgrades records left by older builds. Failures leave them in place so
    /// the next launch can retry.
    fn migrate_legacy_records(&self) -> usize {
        match self.try_migrate_legacy_records() {
            Ok(migrated) => migrated,
            Err(error) => {
                tracing::error!(%error, "legacy migration failed; legacy records left untouched");
                0
            }
        }
    }

    fn try_migrate_legacy_records(&self) -> Result<usize, ApplicationError> {
        let records = self.repository.list_legacy_records()?;
        if records.is_empty() {
            return Ok(0);
        }

        let report = migrate_records_with_report(
            &Value::Array(records),
            self.clock.now_millis(),
            self.ids.as_ref(),
        );
        if report.skipped > 0 {
            tracing::warn!(skipped = report.skipped, "legacy records that are not objects were dropped");
        }
        if report.dropped_values > 0 {
            tracing::warn!(
                dropped = report.dropped_values,
                "unreadable values left out of upgraded legacy records"
            );
        }
        self.repository.complete_legacy_migration(&report.books)?;
        tracing::info!(
            migrated = report.books.len(),
            upgraded = report.upgraded,
            "legacy records upgraded"
        );
        Ok(report.books.len())
    }

    pub fn reload(&mut self) -> Result<(), ApplicationError> {
        self.books = self.repository.get_all()?;
        let editing_gone = self
            .editing
            .as_ref()
            .is_some_and(|editing| !self.books.iter().any(|book| &book.id == editing));
        if editing_gone {
            self.editing = None;
        }
        Ok(())
    }

    /// Re-reads the store after a failed write so memory does not drift from it.
    fn resync_after_failure(&mut self, error: ApplicationError) -> ApplicationError {
        tracing::warn!(%error, "write failed; reloading library from store");
        if let Err(reload_error) = self.reload() {
            tracing::warn!(error = %reload_error, "reload after failed write also failed");
        }
        error
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn find(&self, id: &BookId) -> Option<&Book> {
        self.books.iter().find(|book| &book.id == id)
    }

    pub fn view(&self, query: &ViewQuery) -> Vec<&Book> {
        view(&self.books, &query.text, &query.tags, query.sort)
    }

    pub fn tags(&self) -> Vec<String> {
        all_tags(&self.books)
    }

    pub fn has_duplicate_title(&self, title: &str, except: Option<&BookId>) -> bool {
        self.books
            .iter()
            .filter(|book| Some(&book.id) != except)
            .any(|book| book.has_title(title))
    }

    pub fn open_book(&mut self, id: &BookId) -> Option<&Book> {
        let book = self.books.iter().find(|book| &book.id == id)?;
        self.editing = Some(book.id.clone());
        Some(book)
    }

    pub fn close_book(&mut self) {
        self.editing = None;
    }

    pub fn editing(&self) -> Option<&BookId> {
        self.editing.as_ref()
    }

    pub fn create(&mut self, command: CreateBookCommand) -> Result<SaveOutcome, ApplicationError> {
        let now = self.clock.now_millis();
        let duplicate_title = self.has_duplicate_title(&command.draft.title, None);

        let mut book = Book::create(BookId::fresh(self.ids.as_ref()), command.draft, now)?;
        if let Some(entry) = command.unsaved_entry.filter(|entry| !entry.is_blank()) {
            book.prepend_entry(Entry::from_draft(
                EntryId::fresh(self.ids.as_ref()),
                entry,
                now,
            )?);
        }

        if let Err(error) = self.repository.put(&book) {
            return Err(self.resync_after_failure(error));
        }
        self.books.insert(0, book.clone());
        tracing::info!(id = %book.id, title = %book.title, "book created");

        Ok(SaveOutcome {
            book,
            duplicate_title,
        })
    }

    /// Merges the patch over a stored book. Unknown ids are ignored and yield `None`.
    pub fn update(
        &mut self,
        command: UpdateBookCommand,
    ) -> Result<Option<SaveOutcome>, ApplicationError> {
        let UpdateBookCommand {
            id,
            patch,
            unsaved_entry,
        } = command;
        let saved = self.modify(&id, |book, now, ids| {
            book.apply_patch(patch)?;
            if let Some(entry) = unsaved_entry.filter(|entry| !entry.is_blank()) {
                book.prepend_entry(Entry::from_draft(
                    EntryId::fresh(ids),
                    entry,
                    now,
                )?);
            }
            Ok(())
        })?;

        Ok(saved.map(|book| SaveOutcome {
            duplicate_title: self.has_duplicate_title(&book.title, Some(&book.id)),
            book,
        }))
    }

    pub fn add_entry(&mut self, command: AddEntryCommand) -> Result<Option<Book>, ApplicationError> {
        command.entry.validate()?;
        let AddEntryCommand { book_id, entry } = command;
        self.modify(&book_id, |book, now, ids| {
            book.prepend_entry(Entry::from_draft(
                EntryId::fresh(ids),
                entry,
                now,
            )?);
            Ok(())
        })
    }

    pub fn delete_entry(
        &mut self,
        command: DeleteEntryCommand,
    ) -> Result<Option<Book>, ApplicationError> {
        let DeleteEntryCommand { book_id, entry_id } = command;
        self.modify(&book_id, |book, _now, _ids| {
            book.remove_entry(&entry_id).map(|_| ()).ok_or_else(|| {
                ApplicationError::NotFound(format!("entry {entry_id} in book {}", book.id))
            })
        })
    }

    fn modify<F>(&mut self, id: &BookId, edit: F) -> Result<Option<Book>, ApplicationError>
    where
        F: FnOnce(&mut Book, i64, &dyn IdSource) -> Result<(), ApplicationError>,
    {
        let Some(index) = self.books.iter().position(|book| &book.id == id) else {
            tracing::debug!(%id, "ignoring edit of a book that is not loaded");
            return Ok(None);
        };

        let now = self.clock.now_millis();
        let mut book = self.books[index].clone();
        edit(&mut book, now, self.ids.as_ref())?;
        book.touch(now);

        if let Err(error) = self.repository.put(&book) {
            return Err(self.resync_after_failure(error));
        }
        self.books[index] = book.clone();
        tracing::info!(%id, "book updated");
        Ok(Some(book))
    }

    pub fn delete(&mut self, command: DeleteBookCommand) -> Result<DeleteOutcome, ApplicationError> {
        self.batch_delete(BatchDeleteCommand {
            ids: vec![command.id],
        })
    }

    /// Deletes one id at a time; ids deleted before a failure stay deleted.
    pub fn batch_delete(
        &mut self,
        command: BatchDeleteCommand,
    ) -> Result<DeleteOutcome, ApplicationError> {
        let mut outcome = DeleteOutcome::default();
        for id in &command.ids {
            if let Err(error) = self.repository.delete(id) {
                return Err(self.resync_after_failure(error));
            }
            let before = self.books.len();
            self.books.retain(|book| &book.id != id);
            outcome.removed += before - self.books.len();
            if self.editing.as_ref() == Some(id) {
                self.editing = None;
                outcome.exit_edit_context = true;
            }
        }
        tracing::info!(removed = outcome.removed, "books deleted");
        Ok(outcome)
    }

    pub fn clear_library(
        &mut self,
        _command: ClearLibraryCommand,
    ) -> Result<DeleteOutcome, ApplicationError> {
        if let Err(error) = self.repository.clear() {
            return Err(self.resync_after_failure(error));
        }
        let outcome = DeleteOutcome {
            removed: self.books.len(),
            exit_edit_context: self.editing.is_some(),
        };
        self.books.clear();
        self.editing = None;
        tracing::info!(removed = outcome.removed, "library cleared");
        Ok(outcome)
    }

    /// Serializes the stored books as a bare JSON array.
    pub fn export(&self, _command: ExportCommand) -> Result<ExportBundle, ApplicationError> {
        let books = self.repository.get_all()?;
        let json = serde_json::to_string_pretty(&books)
            .map_err(|error| ApplicationError::Persistence(error.to_string()))?;
        let file_name = format!("{BACKUP_FILE_PREFIX}{}.json", self.clock.today_iso_date());
        tracing::info!(books = books.len(), %file_name, "library exported");
        Ok(ExportBundle {
            file_name,
            json,
            books: books.len(),
        })
    }

    /// Parses an import file and stores every record whose title is free.
    ///
    /// Records whose title is already taken come back as a [`PendingImport`]
    /// to be resolved with [`Self::finish_import`].
    pub fn begin_import(&mut self, command: ImportCommand) -> Result<ImportOutcome, ApplicationError> {
        let value: Value = serde_json::from_str(&command.json)
            .map_err(|error| ApplicationError::Parse(error.to_string()))?;
        if !value.is_array() {
            return Err(ApplicationError::Parse(
                "import file must contain a JSON array of books".to_string(),
            ));
        }

        let report =
            migrate_records_with_report(&value, self.clock.now_millis(), self.ids.as_ref());
        if report.skipped > 0 {
            tracing::warn!(skipped = report.skipped, "import entries that are not objects were ignored");
        }
        if report.dropped_values > 0 {
            tracing::warn!(
                dropped = report.dropped_values,
                "unreadable values left out of imported records"
            );
        }
        tracing::debug!(
            records = report.books.len(),
            upgraded = report.upgraded,
            "import file normalized"
        );

        let plan = plan_import(report.books, &self.books, self.ids.as_ref());
        if !plan.ready.is_empty() {
            if let Err(error) = self.repository.put_many(&plan.ready) {
                return Err(self.resync_after_failure(error));
            }
            self.reload()?;
        }

        if plan.conflicts.is_empty() {
            tracing::info!(imported = plan.ready.len(), dropped = plan.dropped, "import finished");
            return Ok(ImportOutcome::Completed(ImportSummary {
                imported: plan.ready.len(),
                dropped: plan.dropped,
                ..ImportSummary::default()
            }));
        }

        tracing::info!(
            imported = plan.ready.len(),
            conflicts = plan.conflicts.len(),
            "import waiting for conflict decisions"
        );
        Ok(ImportOutcome::NeedsResolution(PendingImport {
            ready: plan.ready,
            conflicts: plan.conflicts,
            dropped: plan.dropped,
        }))
    }

    /// Applies conflict decisions. Overwrites replace the existing book with
    /// the incoming one under a fresh id; removals and inserts share one
    /// transaction. Records stored by [`Self::begin_import`] are not written
    /// again. The collection is reloaded from the store afterwards.
    pub fn finish_import(
        &mut self,
        command: FinishImportCommand,
    ) -> Result<ImportSummary, ApplicationError> {
        let FinishImportCommand { pending, decisions } = command;
        let mut summary = ImportSummary {
            dropped: pending.dropped,
            ..ImportSummary::default()
        };

        let mut added = Vec::new();
        let mut removed = Vec::new();
        for conflict in &pending.conflicts {
            let resolution = decisions.get(&conflict.id).copied().unwrap_or_default();
            match resolution {
                Resolution::Overwrite => {
                    let mut incoming = conflict.incoming.clone();
                    incoming.id = BookId::fresh(self.ids.as_ref());
                    removed.push(conflict.existing.id.clone());
                    added.push(incoming);
                    summary.overwritten += 1;
                }
                Resolution::Skip => summary.skipped += 1,
            }
        }

        if let Err(error) = self.repository.commit_import(&removed, &added) {
            return Err(self.resync_after_failure(error));
        }

        summary.exit_edit_context = self
            .editing
            .as_ref()
            .is_some_and(|editing| removed.contains(editing));
        self.reload()?;
        summary.imported = pending.ready.len() + added.len();

        tracing::info!(
            imported = summary.imported,
            overwritten = summary.overwritten,
            skipped = summary.skipped,
            "import finished"
        );
        Ok(summary)
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn load_preferences(&self) -> Result<Preferences, ApplicationError> {
        let mut preferences = Preferences::default();
        if let Some(theme) = self.preference_store.get(THEME_KEY)? {
            match theme.parse::<Theme>() {
                Ok(theme) => preferences.theme = theme,
                Err(error) => tracing::warn!(%error, "ignoring stored theme"),
            }
        }
        if let Some(language) = self.preference_store.get(LANGUAGE_KEY)? {
            if !language.trim().is_empty() {
                preferences.language = language;
            }
        }
        Ok(preferences)
    }

    pub fn set_theme(&mut self, command: SetThemeCommand) -> Result<(), ApplicationError> {
        self.preference_store
            .set(THEME_KEY, command.theme.as_str())?;
        self.preferences.theme = command.theme;
        Ok(())
    }

    pub fn set_language(&mut self, command: SetLanguageCommand) -> Result<(), ApplicationError> {
        let language = command.language.trim();
        if language.is_empty() {
            return Err(ApplicationError::InvalidInput(
                "language must not be empty".to_string(),
            ));
        }
        self.preference_store.set(LANGUAGE_KEY, language)?;
        self.preferences.language = language.to_string();
        Ok(())
    }
}
