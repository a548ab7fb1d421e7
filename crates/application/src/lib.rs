mod error;
mod import;
mod ports;
mod preferences;
mod service;
mod use_cases;

pub use error::ApplicationError;
pub use import::{
    plan_import, ConflictId, Decisions, ImportConflict, ImportOutcome, ImportPlan, ImportSession,
    ImportSummary, PendingImport, Resolution,
};
pub use novellog_domain::IdSource;
pub use ports::{BookRepository, Clock, PreferenceStore};
pub use preferences::{Preferences, Theme, DEFAULT_LANGUAGE, LANGUAGE_KEY, THEME_KEY};
pub use service::{
    ApplicationService, BootstrapReport, DeleteOutcome, ExportBundle, SaveOutcome,
    BACKUP_FILE_PREFIX,
};
pub use use_cases::{
    AddEntryCommand, BatchDeleteCommand, BootstrapCommand, ClearLibraryCommand,
    CreateBookCommand, DeleteBookCommand, DeleteEntryCommand, ExportCommand,
    FinishImportCommand, ImportCommand, SetLanguageCommand, SetThemeCommand, UpdateBookCommand,
    ViewQuery,
};
