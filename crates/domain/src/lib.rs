mod book;
mod error;
mod legacy;
mod view;
mod words;

pub use book::{
    Book, BookDraft, BookId, BookPatch, Entry, EntryDraft, EntryId, IdSource, Rating, MAX_RATING,
};
pub use error::DomainError;
pub use legacy::{
    migrate_records, migrate_records_with_report, LegacyRecord, MigrationReport, StoredRecord,
    UpgradedRecord,
};
pub use view::{all_tags, view, SortField};
pub use words::count_words;
