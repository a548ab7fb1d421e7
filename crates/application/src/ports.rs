use novellog_domain::{Book, BookId};
use serde_json::Value;

use crate::ApplicationError;

/// Key-value store of books keyed by identifier.
///
/// After `put`/`put_many` return, `get_all` reflects the write. Deleting an
/// unknown identifier is a no-op.
pub trait BookRepository {
    fn initialize(&self) -> Result<(), ApplicationError>;

    fn get_all(&self) -> Result<Vec<Book>, ApplicationError>;

    fn put(&self, book: &Book) -> Result<(), ApplicationError>;

    /// Writes every book in a single transaction.
    fn put_many(&self, books: &[Book]) -> Result<(), ApplicationError>;

    fn delete(&self, id: &BookId) -> Result<(), ApplicationError>;

    fn clear(&self) -> Result<(), ApplicationError>;

    /// Removes `removed` and writes `added` in a single transaction.
    fn commit_import(&self, removed: &[BookId], added: &[Book]) -> Result<(), ApplicationError>;

    /// Raw records left behind by builds that predate the book/entry layout.
    fn list_legacy_records(&self) -> Result<Vec<Value>, ApplicationError>;

    /// Stores the upgraded books and empties the legacy area atomically.
    fn complete_legacy_migration(&self, books: &[Book]) -> Result<(), ApplicationError>;
}

pub trait Clock {
    fn now_millis(&self) -> i64;

    /// Current date as `YYYY-MM-DD`.
    fn today_iso_date(&self) -> String;
}

/// Small sticky values kept outside the book store.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApplicationError>;

    fn set(&self, key: &str, value: &str) -> Result<(), ApplicationError>;
}
