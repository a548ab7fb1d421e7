mod queries;

use std::fs;
use std::path::{Path, PathBuf};

use novellog_application::{ApplicationError, BookRepository};
use novellog_domain::{Book, BookId};
use rusqlite::Connection;
use serde_json::Value;

use crate::migrations::MIGRATIONS;

#[derive(Debug, Clone)]
pub struct SqliteBookRepository {
    path: PathBuf,
}

impl SqliteBookRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_connection(&self) -> Result<Connection, ApplicationError> {
        Connection::open(&self.path).map_err(persistence)
    }
}

fn persistence(error: rusqlite::Error) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

fn encode(book: &Book) -> Result<String, ApplicationError> {
    serde_json::to_string(book).map_err(|error| ApplicationError::Persistence(error.to_string()))
}

impl BookRepository for SqliteBookRepository {
    fn initialize(&self) -> Result<(), ApplicationError> {
        if self.path.as_os_str().is_empty() {
            return Err(ApplicationError::InvalidInput(
                "catalog path must not be empty".to_string(),
            ));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|error| ApplicationError::Io(error.to_string()))?;
            }
        }

        let conn = self.open_connection()?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(persistence)?;

        for migration in MIGRATIONS {
            conn.execute_batch(migration).map_err(persistence)?;
        }

        Ok(())
    }

    fn get_all(&self) -> Result<Vec<Book>, ApplicationError> {
        let conn = self.open_connection()?;
        let rows = queries::list_book_rows(&conn).map_err(persistence)?;

        let mut books = Vec::with_capacity(rows.len());
        for (id, record_json) in rows {
            match serde_json::from_str::<Book>(&record_json) {
                Ok(book) => books.push(book),
                Err(error) => tracing::warn!(%id, %error, "skipping unreadable book row"),
            }
        }
        Ok(books)
    }

    fn put(&self, book: &Book) -> Result<(), ApplicationError> {
        let conn = self.open_connection()?;
        queries::upsert_book(&conn, book, &encode(book)?).map_err(persistence)
    }

    fn put_many(&self, books: &[Book]) -> Result<(), ApplicationError> {
        let mut conn = self.open_connection()?;
        let tx = conn.transaction().map_err(persistence)?;
        for book in books {
            queries::upsert_book(&tx, book, &encode(book)?).map_err(persistence)?;
        }
        tx.commit().map_err(persistence)
    }

    fn delete(&self, id: &BookId) -> Result<(), ApplicationError> {
        let conn = self.open_connection()?;
        queries::delete_book(&conn, id.as_str()).map_err(persistence)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), ApplicationError> {
        let conn = self.open_connection()?;
        queries::clear_books(&conn).map_err(persistence)?;
        Ok(())
    }

    fn commit_import(&self, removed: &[BookId], added: &[Book]) -> Result<(), ApplicationError> {
        let mut conn = self.open_connection()?;
        let tx = conn.transaction().map_err(persistence)?;
        for id in removed {
            queries::delete_book(&tx, id.as_str()).map_err(persistence)?;
        }
        for book in added {
            queries::upsert_book(&tx, book, &encode(book)?).map_err(persistence)?;
        }
        tx.commit().map_err(persistence)
    }

    fn list_legacy_records(&self) -> Result<Vec<Value>, ApplicationError> {
        let conn = self.open_connection()?;
        queries::list_legacy_rows(&conn)
            .map_err(persistence)?
            .into_iter()
            .map(|(row_id, record_json)| {
                serde_json::from_str(&record_json).map_err(|error| {
                    ApplicationError::Persistence(format!("legacy row {row_id}: {error}"))
                })
            })
            .collect()
    }

    fn complete_legacy_migration(&self, books: &[Book]) -> Result<(), ApplicationError> {
        let mut conn = self.open_connection()?;
        let tx = conn.transaction().map_err(persistence)?;
        for book in books {
            queries::upsert_book(&tx, book, &encode(book)?).map_err(persistence)?;
        }
        queries::clear_legacy(&tx).map_err(persistence)?;
        tx.commit().map_err(persistence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use novellog_domain::{BookDraft, Entry, EntryId, Rating};
    use rusqlite::params;
    use tempfile::TempDir;

    fn repo(dir: &TempDir) -> SqliteBookRepository {
        let repo = SqliteBookRepository::new(dir.path().join("data").join("novellog.sqlite3"));
        repo.initialize().expect("initialize");
        repo
    }

    fn book(id: &str, title: &str, updated_at: i64) -> Book {
        let mut book = Book::create(
            BookId::new(id).expect("id"),
            BookDraft {
                title: title.to_string(),
                protagonists: vec!["Ann".to_string()],
                rating: Rating::new(60).expect("rating"),
                tags: vec!["tag".to_string()],
            },
            1,
        )
        .expect("book");
        book.prepend_entry(Entry {
            id: EntryId::new(format!("{id}-e")).expect("id"),
            content: "note".to_string(),
            images: vec!["data:image/png;base64,AAAA".to_string()],
            created_at: 1,
        });
        book.touch(updated_at);
        book
    }

    #[test]
    fn initialize_creates_schema_and_is_repeatable() {
        let dir = TempDir::new().expect("tempdir");
        let repo = repo(&dir);
        repo.initialize().expect("second initialize");

        let conn = Connection::open(repo.path()).expect("open");
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('books', 'legacy_notes')",
                [],
                |row| row.get(0),
            )
            .expect("query");
        assert_eq!(count, 2);
    }

    #[test]
    fn initialize_rejects_empty_path() {
        let repo = SqliteBookRepository::new("");
        assert!(matches!(
            repo.initialize(),
            Err(ApplicationError::InvalidInput(_))
        ));
    }

    #[test]
    fn put_get_and_replace() {
        let dir = TempDir::new().expect("tempdir");
        let repo = repo(&dir);
        let mut stored = book("a", "Alpha", 10);
        repo.put(&stored).expect("put");
        repo.put(&book("b", "Beta", 20)).expect("put");

        let all = repo.get_all().expect("get all");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Beta");
        assert_eq!(all[1], stored);

        stored.title = "Alpha Revised".to_string();
        stored.touch(30);
        repo.put(&stored).expect("put again");
        let all = repo.get_all().expect("get all");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Alpha Revised");
    }

    #[test]
    fn delete_of_unknown_id_is_a_no_op() {
        let dir = TempDir::new().expect("tempdir");
        let repo = repo(&dir);
        repo.put(&book("a", "Alpha", 10)).expect("put");
        repo.delete(&BookId::new("zzz").expect("id")).expect("no-op");
        repo.delete(&BookId::new("a").expect("id")).expect("delete");
        assert!(repo.get_all().expect("get all").is_empty());
    }

    #[test]
    fn put_many_and_clear() {
        let dir = TempDir::new().expect("tempdir");
        let repo = repo(&dir);
        repo.put_many(&[book("a", "A", 1), book("b", "B", 2), book("c", "C", 3)])
            .expect("put many");
        assert_eq!(repo.get_all().expect("get all").len(), 3);
        repo.clear().expect("clear");
        assert!(repo.get_all().expect("get all").is_empty());
    }

    #[test]
    fn commit_import_removes_and_adds_together() {
        let dir = TempDir::new().expect("tempdir");
        let repo = repo(&dir);
        repo.put(&book("old", "Foo", 1)).expect("put");

        repo.commit_import(
            &[BookId::new("old").expect("id")],
            &[book("new", "Foo", 2), book("bar", "Bar", 3)],
        )
        .expect("commit");

        let ids: Vec<String> = repo
            .get_all()
            .expect("get all")
            .into_iter()
            .map(|book| book.id.to_string())
            .collect();
        assert_eq!(ids, vec!["bar", "new"]);
    }

    #[test]
    fn legacy_rows_are_listed_and_cleared_with_migration() {
        let dir = TempDir::new().expect("tempdir");
        let repo = repo(&dir);
        {
            let conn = Connection::open(repo.path()).expect("open");
            conn.execute(
                "INSERT INTO legacy_notes (record_json) VALUES (?1)",
                params![r#"{"id":1,"title":"Old","protagonist":"P","content":"flat"}"#],
            )
            .expect("insert legacy");
        }

        let legacy = repo.list_legacy_records().expect("legacy");
        assert_eq!(legacy.len(), 1);
        assert_eq!(legacy[0]["title"], "Old");

        repo.complete_legacy_migration(&[book("1", "Old", 5)])
            .expect("complete");
        assert!(repo.list_legacy_records().expect("legacy").is_empty());
        assert_eq!(repo.get_all().expect("get all").len(), 1);
    }

    #[test]
    fn unreadable_legacy_row_is_an_error_and_kept() {
        let dir = TempDir::new().expect("tempdir");
        let repo = repo(&dir);
        {
            let conn = Connection::open(repo.path()).expect("open");
            conn.execute(
                "INSERT INTO legacy_notes (record_json) VALUES ('{broken')",
                [],
            )
            .expect("insert legacy");
        }
        assert!(matches!(
            repo.list_legacy_records(),
            Err(ApplicationError::Persistence(_))
        ));

        let conn = Connection::open(repo.path()).expect("open");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM legacy_notes", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 1);
    }
}
