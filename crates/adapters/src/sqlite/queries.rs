use novellog_domain::Book;
use rusqlite::{params, Connection, Result};

pub fn upsert_book(conn: &Connection, book: &Book, record_json: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO books (id, title, record_json, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            record_json = excluded.record_json,
            created_at = excluded.created_at,
            updated_at = excluded.updated_at",
        params![
            book.id.as_str(),
            book.title,
            record_json,
            book.created_at,
            book.updated_at
        ],
    )?;
    Ok(())
}

pub fn delete_book(conn: &Connection, id: &str) -> Result<usize> {
    conn.execute("DELETE FROM books WHERE id = ?1", params![id])
}

pub fn clear_books(conn: &Connection) -> Result<usize> {
    conn.execute("DELETE FROM books", [])
}

/// `(id, record_json)` pairs, most recently updated first.
pub fn list_book_rows(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT id, record_json
         FROM books
         ORDER BY updated_at DESC, id",
    )?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

pub fn list_legacy_rows(conn: &Connection) -> Result<Vec<(i64, String)>> {
    let mut stmt = conn.prepare("SELECT id, record_json FROM legacy_notes ORDER BY id")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

pub fn clear_legacy(conn: &Connection) -> Result<usize> {
    conn.execute("DELETE FROM legacy_notes", [])
}
