/// Schema statements applied in order on every start; each one is idempotent.
pub const MIGRATIONS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS books (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        record_json TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_books_updated_at ON books (updated_at DESC)",
    "CREATE TABLE IF NOT EXISTS legacy_notes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        record_json TEXT NOT NULL
    )",
];
