//! Upgrade of stored or imported records into the canonical [`Book`] shape.
//!
//! Early builds kept one flat note per book: a single `protagonist` string and
//! `content`/`images` directly on the record. Current records carry an
//! `entries` list. Both shapes can appear in the same backup file.
//!
//! Lists are salvaged element by element: a malformed entry, tag or image is
//! dropped on its own and counted, the rest of the list is kept.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{Book, BookId, Entry, EntryId, IdSource, Rating};

/// A record as read from disk or from an import file.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredRecord {
    Current(Book),
    Legacy(LegacyRecord),
}

/// Every field optional. Scalars of an unexpected type read as absent; list
/// fields keep their raw JSON until [`LegacyRecord::upgrade`] sorts them out.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<BookId>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default)]
    pub protagonists: Option<Value>,
    #[serde(default)]
    pub protagonist: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub tags: Option<Value>,
    #[serde(default)]
    pub entries: Option<Value>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub images: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub updated_at: Option<f64>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// A legacy record brought to the canonical shape, with the number of list
/// elements or fields that could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradedRecord {
    pub book: Book,
    pub dropped_values: usize,
}

impl StoredRecord {
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }

    pub fn upgrade(self, now: i64, ids: &dyn IdSource) -> Book {
        match self {
            Self::Current(book) => book,
            Self::Legacy(record) => record.upgrade(now, ids).book,
        }
    }
}

impl LegacyRecord {
    pub fn upgrade(self, now: i64, ids: &dyn IdSource) -> UpgradedRecord {
        let mut dropped = 0;
        let record_updated_at = self.updated_at.map(to_millis);
        let entry_created_at = record_updated_at.unwrap_or(now);

        let entries = match self.entries {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| upgrade_entry(item, entry_created_at, ids, &mut dropped))
                .collect(),
            other => {
                if other.is_some_and(|value| !value.is_null()) {
                    dropped += 1;
                }
                let content = read_text(self.content, &mut dropped).unwrap_or_default();
                let images = text_list(self.images, image_text, &mut dropped).unwrap_or_default();
                if content.is_empty() && images.is_empty() {
                    Vec::new()
                } else {
                    vec![Entry {
                        id: EntryId::fresh(ids),
                        content,
                        images,
                        created_at: entry_created_at,
                    }]
                }
            }
        };

        let protagonists = match text_list(self.protagonists, scalar_text, &mut dropped) {
            Some(list) => list,
            None => read_text(self.protagonist, &mut dropped)
                .filter(|single| !single.trim().is_empty())
                .map(|single| vec![single])
                .unwrap_or_default(),
        };
        let tags = text_list(self.tags, scalar_text, &mut dropped).unwrap_or_default();

        let created_at = self.created_at.map(to_millis).unwrap_or(now);
        let updated_at = record_updated_at.unwrap_or(now).max(created_at);

        UpgradedRecord {
            book: Book {
                id: self.id.unwrap_or_else(|| BookId::fresh(ids)),
                title: self.title.unwrap_or_default(),
                protagonists,
                rating: self.rating.map(Rating::saturating).unwrap_or_default(),
                tags,
                entries,
                created_at,
                updated_at,
            },
            dropped_values: dropped,
        }
    }
}

/// Reads one element of an `entries` list. Missing ids are generated and a
/// missing timestamp falls back to `fallback_created_at`.
fn upgrade_entry(
    value: Value,
    fallback_created_at: i64,
    ids: &dyn IdSource,
    dropped: &mut usize,
) -> Option<Entry> {
    let Value::Object(mut fields) = value else {
        *dropped += 1;
        return None;
    };

    let id = fields
        .remove("id")
        .and_then(|raw| EntryId::deserialize(raw).ok())
        .unwrap_or_else(|| EntryId::fresh(ids));
    let content = read_text(fields.remove("content"), dropped).unwrap_or_default();
    let images = text_list(fields.remove("images"), image_text, dropped).unwrap_or_default();
    let created_at = fields
        .remove("createdAt")
        .and_then(|raw| raw.as_f64())
        .map(to_millis)
        .unwrap_or(fallback_created_at);

    Some(Entry {
        id,
        content,
        images,
        created_at,
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn image_text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

/// A scalar field read as text; `null` is absent, anything else unreadable
/// counts as dropped.
fn read_text(value: Option<Value>, dropped: &mut usize) -> Option<String> {
    let value = value.filter(|value| !value.is_null())?;
    let text = scalar_text(&value);
    if text.is_none() {
        *dropped += 1;
    }
    text
}

/// Keeps the readable elements of a list field. A lone scalar reads as a
/// one-element list.
fn text_list(
    value: Option<Value>,
    read: fn(&Value) -> Option<String>,
    dropped: &mut usize,
) -> Option<Vec<String>> {
    match value? {
        Value::Null => None,
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| {
                    let text = read(item);
                    if text.is_none() {
                        *dropped += 1;
                    }
                    text
                })
                .collect(),
        ),
        other => match read(&other) {
            Some(text) => Some(vec![text]),
            None => {
                *dropped += 1;
                None
            }
        },
    }
}

fn to_millis(value: f64) -> i64 {
    if value.is_finite() {
        value.round() as i64
    } else {
        0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub books: Vec<Book>,
    /// Records that needed upgrading from the legacy shape.
    pub upgraded: usize,
    /// Array elements that are not JSON objects.
    pub skipped: usize,
    /// Unreadable list elements and fields dropped from upgraded records.
    pub dropped_values: usize,
}

/// Normalizes a JSON array of current or legacy records.
///
/// Anything other than an array yields an empty result. Elements that are not
/// JSON objects are counted in `skipped`.
pub fn migrate_records_with_report(
    records: &Value,
    now: i64,
    ids: &dyn IdSource,
) -> MigrationReport {
    let mut report = MigrationReport::default();
    let Some(items) = records.as_array() else {
        return report;
    };

    for item in items {
        if !item.is_object() {
            report.skipped += 1;
            continue;
        }
        match StoredRecord::deserialize(item) {
            Ok(StoredRecord::Current(book)) => report.books.push(book),
            Ok(StoredRecord::Legacy(record)) => {
                let upgraded = record.upgrade(now, ids);
                report.upgraded += 1;
                report.dropped_values += upgraded.dropped_values;
                report.books.push(upgraded.book);
            }
            Err(_) => report.skipped += 1,
        }
    }

    report
}

pub fn migrate_records(records: &Value, now: i64, ids: &dyn IdSource) -> Vec<Book> {
    migrate_records_with_report(records, now, ids).books
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;

    struct CountingIds {
        next: Cell<u32>,
    }

    impl CountingIds {
        fn new() -> Self {
            Self { next: Cell::new(1) }
        }
    }

    impl IdSource for CountingIds {
        fn next_id(&self) -> String {
            let value = self.next.get();
            self.next.set(value + 1);
            format!("gen-{value}")
        }
    }

    #[test]
    fn non_array_input_yields_nothing() {
        let ids = CountingIds::new();
        assert!(migrate_records(&json!({"id": "a"}), 10, &ids).is_empty());
        assert!(migrate_records(&json!("text"), 10, &ids).is_empty());
        assert!(migrate_records(&Value::Null, 10, &ids).is_empty());
    }

    #[test]
    fn flat_note_becomes_single_entry() {
        let ids = CountingIds::new();
        let input = json!([{
            "id": "old-1",
            "title": "Mushoku",
            "protagonist": "Rudeus",
            "content": "chapter 12 was great",
            "images": [],
            "updatedAt": 500,
        }]);

        let books = migrate_records(&input, 900, &ids);
        assert_eq!(books.len(), 1);
        let book = &books[0];
        assert_eq!(book.id.as_str(), "old-1");
        assert_eq!(book.protagonists, vec!["Rudeus"]);
        assert_eq!(book.rating.get(), 0);
        assert!(book.tags.is_empty());
        assert_eq!(book.entries.len(), 1);
        assert_eq!(book.entries[0].id.as_str(), "gen-1");
        assert_eq!(book.entries[0].content, "chapter 12 was great");
        assert_eq!(book.entries[0].created_at, 500);
        assert_eq!(book.created_at, 900);
        assert_eq!(book.updated_at, 900);
    }

    #[test]
    fn synthesized_entry_uses_now_without_updated_at() {
        let ids = CountingIds::new();
        let input = json!([{ "id": 3, "title": "T", "images": ["data:image/png;base64,AA"] }]);
        let books = migrate_records(&input, 77, &ids);
        assert_eq!(books[0].id.as_str(), "3");
        assert_eq!(books[0].entries[0].created_at, 77);
        assert_eq!(books[0].entries[0].content, "");
    }

    #[test]
    fn record_without_notes_has_no_entries() {
        let ids = CountingIds::new();
        let input = json!([{ "id": "x", "title": "Empty", "content": "" }]);
        let books = migrate_records(&input, 1, &ids);
        assert!(books[0].entries.is_empty());
        assert_eq!(ids.next.get(), 1);
    }

    #[test]
    fn existing_entries_are_kept_unchanged() {
        let ids = CountingIds::new();
        let input = json!([{
            "id": "x",
            "title": "Kept",
            "protagonists": ["A", "B"],
            "entries": [{ "id": "e9", "content": "hi", "images": [], "createdAt": 3 }],
            "content": "ignored flat text",
            "createdAt": 1,
            "updatedAt": 2,
        }]);
        let books = migrate_records(&input, 99, &ids);
        assert_eq!(books[0].protagonists, vec!["A", "B"]);
        assert_eq!(books[0].entries.len(), 1);
        assert_eq!(books[0].entries[0].id.as_str(), "e9");
        assert_eq!(books[0].created_at, 1);
        assert_eq!(books[0].updated_at, 2);
    }

    #[test]
    fn entries_missing_id_or_timestamp_are_kept() {
        let ids = CountingIds::new();
        let input = json!([{
            "id": "a",
            "title": "T",
            "entries": [
                { "id": "e1", "content": "keep me" },
                { "content": "no id", "createdAt": 7 },
                { "id": 12, "content": "numeric id", "images": ["data:image/png;base64,AA", 5] },
            ],
            "createdAt": 1,
            "updatedAt": 4,
        }]);

        let report = migrate_records_with_report(&input, 99, &ids);
        let entries = &report.books[0].entries;
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].id.as_str(), "e1");
        assert_eq!(entries[0].content, "keep me");
        assert_eq!(entries[0].created_at, 4);
        assert_eq!(entries[1].id.as_str(), "gen-1");
        assert_eq!(entries[1].created_at, 7);
        assert_eq!(entries[2].id.as_str(), "12");
        assert_eq!(entries[2].images, vec!["data:image/png;base64,AA"]);
        assert_eq!(report.upgraded, 1);
        assert_eq!(report.dropped_values, 1);
    }

    #[test]
    fn malformed_entry_elements_are_dropped_one_by_one() {
        let ids = CountingIds::new();
        let input = json!([{
            "id": "a",
            "title": "T",
            "entries": ["loose text", { "id": "e1", "content": "kept" }, null],
        }]);
        let report = migrate_records_with_report(&input, 5, &ids);
        assert_eq!(report.books[0].entries.len(), 1);
        assert_eq!(report.books[0].entries[0].content, "kept");
        assert_eq!(report.dropped_values, 2);
    }

    #[test]
    fn mixed_type_lists_keep_readable_elements() {
        let ids = CountingIds::new();
        let input = json!([{
            "id": "a",
            "title": "T",
            "tags": ["fantasy", 3, { "nested": true }],
            "protagonists": ["Ann", null],
        }]);
        let report = migrate_records_with_report(&input, 5, &ids);
        let book = &report.books[0];
        assert_eq!(book.tags, vec!["fantasy", "3"]);
        assert_eq!(book.protagonists, vec!["Ann"]);
        assert_eq!(report.dropped_values, 2);
    }

    #[test]
    fn unreadable_flat_fields_are_counted() {
        let ids = CountingIds::new();
        let input = json!([{
            "id": "a",
            "title": "T",
            "protagonist": ["not", "a", "name"],
            "content": { "text": "odd" },
            "images": "data:image/png;base64,AA",
        }]);
        let report = migrate_records_with_report(&input, 5, &ids);
        let book = &report.books[0];
        assert!(book.protagonists.is_empty());
        assert_eq!(book.entries.len(), 1);
        assert_eq!(book.entries[0].content, "");
        assert_eq!(book.entries[0].images, vec!["data:image/png;base64,AA"]);
        assert_eq!(report.dropped_values, 2);
    }

    #[test]
    fn missing_identifier_is_generated() {
        let ids = CountingIds::new();
        let books = migrate_records(&json!([{ "title": "No id" }]), 5, &ids);
        assert_eq!(books[0].id.as_str(), "gen-1");
    }

    #[test]
    fn out_of_range_rating_is_clamped() {
        let ids = CountingIds::new();
        let books = migrate_records(&json!([{ "id": "r", "title": "R", "rating": 140 }]), 5, &ids);
        assert_eq!(books[0].rating.get(), 100);
    }

    #[test]
    fn non_object_elements_are_skipped() {
        let ids = CountingIds::new();
        let report =
            migrate_records_with_report(&json!([1, "two", [3], { "id": "ok", "title": "t" }]), 5, &ids);
        assert_eq!(report.books.len(), 1);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.upgraded, 1);
    }

    #[test]
    fn migration_is_idempotent() {
        let ids = CountingIds::new();
        let input = json!([
            { "id": "a", "title": "Flat", "protagonist": "P", "content": "note", "updatedAt": 4 },
            { "id": "b", "title": "Bare" },
            {
                "id": "c", "title": "Current", "protagonists": [], "rating": 10, "tags": ["x"],
                "entries": [], "createdAt": 1, "updatedAt": 1
            },
        ]);

        let once = migrate_records(&input, 50, &ids);
        let serialized = serde_json::to_value(&once).expect("serialize");
        let twice = migrate_records(&serialized, 60, &ids);
        assert_eq!(once, twice);
    }

    #[test]
    fn canonical_records_parse_as_current() {
        let value = json!({
            "id": "c", "title": "Current", "protagonists": [], "rating": 10, "tags": [],
            "entries": [], "createdAt": 1, "updatedAt": 1
        });
        let record = StoredRecord::deserialize(&value).expect("record");
        assert!(!record.is_legacy());

        let legacy = StoredRecord::deserialize(&json!({ "id": "l", "protagonist": "P" }))
            .expect("record");
        assert!(legacy.is_legacy());
    }
}
