use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};

use crate::{count_words, DomainError};

pub const MAX_RATING: u8 = 100;

/// Source of unique, non-empty identifiers for books and entries.
pub trait IdSource {
    fn next_id(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.is_empty() {
            return Err(DomainError::EmptyIdentifier("book"));
        }
        Ok(Self(value))
    }

    /// Draws a fresh identifier from `ids`.
    pub fn fresh(ids: &dyn IdSource) -> Self {
        let value = ids.next_id();
        debug_assert!(!value.is_empty(), "id source returned an empty identifier");
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BookId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BookId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawIdentifier::deserialize(deserializer)?.into_string();
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.is_empty() {
            return Err(DomainError::EmptyIdentifier("entry"));
        }
        Ok(Self(value))
    }

    pub fn fresh(ids: &dyn IdSource) -> Self {
        let value = ids.next_id();
        debug_assert!(!value.is_empty(), "id source returned an empty identifier");
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawIdentifier::deserialize(deserializer)?.into_string();
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Older backups stored numeric identifiers; both forms are read as text.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum RawIdentifier {
    Text(String),
    Integer(i64),
}

impl RawIdentifier {
    pub(crate) fn into_string(self) -> String {
        match self {
            Self::Text(value) => value,
            Self::Integer(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if !(0..=i64::from(MAX_RATING)).contains(&value) {
            return Err(DomainError::RatingOutOfRange(value));
        }
        Ok(Self(value as u8))
    }

    /// Clamps into `0..=100`; used when upgrading records written by older builds.
    pub fn saturating(value: f64) -> Self {
        if !value.is_finite() || value <= 0.0 {
            return Self(0);
        }
        Self(value.round().min(f64::from(MAX_RATING)) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i64::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryDraft {
    pub content: String,
    pub images: Vec<String>,
}

impl EntryDraft {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            images: Vec::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty() && self.images.is_empty()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.is_blank() {
            return Err(DomainError::EmptyEntry);
        }
        Ok(())
    }
}

impl Entry {
    pub fn from_draft(id: EntryId, draft: EntryDraft, now: i64) -> Result<Self, DomainError> {
        draft.validate()?;
        Ok(Self {
            id,
            content: draft.content,
            images: draft.images,
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub protagonists: Vec<String>,
    pub rating: Rating,
    pub tags: Vec<String>,
    pub entries: Vec<Entry>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields collected by the editor for a book that has not been saved yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookDraft {
    pub title: String,
    pub protagonists: Vec<String>,
    pub rating: Rating,
    pub tags: Vec<String>,
}

/// Edited fields merged over an existing book; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub protagonists: Option<Vec<String>>,
    pub rating: Option<Rating>,
    pub tags: Option<Vec<String>>,
}

impl Book {
    pub fn create(id: BookId, draft: BookDraft, now: i64) -> Result<Self, DomainError> {
        let title = validate_title(&draft.title)?;
        Ok(Self {
            id,
            title,
            protagonists: dedup_names(draft.protagonists),
            rating: draft.rating,
            tags: dedup_names(draft.tags),
            entries: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_patch(&mut self, patch: BookPatch) -> Result<(), DomainError> {
        if let Some(title) = patch.title {
            self.title = validate_title(&title)?;
        }
        if let Some(protagonists) = patch.protagonists {
            self.protagonists = dedup_names(protagonists);
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(tags) = patch.tags {
            self.tags = dedup_names(tags);
        }
        Ok(())
    }

    pub fn touch(&mut self, now: i64) {
        self.updated_at = now.max(self.created_at).max(self.updated_at);
    }

    pub fn add_protagonist(&mut self, name: &str) -> bool {
        push_unique(&mut self.protagonists, name)
    }

    pub fn add_tag(&mut self, tag: &str) -> bool {
        push_unique(&mut self.tags, tag)
    }

    pub fn prepend_entry(&mut self, entry: Entry) {
        self.entries.insert(0, entry);
    }

    pub fn remove_entry(&mut self, entry_id: &EntryId) -> Option<Entry> {
        let index = self.entries.iter().position(|entry| &entry.id == entry_id)?;
        Some(self.entries.remove(index))
    }

    pub fn sorted_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn word_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| count_words(&entry.content))
            .sum()
    }

    /// Key used for case-insensitive title comparisons.
    pub fn title_key(&self) -> String {
        self.title.trim().to_lowercase()
    }

    pub fn has_title(&self, title: &str) -> bool {
        self.title_key() == title.trim().to_lowercase()
    }
}

fn validate_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::EmptyTitle);
    }
    Ok(title.to_string())
}

fn push_unique(list: &mut Vec<String>, value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || list.iter().any(|existing| existing == value) {
        return false;
    }
    list.push(value.to_string());
    true
}

fn dedup_names(values: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        push_unique(&mut out, &value);
    }
    out
}
