use std::collections::BTreeSet;
use std::str::FromStr;

use crate::{Book, DomainError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    UpdatedAt,
    CreatedAt,
    Rating,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UpdatedAt => "updated",
            Self::CreatedAt => "created",
            Self::Rating => "rating",
        }
    }
}

impl FromStr for SortField {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "updated" | "updatedat" | "updated_at" => Ok(Self::UpdatedAt),
            "created" | "createdat" | "created_at" => Ok(Self::CreatedAt),
            "rating" => Ok(Self::Rating),
            other => Err(DomainError::UnknownSortField(other.to_string())),
        }
    }
}

/// Computes the displayed subset of `records` and its order.
///
/// A record must carry every tag in `active_tags`. A non-blank `query` must
/// appear, ignoring case, in the title, a protagonist, a tag or an entry.
/// Sorting is descending and stable.
pub fn view<'a>(
    records: &'a [Book],
    query: &str,
    active_tags: &BTreeSet<String>,
    sort: SortField,
) -> Vec<&'a Book> {
    let needle = query.trim().to_lowercase();

    let mut selected: Vec<&Book> = records
        .iter()
        .filter(|book| has_all_tags(book, active_tags))
        .filter(|book| needle.is_empty() || matches_text(book, &needle))
        .collect();

    match sort {
        SortField::UpdatedAt => selected.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        SortField::CreatedAt => selected.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortField::Rating => selected.sort_by(|a, b| b.rating.cmp(&a.rating)),
    }

    selected
}

fn has_all_tags(book: &Book, active_tags: &BTreeSet<String>) -> bool {
    active_tags
        .iter()
        .all(|tag| book.tags.iter().any(|own| own == tag))
}

fn matches_text(book: &Book, needle: &str) -> bool {
    let hit = |field: &str| field.to_lowercase().contains(needle);
    hit(&book.title)
        || book.protagonists.iter().any(|name| hit(name))
        || book.tags.iter().any(|tag| hit(tag))
        || book.entries.iter().any(|entry| hit(&entry.content))
}

/// Every tag used in `records`, sorted and without duplicates.
pub fn all_tags(records: &[Book]) -> Vec<String> {
    records
        .iter()
        .flat_map(|book| book.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BookId, Entry, EntryId, Rating};

    fn book(id: &str, title: &str, rating: i64, created: i64, updated: i64, tags: &[&str]) -> Book {
        Book {
            id: BookId::new(id).expect("id"),
            title: title.to_string(),
            protagonists: Vec::new(),
            rating: Rating::new(rating).expect("rating"),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            entries: Vec::new(),
            created_at: created,
            updated_at: updated,
        }
    }

    fn ids(books: &[&Book]) -> Vec<String> {
        books.iter().map(|book| book.id.to_string()).collect()
    }

    fn sample() -> Vec<Book> {
        let mut with_note = book("c", "Gamma", 70, 3, 3, &["romance"]);
        with_note.protagonists.push("Elaine".to_string());
        with_note.entries.push(Entry {
            id: EntryId::new("e1").expect("id"),
            content: "The DRAGON finally shows up".to_string(),
            images: Vec::new(),
            created_at: 3,
        });
        vec![
            book("a", "Alpha", 50, 1, 30, &["fantasy", "isekai"]),
            book("b", "Beta", 90, 2, 10, &["fantasy"]),
            with_note,
        ]
    }

    #[test]
    fn empty_query_returns_everything_sorted_by_updated() {
        let records = sample();
        let result = view(&records, "  ", &BTreeSet::new(), SortField::default());
        assert_eq!(ids(&result), vec!["a", "b", "c"]);
    }

    #[test]
    fn sort_by_created_and_rating() {
        let records = sample();
        let none = BTreeSet::new();
        assert_eq!(
            ids(&view(&records, "", &none, SortField::CreatedAt)),
            vec!["c", "b", "a"]
        );
        assert_eq!(
            ids(&view(&records, "", &none, SortField::Rating)),
            vec!["b", "c", "a"]
        );
    }

    #[test]
    fn tags_combine_with_and() {
        let records = sample();
        let tags: BTreeSet<String> = ["fantasy".to_string(), "isekai".to_string()].into();
        assert_eq!(
            ids(&view(&records, "", &tags, SortField::UpdatedAt)),
            vec!["a"]
        );
        let one: BTreeSet<String> = ["fantasy".to_string()].into();
        assert_eq!(
            ids(&view(&records, "", &one, SortField::UpdatedAt)),
            vec!["a", "b"]
        );
    }

    #[test]
    fn text_matches_every_searchable_field() {
        let records = sample();
        let none = BTreeSet::new();
        assert_eq!(ids(&view(&records, "beta", &none, SortField::UpdatedAt)), vec!["b"]);
        assert_eq!(ids(&view(&records, "elaine", &none, SortField::UpdatedAt)), vec!["c"]);
        assert_eq!(ids(&view(&records, "ISEKAI", &none, SortField::UpdatedAt)), vec!["a"]);
        assert_eq!(ids(&view(&records, "dragon", &none, SortField::UpdatedAt)), vec!["c"]);
        assert!(view(&records, "nothing", &none, SortField::UpdatedAt).is_empty());
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let records = vec![
            book("x", "X", 10, 1, 5, &[]),
            book("y", "Y", 10, 1, 5, &[]),
            book("z", "Z", 10, 1, 5, &[]),
        ];
        let none = BTreeSet::new();
        for sort in [SortField::UpdatedAt, SortField::CreatedAt, SortField::Rating] {
            assert_eq!(ids(&view(&records, "", &none, sort)), vec!["x", "y", "z"]);
        }
    }

    #[test]
    fn view_does_not_touch_input() {
        let records = sample();
        let before = records.clone();
        let _ = view(&records, "a", &BTreeSet::new(), SortField::Rating);
        assert_eq!(records, before);
    }

    #[test]
    fn sort_field_parses_names() {
        assert_eq!("rating".parse::<SortField>(), Ok(SortField::Rating));
        assert_eq!("Created".parse::<SortField>(), Ok(SortField::CreatedAt));
        assert!(matches!(
            "title".parse::<SortField>(),
            Err(DomainError::UnknownSortField(_))
        ));
    }

    #[test]
    fn all_tags_is_sorted_union() {
        assert_eq!(all_tags(&sample()), vec!["fantasy", "isekai", "romance"]);
    }
}
