use chrono::{TimeZone, Utc};
use novellog_application::{ImportConflict, ImportSummary, Preferences};
use novellog_domain::{count_words, Book};

use crate::fs::describe_data_uri;

pub fn present_book_row(book: &Book) -> String {
    format!(
        "{}\t{:>3}\t{}\t{}\t{}",
        book.id,
        book.rating.get(),
        format_timestamp(book.updated_at),
        book.title,
        book.sorted_tags().join(",")
    )
}

pub fn present_book_detail(book: &Book) -> String {
    let mut lines = vec![
        format!("{} ({})", book.title, book.id),
        format!("rating: {}/100", book.rating.get()),
    ];
    if !book.protagonists.is_empty() {
        lines.push(format!("protagonists: {}", book.protagonists.join(", ")));
    }
    if !book.tags.is_empty() {
        lines.push(format!("tags: {}", book.sorted_tags().join(", ")));
    }
    lines.push(format!(
        "created {} / updated {}",
        format_timestamp(book.created_at),
        format_timestamp(book.updated_at)
    ));
    lines.push(format!(
        "{} entries, {} words",
        book.entries.len(),
        book.word_count()
    ));

    for entry in &book.entries {
        lines.push(String::new());
        lines.push(format!(
            "[{}] {} ({} words)",
            entry.id,
            format_timestamp(entry.created_at),
            count_words(&entry.content)
        ));
        if !entry.content.is_empty() {
            lines.push(entry.content.clone());
        }
        for (index, image) in entry.images.iter().enumerate() {
            let described = describe_data_uri(image)
                .map(|info| format!("{}, {} bytes", info.mime, info.byte_len))
                .unwrap_or_else(|| "unrecognized image".to_string());
            lines.push(format!("  image {}: {described}", index + 1));
        }
    }

    lines.join("\n")
}

pub fn present_conflict(conflict: &ImportConflict, position: (usize, usize)) -> String {
    format!(
        "conflict {}/{}: \"{}\" already exists\n  existing: {} entries, rating {}, updated {}\n  incoming: {} entries, rating {}, updated {}",
        position.0 + 1,
        position.1,
        conflict.existing.title,
        conflict.existing.entries.len(),
        conflict.existing.rating.get(),
        format_timestamp(conflict.existing.updated_at),
        conflict.incoming.entries.len(),
        conflict.incoming.rating.get(),
        format_timestamp(conflict.incoming.updated_at),
    )
}

pub fn present_import_summary(summary: &ImportSummary) -> String {
    format!(
        "import finished: imported={}, overwritten={}, skipped={}, dropped={}",
        summary.imported, summary.overwritten, summary.skipped, summary.dropped
    )
}

pub fn present_preferences(preferences: &Preferences) -> String {
    format!(
        "theme={} language={}",
        preferences.theme, preferences.language
    )
}

pub fn format_timestamp(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}
