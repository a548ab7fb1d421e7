pub mod fs;
pub mod ids;
pub mod migrations;
pub mod presenters;
pub mod sqlite;

pub use fs::{
    describe_data_uri, encode_image_file, read_import_file, write_backup, DataUriInfo,
    JsonPreferenceStore, SystemClock,
};
pub use ids::UuidIdSource;
pub use presenters::{
    format_timestamp, present_book_detail, present_book_row, present_conflict,
    present_import_summary, present_preferences,
};
pub use sqlite::SqliteBookRepository;
