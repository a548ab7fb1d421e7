mod backup;
mod clock;
mod images;
mod preferences;

pub use backup::{read_import_file, write_backup};
pub use clock::SystemClock;
pub use images::{describe_data_uri, encode_image_file, DataUriInfo};
pub use preferences::JsonPreferenceStore;
