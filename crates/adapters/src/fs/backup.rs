use std::fs;
use std::path::{Path, PathBuf};

use novellog_application::{ApplicationError, ExportBundle};

/// Writes the export into `dir` under the bundle's file name.
pub fn write_backup(dir: &Path, bundle: &ExportBundle) -> Result<PathBuf, ApplicationError> {
    fs::create_dir_all(dir).map_err(|error| ApplicationError::Io(error.to_string()))?;
    let path = dir.join(&bundle.file_name);
    fs::write(&path, &bundle.json).map_err(|error| {
        ApplicationError::Io(format!("failed to write {}: {error}", path.display()))
    })?;
    Ok(path)
}

pub fn read_import_file(path: &Path) -> Result<String, ApplicationError> {
    fs::read_to_string(path).map_err(|error| {
        ApplicationError::Io(format!("failed to read {}: {error}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn backup_is_written_under_its_file_name() {
        let dir = TempDir::new().expect("tempdir");
        let bundle = ExportBundle {
            file_name: "novellog_backup_2026-10-16.json".to_string(),
            json: "[]".to_string(),
            books: 0,
        };
        let path = write_backup(&dir.path().join("out"), &bundle).expect("write");
        assert!(path.ends_with("novellog_backup_2026-10-16.json"));
        assert_eq!(read_import_file(&path).expect("read"), "[]");
    }

    #[test]
    fn missing_import_file_is_an_io_error() {
        let dir = TempDir::new().expect("tempdir");
        let result = read_import_file(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ApplicationError::Io(_))));
    }
}
