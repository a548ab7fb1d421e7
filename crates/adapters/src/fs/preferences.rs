use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use novellog_application::{ApplicationError, PreferenceStore};
use serde_json::{Map, Value};

/// Preferences kept as a flat JSON object, separate from the book store.
#[derive(Debug, Clone)]
pub struct JsonPreferenceStore {
    path: PathBuf,
}

impl JsonPreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<Map<String, Value>, ApplicationError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(error) => return Err(ApplicationError::Io(error.to_string())),
        };
        serde_json::from_str(&raw).map_err(|error| {
            ApplicationError::Parse(format!("{}: {error}", self.path.display()))
        })
    }

    fn write_all(&self, values: &Map<String, Value>) -> Result<(), ApplicationError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|error| ApplicationError::Io(error.to_string()))?;
            }
        }
        let json = serde_json::to_string_pretty(values)
            .map_err(|error| ApplicationError::Persistence(error.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|error| ApplicationError::Io(error.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|error| ApplicationError::Io(error.to_string()))
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApplicationError> {
        Ok(self
            .read_all()?
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ApplicationError> {
        // A corrupt file is replaced rather than blocking every later write.
        let mut values = self.read_all().unwrap_or_default();
        values.insert(key.to_string(), Value::String(value.to_string()));
        self.write_all(&values)
    }
}
