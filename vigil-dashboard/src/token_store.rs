//! Local key-value storage for the bearer token
//!
//! A small JSON object on disk. Only the `token` key is read by the
//! dashboard; other keys are preserved untouched on write.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Fixed key holding the bearer token
pub const TOKEN_KEY: &str = "token";

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/vigil/storage.json`
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join("vigil").join("storage.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored token; a missing file or key is `None`, not an error
    pub fn load(&self) -> Result<Option<String>> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string))
    }

    pub fn save(&self, token: &str) -> Result<()> {
        let mut entries = self.read_entries()?;
        entries.insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));
        self.write_entries(&entries)
    }

    pub fn clear(&self) -> Result<()> {
        let mut entries = self.read_entries()?;
        if entries.remove(TOKEN_KEY).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }

    fn read_entries(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(entries) => Ok(entries),
            _ => Err(Error::Storage(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_has_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("storage.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("storage.json"));

        store.save("abc123").unwrap();
        assert_eq!(store.load().unwrap(), Some("abc123".to_string()));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_other_keys_survive_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

        let store = TokenStore::new(&path);
        store.save("abc").unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["token"], "abc");
    }

    #[test]
    fn test_blank_token_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, r#"{"token": "  "}"#).unwrap();

        assert_eq!(TokenStore::new(&path).load().unwrap(), None);
    }

    #[test]
    fn test_non_object_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        assert!(matches!(TokenStore::new(&path).load(), Err(Error::Storage(_))));
    }
}
