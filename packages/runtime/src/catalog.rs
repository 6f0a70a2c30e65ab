//! Localization catalogs.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde_json::Value;

/// Resolves dotted keys (e.g. `app.users.create_user.empty_name`) to
/// localized strings.
pub trait Catalog: Send + Sync {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// In-memory catalog keyed by dotted path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapCatalog {
    entries: HashMap<String, String>,
}

impl MapCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Flattens nested JSON objects into dotted keys.
    ///
    /// `{"app": {"create_user": {"empty_name": "Name is required"}}}` yields
    /// the key `app.create_user.empty_name`. Strings are stored verbatim,
    /// other scalars in their JSON form; arrays and nulls are skipped.
    #[must_use]
    pub fn from_json_value(value: &Value) -> Self {
        let mut catalog = Self::new();
        flatten(value, &mut String::new(), &mut catalog.entries);
        catalog
    }

    /// # Errors
    ///
    /// Returns the parse error if `text` is not JSON.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_json_value(&value))
    }

    /// Reads and flattens a JSON catalog file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog from {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("parsing catalog from {}", path.display()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Catalog for MapCatalog {
    fn lookup(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

fn flatten(value: &Value, prefix: &mut String, out: &mut HashMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let len = prefix.len();
                if !prefix.is_empty() {
                    prefix.push('.');
                }
                prefix.push_str(key);
                flatten(child, prefix, out);
                prefix.truncate(len);
            }
        }
        Value::String(s) if !prefix.is_empty() => {
            out.insert(prefix.clone(), s.clone());
        }
        Value::Bool(_) | Value::Number(_) if !prefix.is_empty() => {
            out.insert(prefix.clone(), value.to_string());
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn flattens_nested_objects() {
        let catalog = MapCatalog::from_json_str(
            r#"{"app": {"create_user": {"empty_name": "Name is required", "max": 3}}, "list": ["x"]}"#,
        )
        .unwrap();

        assert_eq!(
            catalog.lookup("app.create_user.empty_name").as_deref(),
            Some("Name is required")
        );
        assert_eq!(catalog.lookup("app.create_user.max").as_deref(), Some("3"));
        assert_eq!(catalog.lookup("list"), None);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn insert_chains() {
        let mut catalog = MapCatalog::new();
        catalog.insert("a.b", "1").insert("a.c", "2");
        assert_eq!(catalog.lookup("a.c").as_deref(), Some("2"));
        assert!(!catalog.is_empty());
    }

    #[test]
    fn top_level_scalar_is_ignored() {
        let catalog = MapCatalog::from_json_str(r#""just a string""#).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"ops": {{"x": "Ex"}}}}"#).unwrap();
        let catalog = MapCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.lookup("ops.x").as_deref(), Some("Ex"));
    }

    #[test]
    fn invalid_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = MapCatalog::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing catalog"));
    }
}
