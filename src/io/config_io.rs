use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::io::storage::validate_slot;
use crate::model::config::DeckConfig;
use crate::model::task::Priority;
use crate::model::view::{SortKey, StatusFilter};

pub const CONFIG_FILE: &str = "config.toml";

/// Keys accepted by `td config`
pub const CONFIG_KEYS: &[&str] = &["storage.slot", "view.sort", "view.status", "defaults.priority"];

/// Error type for config I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not parse config.toml: {0}")]
    DocumentError(#[from] toml_edit::TomlError),
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
    #[error("unknown config key '{0}' (expected one of: {keys})", keys = CONFIG_KEYS.join(", "))]
    UnknownKey(String),
}

/// Read config.toml from the data directory, returning both the parsed
/// config and the raw toml_edit document for format-preserving edits.
/// A missing file yields the defaults and an empty document.
pub fn read_config(data_dir: &Path) -> Result<(DeckConfig, toml_edit::DocumentMut), ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(ConfigError::ReadError { path, source: e }),
    };
    let config: DeckConfig = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(data_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    fs::create_dir_all(data_dir).map_err(|e| ConfigError::WriteError {
        path: data_dir.to_path_buf(),
        source: e,
    })?;
    fs::write(&path, doc.to_string()).map_err(|e| ConfigError::WriteError { path, source: e })
}

/// Set a dotted key (`view.sort`) in the document.
///
/// Enum values are canonicalized (`high` is written as `"High"`), and the
/// edited document is re-parsed before it replaces `doc`.
pub fn set_value(doc: &mut toml_edit::DocumentMut, key: &str, value: &str) -> Result<(), ConfigError> {
    let (table, field) = split_key(key)?;
    let value = canonical_value(key, value)?;
    let mut edited = doc.clone();
    if !edited.contains_key(table) {
        edited[table] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    edited[table][field] = toml_edit::value(value);
    toml::from_str::<DeckConfig>(&edited.to_string())?;
    *doc = edited;
    Ok(())
}

/// Current value of a dotted key, rendered as a string.
pub fn get_value(config: &DeckConfig, key: &str) -> Result<String, ConfigError> {
    split_key(key)?;
    let value = match key {
        "storage.slot" => config.storage.slot.clone(),
        "view.sort" => config.view.sort.to_string(),
        "view.status" => config.view.status.to_string(),
        "defaults.priority" => config.defaults.priority.to_string(),
        _ => return Err(ConfigError::UnknownKey(key.to_string())),
    };
    Ok(value)
}

fn canonical_value(key: &str, value: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        key: key.to_string(),
        reason,
    };
    match key {
        "storage.slot" => validate_slot(value)
            .map(|()| value.to_string())
            .map_err(|e| invalid(e.to_string())),
        "view.sort" => value
            .parse::<SortKey>()
            .map(|v| v.to_string())
            .map_err(|e| invalid(e.to_string())),
        "view.status" => value
            .parse::<StatusFilter>()
            .map(|v| v.to_string())
            .map_err(|e| invalid(e.to_string())),
        "defaults.priority" => value
            .parse::<Priority>()
            .map(|v| v.to_string())
            .map_err(invalid),
        _ => Ok(value.to_string()),
    }
}

fn split_key(key: &str) -> Result<(&str, &str), ConfigError> {
    if !CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey(key.to_string()));
    }
    key.split_once('.')
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"# deck settings
[view]
sort = "priority"   # highest first

[defaults]
priority = "Medium"
"#;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let (config, doc) = read_config(tmp.path()).unwrap();
        assert_eq!(config.storage.slot, "tasks");
        assert!(doc.is_empty());
    }

    #[test]
    fn round_trip_preserves_formatting() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), SAMPLE).unwrap();
        let (config, doc) = read_config(tmp.path()).unwrap();
        assert_eq!(config.view.sort, SortKey::Priority);
        assert_eq!(config.defaults.priority, Priority::Medium);

        write_config(tmp.path(), &doc).unwrap();
        let written = fs::read_to_string(tmp.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(written, SAMPLE);
    }

    #[test]
    fn set_value_keeps_comments() {
        let mut doc: toml_edit::DocumentMut = SAMPLE.parse().unwrap();
        set_value(&mut doc, "view.status", "overdue").unwrap();
        let text = doc.to_string();
        assert!(text.contains("# deck settings"));
        assert!(text.contains("status = \"overdue\""));
        let config: DeckConfig = toml::from_str(&text).unwrap();
        assert_eq!(config.view.sort, SortKey::Priority);
    }

    #[test]
    fn set_value_canonicalizes_enums() {
        let mut doc = toml_edit::DocumentMut::new();
        set_value(&mut doc, "defaults.priority", "high").unwrap();
        set_value(&mut doc, "view.sort", "due").unwrap();
        let text = doc.to_string();
        assert!(text.contains("priority = \"High\""));
        assert!(text.contains("sort = \"dueDate\""));
    }

    #[test]
    fn set_value_creates_missing_table() {
        let mut doc = toml_edit::DocumentMut::new();
        set_value(&mut doc, "storage.slot", "work").unwrap();
        let config: DeckConfig = toml::from_str(&doc.to_string()).unwrap();
        assert_eq!(config.storage.slot, "work");
    }

    #[test]
    fn set_value_rejects_bad_values_and_keys() {
        let mut doc: toml_edit::DocumentMut = SAMPLE.parse().unwrap();
        assert!(matches!(
            set_value(&mut doc, "view.sort", "title"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(doc.to_string().contains("sort = \"priority\""));
        assert!(matches!(
            set_value(&mut doc, "view.colour", "red"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_value_rejects_unusable_slot_names() {
        let mut doc = toml_edit::DocumentMut::new();
        for bad in ["../x", "", "a b", "tasks.json"] {
            assert!(
                matches!(
                    set_value(&mut doc, "storage.slot", bad),
                    Err(ConfigError::InvalidValue { .. })
                ),
                "accepted slot {:?}",
                bad
            );
        }
        assert!(doc.is_empty());
        set_value(&mut doc, "storage.slot", "work_2025-q1").unwrap();
    }

    #[test]
    fn get_value_renders_current() {
        let config: DeckConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(get_value(&config, "view.sort").unwrap(), "priority");
        assert_eq!(get_value(&config, "defaults.priority").unwrap(), "Medium");
        assert!(get_value(&config, "nope").is_err());
    }
}
