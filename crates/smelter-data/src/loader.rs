//! File-level plumbing: format detection, file discovery, deserialization
//! and name resolution shared by the level pipeline.

use serde::de::DeserializeOwned;
use smelter_core::error::SimError;
use smelter_core::fixed::{Seconds, checked_seconds};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading a level.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A field parsed but holds a value the simulation cannot use.
    #[error("invalid {field} for '{name}' in {file}: {detail}")]
    InvalidValue {
        file: PathBuf,
        name: String,
        field: &'static str,
        detail: String,
    },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The world refused the level's contents (e.g. more stock than space).
    #[error("cannot populate level from {file}: {source}")]
    Populate {
        file: PathBuf,
        #[source]
        source: SimError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    const ALL: [(Format, &'static str); 3] = [
        (Format::Ron, "ron"),
        (Format::Toml, "toml"),
        (Format::Json, "json"),
    ];
}

/// Detect the format of a file from its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let extension = path.extension().and_then(|e| e.to_str());
    Format::ALL
        .iter()
        .find(|(_, ext)| Some(*ext) == extension)
        .map(|(format, _)| *format)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Find `{base_name}.ron`, `.toml` or `.json` in `dir`.
///
/// `Ok(None)` when none exists; `ConflictingFormats` when more than one does.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;
    for (_, ext) in Format::ALL {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if !candidate.exists() {
            continue;
        }
        if let Some(existing) = found {
            return Err(DataLoadError::ConflictingFormats {
                a: existing,
                b: candidate,
            });
        }
        found = Some(candidate);
    }
    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list. RON and JSON files hold the list at top level; TOML
/// files hold it under `toml_key` (`[[recipes]]` tables and the like).
pub fn deserialize_list<T: DeserializeOwned>(path: &Path, toml_key: &str) -> Result<Vec<T>, DataLoadError> {
    if detect_format(path)? != Format::Toml {
        return deserialize_file(path);
    }
    let content = std::fs::read_to_string(path)?;
    let mut table: toml::Table = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
    let array = table
        .remove(toml_key)
        .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?;
    array
        .try_into()
        .map_err(|e: toml::de::Error| parse_error(path, e))
}

// ===========================================================================
// Values and names
// ===========================================================================

/// Convert a duration from a data file into simulation seconds. Negative,
/// non-finite and out-of-range values are rejected.
pub fn duration_from(
    value: f64,
    file: &Path,
    name: &str,
    field: &'static str,
) -> Result<Seconds, DataLoadError> {
    checked_seconds(value).ok_or_else(|| DataLoadError::InvalidValue {
        file: file.to_path_buf(),
        name: name.to_string(),
        field,
        detail: format!(
            "expected a non-negative number of seconds up to {}, got {value}",
            Seconds::MAX
        ),
    })
}

/// Look up a name, returning an `UnresolvedRef` error if not found.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Fail with `DuplicateName` if `name` is already taken.
pub fn check_duplicate<V>(map: &HashMap<String, V>, name: &str, file: &Path) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        return Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        });
    }
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
