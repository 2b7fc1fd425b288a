//! Manifest of dataset elements and the on-disk layout
//!
//! ## Layout
//!
//! ```text
//! <dataset_dir>/
//! ├── .dofinfo/
//! │   ├── elementslist.json   # [[label], [label, element_info], ...]
//! │   └── dataset.json        # DatasetInfo
//! ├── 0.out                   # encoded payload of element 0
//! ├── 1.out
//! └── ...
//! ```
//!
//! The packed archive carries the same names as members.

use crate::error::{DofError, Result};
use crate::metadata::{DatasetInfo, ElementInfo};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Metadata subfolder of a dataset directory
pub const INFO_DIR: &str = ".dofinfo";

/// Element list file inside [`INFO_DIR`]
pub const ELEMENTS_FILE: &str = "elementslist.json";

/// Dataset info file inside [`INFO_DIR`]
pub const DATASET_FILE: &str = "dataset.json";

/// Archive member name of the element list
pub const ELEMENTS_MEMBER: &str = ".dofinfo/elementslist.json";

/// Archive member name of the dataset info
pub const DATASET_MEMBER: &str = ".dofinfo/dataset.json";

/// Payload file name for a backing file id
pub fn payload_file_name(id: u64) -> String {
    format!("{}.out", id)
}

pub fn elements_path(dataset_dir: &Path) -> PathBuf {
    dataset_dir.join(INFO_DIR).join(ELEMENTS_FILE)
}

pub fn dataset_info_path(dataset_dir: &Path) -> PathBuf {
    dataset_dir.join(INFO_DIR).join(DATASET_FILE)
}

/// Where an entry's payload file lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// `<dataset_dir>/<id>.out`; the id does not change when earlier entries are deleted
    Backing(u64),
    /// External payload file recorded at append time
    Link(PathBuf),
}

/// One manifest entry
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<Y> {
    pub label: Y,
    pub info: Option<ElementInfo>,
    pub source: Source,
}

impl<Y> Entry<Y> {
    /// Path of the payload file backing this entry
    pub fn resolve(&self, dataset_dir: &Path) -> PathBuf {
        match &self.source {
            Source::Backing(id) => dataset_dir.join(payload_file_name(*id)),
            Source::Link(path) => path.clone(),
        }
    }
}

/// Parse a stored element list
///
/// Each entry is `[label]`, `[label, info]` or `[label, info, link]`; entries
/// without a link are backed by the file named after their position.
pub fn parse_entries<Y: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<Entry<Y>>> {
    let raw: Vec<Vec<Value>> = serde_json::from_slice(bytes)?;
    let mut entries = Vec::with_capacity(raw.len());

    for (position, fields) in raw.into_iter().enumerate() {
        if fields.is_empty() || fields.len() > 3 {
            return Err(DofError::Format(format!(
                "element #{} has {} fields, expected 1 to 3",
                position,
                fields.len()
            )));
        }
        let mut fields = fields.into_iter();

        let label: Y = serde_json::from_value(fields.next().unwrap_or(Value::Null))?;
        let info = match fields.next() {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(ElementInfo::from_stored(map)),
            Some(other) => {
                return Err(DofError::Format(format!(
                    "element #{} has non-object info: {}",
                    position, other
                )))
            }
        };
        let source = match fields.next() {
            None | Some(Value::Null) => Source::Backing(position as u64),
            Some(Value::String(link)) => Source::Link(PathBuf::from(link)),
            Some(other) => {
                return Err(DofError::Format(format!(
                    "element #{} has a non-string link: {}",
                    position, other
                )))
            }
        };

        entries.push(Entry { label, info, source });
    }

    Ok(entries)
}

/// Render the element list for a packed archive
///
/// Links are not persisted: inside the archive every element is stored under
/// its position.
pub fn render_packed<Y: Serialize>(entries: &[Entry<Y>]) -> Result<Vec<u8>> {
    let mut raw = Vec::with_capacity(entries.len());
    for entry in entries {
        let mut fields = vec![serde_json::to_value(&entry.label)?];
        if let Some(info) = &entry.info {
            fields.push(serde_json::to_value(info)?);
        }
        raw.push(Value::Array(fields));
    }
    Ok(serde_json::to_vec_pretty(&raw)?)
}

/// Parse stored dataset info without re-validating it
pub fn parse_dataset_info(bytes: &[u8]) -> Result<DatasetInfo> {
    let fields: Map<String, Value> = serde_json::from_slice(bytes)?;
    Ok(DatasetInfo::from_stored(fields))
}

pub fn render_dataset_info(info: &DatasetInfo) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(info)?)
}

/// Load both metadata files from an exploded dataset directory
pub fn load_exploded<Y: DeserializeOwned>(
    dataset_dir: &Path,
) -> Result<(Vec<Entry<Y>>, DatasetInfo)> {
    let elements = elements_path(dataset_dir);
    if !elements.is_file() {
        return Err(DofError::NotFound(elements));
    }
    let dataset = dataset_info_path(dataset_dir);
    if !dataset.is_file() {
        return Err(DofError::NotFound(dataset));
    }

    let entries = parse_entries(&std::fs::read(&elements)?)?;
    let info = parse_dataset_info(&std::fs::read(&dataset)?)?;
    Ok((entries, info))
}
