//! Dataset container
//!
//! [`Dataset`] manages a manifest of elements backed by a directory of
//! payload files (the exploded form) and packs it into, or unpacks it from,
//! a single archive (the packed form).
//!
//! ## Write mode
//!
//! Every embedded payload is encoded to `<dataset_dir>/<id>.out` as soon as
//! it is appended. [`Dataset::save`] packs the directory and the manifest
//! into the target archive once dataset info is set.
//!
//! ## Read mode
//!
//! The manifest is loaded either straight from an exploded directory or from
//! an archive, whose members are extracted into the dataset directory first.
//! Opening fails unless every manifest entry resolves to an existing file.

use crate::archive::{self, ArchiveReader, PackMember};
use crate::codec;
use crate::config::{Compression, Config};
use crate::element::{Element, Payload};
use crate::error::{DofError, Result};
use crate::manifest::{self, Entry, Source};
use crate::metadata::{DatasetInfo, ElementInfo};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Access mode of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Read,
    Write,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Read => write!(f, "read"),
            Mode::Write => write!(f, "write"),
        }
    }
}

/// First free sibling of `path`
///
/// Returns `path` itself when nothing exists there, otherwise the first of
/// `<stem>_0.<ext>`, `<stem>_1.<ext>`, ... that does not exist.
pub fn next_free_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    (0u64..)
        .map(|i| {
            let name = match &extension {
                Some(ext) => format!("{}_{}.{}", stem, i, ext),
                None => format!("{}_{}", stem, i),
            };
            path.with_file_name(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// A DoF dataset of `(payload, label)` pairs
///
/// `X` is the payload type, persisted through [`crate::codec`]; `Y` is the
/// label type, persisted as JSON inside the manifest.
pub struct Dataset<X, Y = Value> {
    target: PathBuf,
    dataset_dir: PathBuf,
    mode: Mode,
    use_compressed: bool,
    compression: Compression,
    entries: Vec<Entry<Y>>,
    info: Option<DatasetInfo>,
    /// Next backing file id; never reused within one dataset
    next_file_id: u64,
    _payload: PhantomData<fn() -> X>,
}

impl<X, Y> fmt::Debug for Dataset<X, Y> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("target", &self.target)
            .field("dataset_dir", &self.dataset_dir)
            .field("mode", &self.mode)
            .field("len", &self.entries.len())
            .field("has_info", &self.info.is_some())
            .finish()
    }
}

impl<X, Y> Dataset<X, Y>
where
    Y: Serialize + DeserializeOwned,
{
    /// Open a dataset
    ///
    /// An empty `target` in read mode uses the exploded dataset in
    /// `config.dataset_dir` directly.
    pub fn open<P: AsRef<Path>>(target: P, mode: Mode, config: &Config) -> Result<Self> {
        config.validate()?;
        let target = target.as_ref();

        let mut dataset = Self {
            target: target.to_path_buf(),
            dataset_dir: config.dataset_dir.clone(),
            mode,
            use_compressed: config.use_compressed,
            compression: config.compression,
            entries: Vec::new(),
            info: None,
            next_file_id: 0,
            _payload: PhantomData,
        };

        match mode {
            Mode::Read => dataset.load()?,
            Mode::Write => dataset.prepare_write()?,
        }

        info!(
            target = %dataset.target.display(),
            dataset_dir = %dataset.dataset_dir.display(),
            mode = %mode,
            elements = dataset.entries.len(),
            "Opened dataset"
        );
        Ok(dataset)
    }

    /// Open a packed archive for reading
    pub fn read<P: AsRef<Path>>(target: P, config: &Config) -> Result<Self> {
        Self::open(target, Mode::Read, config)
    }

    /// Open the exploded dataset in `config.dataset_dir` for reading
    pub fn read_exploded(config: &Config) -> Result<Self> {
        Self::open("", Mode::Read, config)
    }

    /// Start a new dataset that will be saved to `target`
    pub fn create<P: AsRef<Path>>(target: P, config: &Config) -> Result<Self> {
        Self::open(target, Mode::Write, config)
    }

    fn load(&mut self) -> Result<()> {
        let (entries, info) = if self.target.as_os_str().is_empty() {
            manifest::load_exploded(&self.dataset_dir)?
        } else if self.target.is_file() {
            let mut reader = ArchiveReader::open(&self.target)?;
            let entries = manifest::parse_entries(&reader.read_member(manifest::ELEMENTS_MEMBER)?)?;
            let info =
                manifest::parse_dataset_info(&reader.read_member(manifest::DATASET_MEMBER)?)?;

            if !self.dataset_dir.is_dir() {
                debug!(dir = %self.dataset_dir.display(), "Creating dataset directory");
            }
            reader.extract_into(&self.dataset_dir)?;
            (entries, info)
        } else {
            return Err(DofError::NotFound(self.target.clone()));
        };

        self.next_file_id = next_file_id(&entries);
        self.entries = entries;
        self.info = Some(info);

        if !self.check()? {
            return Err(DofError::Integrity(format!(
                "dataset in \"{}\" references missing files",
                self.dataset_dir.display()
            )));
        }
        Ok(())
    }

    fn prepare_write(&mut self) -> Result<()> {
        if self.target.as_os_str().is_empty() {
            return Err(DofError::validation("empty target path in write mode"));
        }
        if self.target.exists() {
            return Err(DofError::validation(format!(
                "target \"{}\" already exists (free alternative: \"{}\")",
                self.target.display(),
                next_free_path(&self.target).display()
            )));
        }

        if self.dataset_dir.is_dir() {
            if fs::read_dir(&self.dataset_dir)?.next().is_some() {
                return Err(DofError::validation(format!(
                    "dataset directory \"{}\" is not empty",
                    self.dataset_dir.display()
                )));
            }
        } else {
            fs::create_dir_all(&self.dataset_dir)?;
        }
        Ok(())
    }

    fn require_write(&self, operation: &str) -> Result<()> {
        match self.mode {
            Mode::Write => Ok(()),
            Mode::Read => Err(DofError::state(format!(
                "{} is available in write mode only",
                operation
            ))),
        }
    }

    fn write_backing<T: Serialize>(&mut self, payload: &T) -> Result<u64> {
        let id = self.next_file_id;
        let path = self.dataset_dir.join(manifest::payload_file_name(id));
        codec::write_payload(&path, payload)?;
        self.next_file_id += 1;
        Ok(id)
    }

    /// Append a single element
    ///
    /// Embedded payloads are written to a new backing file immediately; link
    /// elements only record their path.
    pub fn append(&mut self, element: Element<X, Y>) -> Result<()>
    where
        X: Serialize,
    {
        self.require_write("append")?;
        let (payload, label, info) = element.into_parts();

        let source = match payload {
            Payload::Link(path) => Source::Link(path),
            Payload::Embedded(value) => Source::Backing(self.write_backing(&value)?),
        };
        debug!(index = self.entries.len(), source = ?source, "Appended element");
        self.entries.push(Entry { label, info, source });
        Ok(())
    }

    /// Append a batch of payloads with their labels
    ///
    /// Both sides must declare the same length. Batch entries carry no
    /// per-element info. Returns the number of appended elements.
    pub fn append_batch<IX, IY>(&mut self, payloads: IX, labels: IY) -> Result<usize>
    where
        X: Serialize,
        IX: IntoIterator<Item = X>,
        IX::IntoIter: ExactSizeIterator,
        IY: IntoIterator<Item = Y>,
        IY::IntoIter: ExactSizeIterator,
    {
        self.require_write("append")?;
        let payloads = payloads.into_iter();
        let labels = labels.into_iter();

        if payloads.len() != labels.len() {
            return Err(DofError::validation(format!(
                "payloads and labels must have the same length ({} != {})",
                payloads.len(),
                labels.len()
            )));
        }

        let count = payloads.len();
        for (payload, label) in payloads.zip(labels) {
            let id = self.write_backing(&payload)?;
            self.entries.push(Entry {
                label,
                info: None,
                source: Source::Backing(id),
            });
        }
        debug!(count, total = self.entries.len(), "Appended batch");
        Ok(count)
    }

    /// Save the dataset to the target archive
    ///
    /// Requires dataset info and at least one element, and the target must
    /// not exist yet. Every element is stored as `<position>.out`.
    pub fn save(&self, remove_dataset_dir: bool) -> Result<()> {
        self.require_write("save")?;
        let Some(info) = &self.info else {
            return Err(DofError::validation("cannot save without dataset info"));
        };
        if self.entries.is_empty() {
            return Err(DofError::validation("cannot save an empty dataset"));
        }
        if self.target.exists() {
            return Err(DofError::validation(format!(
                "target file \"{}\" already exists",
                self.target.display()
            )));
        }

        let members: Vec<PackMember> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| PackMember {
                name: manifest::payload_file_name(position as u64),
                source: entry.resolve(&self.dataset_dir),
            })
            .collect();
        let elements = manifest::render_packed(&self.entries)?;
        let dataset_info = manifest::render_dataset_info(info)?;

        archive::pack(
            &self.target,
            &[
                (manifest::DATASET_MEMBER, dataset_info.as_slice()),
                (manifest::ELEMENTS_MEMBER, elements.as_slice()),
            ],
            &members,
            self.compression,
        )?;
        info!(
            target = %self.target.display(),
            elements = self.entries.len(),
            "Saved dataset"
        );

        if remove_dataset_dir {
            fs::remove_dir_all(&self.dataset_dir)?;
            info!(dir = %self.dataset_dir.display(), "Removed dataset directory");
        }
        Ok(())
    }
}

impl<X, Y> Dataset<X, Y> {
    /// Whether the exploded dataset is complete
    ///
    /// Only valid in read mode. Returns false if a metadata file or any
    /// element's payload file is missing.
    pub fn check(&self) -> Result<bool> {
        if self.mode != Mode::Read || self.use_compressed {
            return Err(DofError::state(
                "check is available in uncompressed read mode only",
            ));
        }

        if !manifest::elements_path(&self.dataset_dir).is_file()
            || !manifest::dataset_info_path(&self.dataset_dir).is_file()
        {
            warn!(dir = %self.dataset_dir.display(), "Dataset metadata missing");
            return Ok(false);
        }

        for (index, entry) in self.entries.iter().enumerate() {
            let path = entry.resolve(&self.dataset_dir);
            if !path.is_file() {
                warn!(index, path = %path.display(), "Element payload missing");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Remove the element at `index` from the manifest
    ///
    /// Backing files are left in place and later elements keep their
    /// backing file ids.
    pub fn delete(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        let entry = self.entries.remove(index);
        debug!(index, source = ?entry.source, "Deleted element");
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            return Err(DofError::Range {
                index,
                len: self.entries.len(),
            });
        }
        Ok(())
    }

    /// Dataset-level info, if set
    pub fn info(&self) -> Option<&DatasetInfo> {
        self.info.as_ref()
    }

    /// Replace the dataset-level info
    pub fn set_info(&mut self, info: DatasetInfo) {
        self.info = Some(info);
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch mode at runtime (not supported)
    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        Err(DofError::NotImplemented(format!(
            "runtime mode change to {}",
            mode
        )))
    }

    pub fn use_compressed(&self) -> bool {
        self.use_compressed
    }

    /// Switch to compressed use (not supported)
    pub fn set_use_compressed(&mut self, _use_compressed: bool) -> Result<()> {
        Err(DofError::NotImplemented(
            "compressed (temporary extraction) use".to_string(),
        ))
    }

    /// Archive path this dataset reads from or saves to
    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn dataset_dir(&self) -> &Path {
        &self.dataset_dir
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Label of the element at `index` without decoding its payload
    pub fn label(&self, index: usize) -> Result<&Y> {
        self.check_index(index)?;
        Ok(&self.entries[index].label)
    }

    /// Per-element info of the element at `index`
    pub fn element_info(&self, index: usize) -> Result<Option<&ElementInfo>> {
        self.check_index(index)?;
        Ok(self.entries[index].info.as_ref())
    }

    /// Decode the element at `index` into `(payload, label)`
    pub fn get(&self, index: usize) -> Result<(X, Y)>
    where
        X: DeserializeOwned,
        Y: Clone,
    {
        self.check_index(index)?;
        let entry = &self.entries[index];
        let payload = codec::read_payload(entry.resolve(&self.dataset_dir))?;
        Ok((payload, entry.label.clone()))
    }

    /// Iterate over all elements with a fresh cursor
    pub fn iter(&self) -> Iter<'_, X, Y> {
        Iter {
            dataset: self,
            position: 0,
        }
    }
}

fn next_file_id<Y>(entries: &[Entry<Y>]) -> u64 {
    entries
        .iter()
        .filter_map(|entry| match entry.source {
            Source::Backing(id) => Some(id + 1),
            Source::Link(_) => None,
        })
        .max()
        .unwrap_or(0)
}

/// Iterator over `(payload, label)` pairs of a [`Dataset`]
///
/// Each iterator owns its position; any number may run over the same
/// dataset.
pub struct Iter<'a, X, Y> {
    dataset: &'a Dataset<X, Y>,
    position: usize,
}

impl<X, Y> Iterator for Iter<'_, X, Y>
where
    X: DeserializeOwned,
    Y: Clone,
{
    type Item = Result<(X, Y)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.dataset.len() {
            return None;
        }
        let item = self.dataset.get(self.position);
        self.position += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.dataset.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl<X, Y> ExactSizeIterator for Iter<'_, X, Y>
where
    X: DeserializeOwned,
    Y: Clone,
{
}

impl<'a, X, Y> IntoIterator for &'a Dataset<X, Y>
where
    X: DeserializeOwned,
    Y: Clone,
{
    type Item = Result<(X, Y)>;
    type IntoIter = Iter<'a, X, Y>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
