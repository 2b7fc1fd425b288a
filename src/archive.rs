//! ZIP packing and extraction for DoF archives

use crate::config::Compression;
use crate::error::{DofError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Members at or above this size need zip64 headers
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

fn open_source(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            DofError::NotFound(path.to_path_buf())
        } else {
            DofError::Io(e)
        }
    })
}

/// A file to store in the archive under `name`
#[derive(Debug, Clone)]
pub struct PackMember {
    pub name: String,
    pub source: PathBuf,
}

/// Result of extracting an archive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Members written to disk
    pub extracted: usize,
    /// Members skipped because a file already existed at their path
    pub skipped: usize,
}

/// Write a new archive at `target` holding in-memory metadata members and file members
///
/// The target must not exist. A partially written archive is removed on failure.
pub fn pack(
    target: &Path,
    metadata: &[(&str, &[u8])],
    members: &[PackMember],
    compression: Compression,
) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                DofError::validation(format!(
                    "target file \"{}\" already exists",
                    target.display()
                ))
            } else {
                DofError::Io(e)
            }
        })?;

    let result = write_members(file, metadata, members, compression);
    if result.is_err() {
        fs::remove_file(target).ok();
    }
    result
}

fn write_members(
    file: File,
    metadata: &[(&str, &[u8])],
    members: &[PackMember],
    compression: Compression,
) -> Result<()> {
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let text_options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, bytes) in metadata {
        zip.start_file(*name, text_options)?;
        zip.write_all(bytes)?;
    }

    for member in members {
        let mut source = open_source(&member.source)?;
        let size = source.metadata()?.len();
        let options = SimpleFileOptions::default()
            .compression_method(compression.method())
            .large_file(size >= ZIP64_THRESHOLD);

        zip.start_file(member.name.as_str(), options)?;
        io::copy(&mut source, &mut zip)?;
        debug!(member = %member.name, size, "Packed member");
    }

    zip.finish()?.flush()?;
    Ok(())
}

/// Read access to a packed archive
pub struct ArchiveReader {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
}

impl ArchiveReader {
    /// Open `path` as an archive
    ///
    /// Fails with [`DofError::Format`] if the file is not a readable ZIP archive.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_source(&path)?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|e| {
            DofError::Format(format!("\"{}\" is not a DoF file: {}", path.display(), e))
        })?;
        Ok(Self { path, archive })
    }

    /// Member names in archive order
    pub fn names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// Read one member fully into memory
    pub fn read_member(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut member = self.archive.by_name(name).map_err(|e| match e {
            zip::result::ZipError::FileNotFound => DofError::Format(format!(
                "\"{}\" is not a DoF file: missing member {}",
                self.path.display(),
                name
            )),
            other => DofError::Archive(other),
        })?;
        let mut bytes = Vec::with_capacity(member.size() as usize);
        member.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Extract every member into `dir`, creating it if needed
    ///
    /// A member is skipped when any file already exists at its destination;
    /// existing content is not compared against the archive. Each member is
    /// written to a `.part` sibling and renamed into place, so a destination
    /// path is either complete or absent.
    pub fn extract_into(&mut self, dir: &Path) -> Result<ExtractStats> {
        fs::create_dir_all(dir)?;
        let mut stats = ExtractStats::default();

        for i in 0..self.archive.len() {
            let mut member = self.archive.by_index(i)?;
            let Some(relative) = member.enclosed_name() else {
                warn!(member = %member.name(), "Skipping member with unsafe path");
                continue;
            };
            let dest = dir.join(relative);

            if member.is_dir() {
                fs::create_dir_all(&dest)?;
                continue;
            }
            if dest.exists() {
                debug!(path = %dest.display(), "Member already present, skipping");
                stats.skipped += 1;
                continue;
            }
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut partial = dest.clone().into_os_string();
            partial.push(".part");
            let partial = PathBuf::from(partial);

            let mut out = File::create(&partial)?;
            io::copy(&mut member, &mut out)?;
            out.flush()?;
            drop(out);
            fs::rename(&partial, &dest)?;
            stats.extracted += 1;
        }

        info!(
            archive = %self.path.display(),
            dir = %dir.display(),
            extracted = stats.extracted,
            skipped = stats.skipped,
            "Extracted archive"
        );
        Ok(stats)
    }
}
