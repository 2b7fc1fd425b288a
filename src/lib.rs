//! DoF - Deep Model Core Output Framework
//!
//! Packs paired input/output samples, together with licensing and authorship
//! metadata, into a single distributable archive, and unpacks such archives
//! for training code that wants indexed or sequential access.
//!
//! ## Forms
//!
//! | Form | Where | Used for |
//! |------|-------|----------|
//! | Exploded | Dataset directory of loose files | Appending, reading |
//! | Packed | One ZIP archive (`.dof`) | Distribution |
//!
//! ## Storage Layout
//!
//! ```text
//! dataset/
//! ├── .dofinfo/
//! │   ├── elementslist.json   # Labels and per-element info, in order
//! │   └── dataset.json        # Dataset-level provenance
//! ├── 0.out                   # MessagePack-encoded payloads
//! └── 1.out
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use dof::{Config, Dataset, DatasetInfo, Element};
//!
//! let config = Config::with_dataset_dir("./dataset");
//! let mut dataset: Dataset<i64, String> = Dataset::create("out.dof", &config)?;
//! dataset.append(Element::new(1, "a".to_string()))?;
//! dataset.set_info(
//!     DatasetInfo::builder()
//!         .field("coremodel_family", "mlp")
//!         .field("coremodel_type", "regressor")
//!         .field("coremodel_common", true)
//!         .field("original_author", "someone")
//!         .field("original_source", "https://example.org")
//!         .field("original_license", "MIT")
//!         .field("dof_author", "me")
//!         .field("dof_author_contact", "me@example.org")
//!         .field("dof_source", "https://example.org/dof")
//!         .field("dof_license", "MIT")
//!         .build()?,
//! );
//! dataset.save(false)?;
//!
//! let reader: Dataset<i64, String> = Dataset::read("out.dof", &Config::with_dataset_dir("./unpacked"))?;
//! for pair in &reader {
//!     let (payload, label) = pair?;
//!     println!("{} -> {}", payload, label);
//! }
//! # Ok::<(), dof::DofError>(())
//! ```

pub mod archive;
pub mod codec;
pub mod config;
pub mod dataset;
pub mod element;
pub mod error;
pub mod manifest;
pub mod metadata;

// Re-exports
pub use config::{Compression, Config};
pub use dataset::{next_free_path, Dataset, Iter, Mode};
pub use element::Element;
pub use error::{DofError, Result};
pub use metadata::{DatasetInfo, DatasetInfoBuilder, ElementInfo};
