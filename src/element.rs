//! Dataset elements
//!
//! An [`Element`] pairs a payload (the sample input) with a label (the
//! expected output). The payload is either held in memory or referenced by
//! path to a file already encoded with [`crate::codec`].

use crate::codec;
use crate::error::{DofError, Result};
use crate::metadata::ElementInfo;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Where an element's payload lives
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<X> {
    Embedded(X),
    /// Path to an encoded payload file
    Link(PathBuf),
}

/// One sample: payload, label and optional provenance
#[derive(Debug, Clone, PartialEq)]
pub struct Element<X, Y> {
    payload: Payload<X>,
    label: Y,
    info: Option<ElementInfo>,
}

impl<X, Y> Element<X, Y> {
    /// Element with an in-memory payload
    pub fn new(payload: X, label: Y) -> Self {
        Self {
            payload: Payload::Embedded(payload),
            label,
            info: None,
        }
    }

    /// Element whose payload is stored in an existing file
    ///
    /// Fails with [`DofError::NotFound`] if `path` is not an existing file.
    pub fn link<P: AsRef<Path>>(path: P, label: Y) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DofError::NotFound(path.to_path_buf()));
        }
        Ok(Self {
            payload: Payload::Link(path.to_path_buf()),
            label,
            info: None,
        })
    }

    /// Attach per-element provenance
    pub fn with_info(mut self, info: ElementInfo) -> Self {
        self.info = Some(info);
        self
    }

    pub fn label(&self) -> &Y {
        &self.label
    }

    pub fn info(&self) -> Option<&ElementInfo> {
        self.info.as_ref()
    }

    pub fn is_link(&self) -> bool {
        matches!(self.payload, Payload::Link(_))
    }

    /// Path of a link element
    ///
    /// Fails with [`DofError::State`] if the payload is embedded.
    pub fn link_path(&self) -> Result<&Path> {
        match &self.payload {
            Payload::Link(path) => Ok(path),
            Payload::Embedded(_) => Err(DofError::state(
                "tried to get link from an element with embedded content",
            )),
        }
    }

    pub(crate) fn into_parts(self) -> (Payload<X>, Y, Option<ElementInfo>) {
        (self.payload, self.label, self.info)
    }
}

impl<X: Clone + DeserializeOwned, Y> Element<X, Y> {
    /// The payload value
    ///
    /// Link elements decode the referenced file on every call.
    pub fn payload(&self) -> Result<X> {
        match &self.payload {
            Payload::Embedded(value) => Ok(value.clone()),
            Payload::Link(path) => codec::read_payload(path),
        }
    }
}
