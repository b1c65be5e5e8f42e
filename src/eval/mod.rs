//! Flake evaluation - extracting declared metadata and inputs.
//!
//! Resolution consumes this as an opaque capability behind the `Evaluator`
//! trait; the shipped implementation reads the flake's manifest file from
//! the fetched tree.

pub mod manifest;

use std::path::PathBuf;

use thiserror::Error;

use crate::core::reference::RefParseError;
use crate::sources::SourceInfo;

pub use manifest::{FlakeInput, FlakeMetadata, ManifestEvaluator, MANIFEST_NAME, SUPPORTED_EPOCH};

/// Error evaluating a flake's declaration.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("no flake manifest found in `{path}`")]
    MissingManifest { path: PathBuf },

    #[error("failed to read flake manifest `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed flake manifest `{path}`: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("flake `{id}` declares unsupported epoch {epoch}")]
    UnsupportedEpoch { id: String, epoch: u64 },

    #[error("invalid reference for input `{input}`")]
    InvalidInput {
        input: String,
        #[source]
        source: RefParseError,
    },
}

/// Extracts a flake's declared metadata from a fetched source tree.
pub trait Evaluator {
    fn parse_flake(&self, source: &SourceInfo) -> Result<FlakeMetadata, EvalError>;
}
