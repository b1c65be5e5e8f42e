//! The flake manifest format.
//!
//! A flake declares itself in a `Floe.toml` at its root:
//!
//! ```toml
//! [flake]
//! id = "myapp"
//! description = "An application"
//! epoch = 1
//!
//! [inputs]
//! nixpkgs = "github:NixOS/nixpkgs"
//! data = { uri = "https://example.org/data.tar.gz", flake = false }
//! ```
//!
//! Input declaration order is preserved; it drives traversal and listing
//! order downstream.

use std::path::Path;

use serde::Deserialize;

use crate::core::reference::FlakeRef;
use crate::eval::{EvalError, Evaluator};
use crate::sources::SourceInfo;

/// Manifest file name, at the root of every flake.
pub const MANIFEST_NAME: &str = "Floe.toml";

/// The manifest schema epoch this build understands.
pub const SUPPORTED_EPOCH: u64 = 1;

/// A flake's declared metadata.
#[derive(Debug, Clone)]
pub struct FlakeMetadata {
    pub id: String,
    pub description: String,
    pub epoch: u64,
    /// Declared inputs, in declaration order.
    pub inputs: Vec<FlakeInput>,
}

/// One declared input.
#[derive(Debug, Clone)]
pub struct FlakeInput {
    pub name: String,
    pub reference: FlakeRef,
    /// Non-flake inputs are fetched but not evaluated or recursed into.
    pub flake: bool,
}

#[derive(Deserialize)]
struct ManifestFile {
    flake: FlakeSection,
    #[serde(default)]
    inputs: toml::Table,
}

#[derive(Deserialize)]
struct FlakeSection {
    id: String,
    #[serde(default)]
    description: String,
    epoch: u64,
}

/// The standard evaluator: reads `Floe.toml` from the stored tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestEvaluator;

impl Evaluator for ManifestEvaluator {
    fn parse_flake(&self, source: &SourceInfo) -> Result<FlakeMetadata, EvalError> {
        parse_manifest_dir(&source.store_path)
    }
}

/// Parse the flake manifest found in `dir`.
pub fn parse_manifest_dir(dir: &Path) -> Result<FlakeMetadata, EvalError> {
    let path = dir.join(MANIFEST_NAME);
    if !path.exists() {
        return Err(EvalError::MissingManifest {
            path: dir.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(&path).map_err(|source| EvalError::Io {
        path: path.clone(),
        source,
    })?;

    let file: ManifestFile = toml::from_str(&content).map_err(|e| EvalError::Malformed {
        path: path.clone(),
        message: e.to_string(),
    })?;

    if file.flake.id.is_empty() {
        return Err(EvalError::Malformed {
            path: path.clone(),
            message: "flake id must not be empty".to_string(),
        });
    }

    if file.flake.epoch != SUPPORTED_EPOCH {
        return Err(EvalError::UnsupportedEpoch {
            id: file.flake.id,
            epoch: file.flake.epoch,
        });
    }

    let mut inputs = Vec::with_capacity(file.inputs.len());
    for (name, value) in &file.inputs {
        inputs.push(parse_input(&path, name, value)?);
    }

    Ok(FlakeMetadata {
        id: file.flake.id,
        description: file.flake.description,
        epoch: file.flake.epoch,
        inputs,
    })
}

fn parse_input(
    manifest_path: &Path,
    name: &str,
    value: &toml::Value,
) -> Result<FlakeInput, EvalError> {
    let (uri, flake) = match value {
        toml::Value::String(uri) => (uri.as_str(), true),
        toml::Value::Table(table) => {
            for key in table.keys() {
                if key != "uri" && key != "flake" {
                    return Err(EvalError::Malformed {
                        path: manifest_path.to_path_buf(),
                        message: format!("input `{name}` has unknown key `{key}`"),
                    });
                }
            }
            let uri = table.get("uri").and_then(|v| v.as_str()).ok_or_else(|| {
                EvalError::Malformed {
                    path: manifest_path.to_path_buf(),
                    message: format!("input `{name}` is missing a string `uri`"),
                }
            })?;
            let flake = table
                .get("flake")
                .map(|v| {
                    v.as_bool().ok_or_else(|| EvalError::Malformed {
                        path: manifest_path.to_path_buf(),
                        message: format!("input `{name}` has a non-boolean `flake`"),
                    })
                })
                .transpose()?
                .unwrap_or(true);
            (uri, flake)
        }
        _ => {
            return Err(EvalError::Malformed {
                path: manifest_path.to_path_buf(),
                message: format!("input `{name}` must be a string or a table"),
            });
        }
    };

    let reference = FlakeRef::parse(uri).map_err(|source| EvalError::InvalidInput {
        input: name.to_string(),
        source,
    })?;

    Ok(FlakeInput {
        name: name.to_string(),
        reference,
        flake,
    })
}
