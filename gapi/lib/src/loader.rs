//! Schema loading from JSON and YAML documents.
//!
//! The scanner and the loader both go through [`decode_document`]: the
//! scanner decodes only a version header, the loader decodes the full
//! [`Schema`]. The two reads are independent, so a file can pass the header
//! check and still fail here.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::LoadError;
use crate::schema::Schema;

/// Structured config formats recognized by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Picks the format from a path's extension (`.json`, `.yaml`, `.yml`).
    ///
    /// ```
    /// use std::path::Path;
    /// use gapi_lib::loader::DocumentFormat;
    ///
    /// assert_eq!(DocumentFormat::from_path(Path::new("api.yml")), Some(DocumentFormat::Yaml));
    /// assert_eq!(DocumentFormat::from_path(Path::new("api.toml")), None);
    /// ```
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(DocumentFormat::Json),
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            _ => None,
        }
    }
}

/// Reads and decodes a JSON or YAML document into `T`.
///
/// ## Errors
///
/// - `LoadError::UnsupportedExtension` for any other extension
/// - `LoadError::Read` when the file cannot be read
/// - `LoadError::Json` / `LoadError::Yaml` for malformed content
pub fn decode_document<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let format = DocumentFormat::from_path(path)
        .ok_or_else(|| LoadError::UnsupportedExtension(path.to_path_buf()))?;

    let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    decode_str(path, &content, format)
}

/// Decodes already-read content. `path` is only used for error messages.
pub fn decode_str<T: DeserializeOwned>(
    path: &Path,
    content: &str,
    format: DocumentFormat,
) -> Result<T, LoadError> {
    match format {
        DocumentFormat::Json => serde_json::from_str(content).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        }),
        DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|source| LoadError::Yaml {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Loads a full schema file.
pub fn load(path: &Path) -> Result<Schema, LoadError> {
    let schema: Schema = decode_document(path)?;
    debug!(
        path = %path.display(),
        definitions = schema.definitions.len(),
        actions = schema.actions.len(),
        outputs = schema.outputs.len(),
        "loaded schema"
    );
    Ok(schema)
}
