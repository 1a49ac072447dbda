//! Error types for the gapi generation pipeline.
//!
//! Each stage of the pipeline owns one error enum. Only [`DiscoveryError`]
//! aborts a whole run; the others are scoped to one schema file or one
//! output and are collected into the run report.

use std::path::PathBuf;

use serde::Serialize;
use strum::Display;
use thiserror::Error;

/// Failure while walking the project directory.
///
/// Fatal for the whole run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The project root does not exist or is not a directory.
    #[error("project directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// The directory walk failed (e.g. permission denied).
    #[error("failed to walk project directory '{}': {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Failure decoding a structured config document.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The extension is not one of `.json`, `.yaml`, `.yml`.
    #[error("unsupported file extension: {}", .0.display())]
    UnsupportedExtension(PathBuf),

    /// Malformed JSON content.
    #[error("failed to decode JSON '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Malformed YAML content.
    #[error("failed to decode YAML '{}': {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// A single schema-consistency violation.
///
/// The validator reports every violation it finds, so these are usually
/// handled as a `Vec<ValidationError>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required string field is empty.
    #[error("{location}: must not be empty")]
    EmptyField { location: String },

    /// A definition declares both an import and local attributes.
    #[error("definitions.{definition}: `import` and `attributes` are mutually exclusive")]
    ImportWithAttributes { definition: String },

    /// An import is missing its module or name.
    #[error("definitions.{definition}.import: both `from` and `name` are required")]
    IncompleteImport { definition: String },

    /// Two entries with the same name in one ordered sequence.
    #[error("{location}: duplicate name '{name}'")]
    DuplicateName { location: String, name: String },

    /// A type reference that is neither primitive, local nor imported.
    #[error("{location}: unresolved type '{type_name}'")]
    UnresolvedType { location: String, type_name: String },

    /// An action method outside GET, POST, PUT, DELETE, PATCH.
    #[error("actions.{action}.method: unsupported method '{method}'")]
    InvalidMethod { action: String, method: String },

    /// The schema declares no outputs.
    #[error("outputs: at least one output is required")]
    NoOutputs,

    /// An output kind other than `server` or `client`.
    #[error("outputs[{index}].kind: unsupported kind '{kind}'")]
    InvalidKind { index: usize, kind: String },

    /// An output language with no registered builder.
    #[error("outputs[{index}].language: no builder registered for '{language}'")]
    UnknownLanguage { index: usize, language: String },
}

/// A builder could not produce a fragment for one output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The target language needs a package name and none was given.
    #[error("{language} output requires a `package` name")]
    MissingPackage { language: &'static str },

    /// The output kind is not `server` or `client`.
    #[error("unsupported output kind '{0}'")]
    UnsupportedKind(String),

    /// An action method outside the supported verbs.
    #[error("action '{action}' has unsupported method '{method}'")]
    UnsupportedMethod { action: String, method: String },

    /// No builder is registered for the output language.
    #[error("no builder registered for language '{0}'")]
    UnknownLanguage(String),

    /// A primitive keyword has no mapping in the target language.
    #[error("type '{type_name}' has no {language} mapping")]
    UnmappedType {
        type_name: String,
        language: &'static str,
    },

    /// Two schema entities map to the same generated symbol.
    #[error("generated symbol '{symbol}' is produced by both {first} and {second}")]
    NameCollision {
        symbol: String,
        first: String,
        second: String,
    },

    /// A name cannot be turned into a valid identifier.
    #[error("'{name}' is not a valid {language} identifier")]
    InvalidIdentifier {
        name: String,
        language: &'static str,
    },
}

/// Failure writing a generated file.
#[derive(Debug, Error)]
pub enum EmitError {
    /// Parent directories could not be created.
    #[error("failed to create directory '{}': {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temporary file could not be created or written.
    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temporary file could not be renamed into place.
    #[error("failed to move generated file into '{}': {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure bootstrapping the root configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `.gapi.json`, `.gapi.yaml` or `.gapi.yml` was found.
    #[error("no root config found in '{}' (looked for .gapi.json, .gapi.yaml, .gapi.yml)", .0.display())]
    NotFound(PathBuf),

    /// The config file could not be decoded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The working directory could not be determined.
    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

/// Failure assembling an action registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Two handlers were registered under one action name.
    #[error("action '{0}' is registered more than once")]
    DuplicateAction(String),
}

/// Label for a failure recorded in the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Decode,
    Validation,
    Build,
    Emit,
}
