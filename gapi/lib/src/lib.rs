//! Schema-driven API code generation.
//!
//! gapi reads declarative API schema files (JSON or YAML) found anywhere in a
//! project and generates matching server stubs and client callers for each
//! output the schema declares.
//!
//! ## Pipeline
//!
//! - [`scanner`] - Finds schema files by their `version` header
//! - [`loader`] - Decodes a file into a [`Schema`]
//! - [`validation`] - Checks a schema before any code is produced
//! - [`builder`] - Per-language source builders and their registry
//! - [`emitter`] - Assembles fragments and writes files atomically
//! - [`pipeline`] - Runs all of the above per file with failure isolation
//!
//! ## Supporting Modules
//!
//! - [`placeholder`] - `$project`-style output path substitution
//! - [`dispatch`] - The action-dispatch runtime generated servers target
//! - [`config`] - Root config file and run options
//! - [`error`] - Error types for every stage

pub mod builder;
pub mod config;
pub mod dispatch;
pub mod emitter;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod placeholder;
pub mod scanner;
pub mod schema;
pub mod validation;

pub use builder::{Builder, BuilderRegistry, Fragments, Language};
pub use config::{GenerateOptions, ReportStrategy, RootConfig};
pub use error::{
    BuildError, ConfigError, DiscoveryError, DispatchError, EmitError, ErrorKind, LoadError,
    ValidationError,
};
pub use pipeline::{CancellationToken, FileReport, FileStatus, Generator, RunReport};
pub use schema::Schema;
