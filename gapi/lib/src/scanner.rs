//! Project-wide discovery of gapi schema files.
//!
//! [`scan`] walks the project tree depth-first with entries sorted by file
//! name, so discovery order is the same on every platform. For every
//! `.json`, `.yaml` or `.yml` file only the `version` header is decoded; the
//! file is yielded when that version is in [`SUPPORTED_VERSIONS`].
//!
//! Filtering is best-effort: unreadable or malformed documents and documents
//! without a version are skipped silently. Only a failure of the directory
//! walk itself is reported, and it ends the scan.
//!
//! ## Unknown versions
//!
//! A document whose version starts with `gapi` but is not supported (say
//! `gapi.v2`) is skipped with a warning rather than failing the run. Any
//! other version string is treated as an unrelated document.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::DiscoveryError;
use crate::loader::{DocumentFormat, decode_document};
use crate::schema::SUPPORTED_VERSIONS;

/// Only the header field the scanner needs.
#[derive(Debug, Deserialize)]
struct VersionHeader {
    version: Option<String>,
}

/// Returns true if `version` is a schema version this generator understands.
///
/// ```
/// use gapi_lib::scanner::is_supported_version;
///
/// assert!(is_supported_version("gapi"));
/// assert!(is_supported_version("gapi.v1"));
/// assert!(!is_supported_version("gapi.v2"));
/// ```
pub fn is_supported_version(version: &str) -> bool {
    SUPPORTED_VERSIONS.contains(&version)
}

/// Lazy iterator over the schema files of a project.
///
/// Yields `Err` at most once; after a traversal failure it is exhausted.
pub struct ProjectScanner {
    root: PathBuf,
    walker: walkdir::IntoIter,
    failed: bool,
}

/// Starts scanning `project_root` for schema files.
///
/// ## Errors
///
/// Returns `DiscoveryError::RootNotFound` if `project_root` is not a
/// directory. Traversal failures surface through the iterator.
pub fn scan(project_root: &Path) -> Result<ProjectScanner, DiscoveryError> {
    if !project_root.is_dir() {
        return Err(DiscoveryError::RootNotFound(project_root.to_path_buf()));
    }

    let walker = WalkDir::new(project_root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    Ok(ProjectScanner {
        root: project_root.to_path_buf(),
        walker,
        failed: false,
    })
}

impl Iterator for ProjectScanner {
    type Item = Result<PathBuf, DiscoveryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(source) => {
                    self.failed = true;
                    let path = source
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    return Some(Err(DiscoveryError::Walk { path, source }));
                }
            };

            if !entry.file_type().is_file() || DocumentFormat::from_path(entry.path()).is_none() {
                continue;
            }

            let path = entry.into_path();
            if is_schema_file(&path) {
                debug!(path = %path.display(), "discovered schema file");
                return Some(Ok(path));
            }
        }
    }
}

/// Reads only the version header of `path` and checks it.
fn is_schema_file(path: &Path) -> bool {
    let header: VersionHeader = match decode_document(path) {
        Ok(header) => header,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "skipping undecodable document");
            return false;
        }
    };

    match header.version {
        Some(version) if is_supported_version(&version) => true,
        Some(version) if version.starts_with("gapi") => {
            warn!(
                path = %path.display(),
                version = %version,
                supported = ?SUPPORTED_VERSIONS,
                "skipping schema with unsupported version"
            );
            false
        }
        Some(_) | None => false,
    }
}
