//! Assembles builder fragments into a file and writes it atomically.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::builder::{Companion, Fragments, join_blocks};
use crate::error::EmitError;
use crate::placeholder::resolve_output_path;
use crate::schema::OutputTarget;

/// First line of every generated file. Go tooling recognizes this form.
pub const START_MARKER: &str = "// Code generated by gapi. DO NOT EDIT.";

/// Last line of every generated file.
pub const END_MARKER: &str = "// End of gapi generated code.";

/// Joins fragments in their fixed order, framed by the markers.
///
/// Empty fragments are dropped; the result ends with a newline.
///
/// ```
/// use gapi_lib::builder::Fragments;
/// use gapi_lib::emitter::assemble;
///
/// let text = assemble(&Fragments {
///     header: "package api\n".into(),
///     ..Fragments::default()
/// });
/// assert_eq!(
///     text,
///     "// Code generated by gapi. DO NOT EDIT.\n\npackage api\n\n// End of gapi generated code.\n"
/// );
/// ```
pub fn assemble(fragments: &Fragments) -> String {
    let body = join_blocks([
        fragments.header.clone(),
        fragments.imports.clone(),
        fragments.types.clone(),
        fragments.actions.clone(),
    ]);

    let mut text = String::with_capacity(body.len() + START_MARKER.len() + END_MARKER.len() + 8);
    text.push_str(START_MARKER);
    text.push_str("\n\n");
    if !body.is_empty() {
        text.push_str(&body);
        text.push_str("\n\n");
    }
    text.push_str(END_MARKER);
    text.push('\n');
    text
}

/// Writes `content` to `path` through a temporary file in the same
/// directory, so readers see either the old file or the complete new one.
///
/// Missing parent directories are created.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), EmitError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if !parent.exists() {
        debug!(dir = %parent.display(), "creating output directory");
        fs::create_dir_all(parent).map_err(|source| EmitError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let write_error = |source| EmitError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut temp = NamedTempFile::new_in(parent).map_err(write_error)?;
    temp.write_all(content.as_bytes()).map_err(write_error)?;
    temp.flush().map_err(write_error)?;

    temp.persist(path).map_err(|err| EmitError::Persist {
        path: path.to_path_buf(),
        source: err.error,
    })?;

    Ok(())
}

/// Assembles `fragments` and writes them to the target's resolved path.
///
/// With `dry_run` set nothing touches the filesystem; the resolved path and
/// the text that would have been written are returned either way.
#[instrument(skip(fragments, target), fields(file = %target.file_path))]
pub fn emit(
    fragments: &Fragments,
    target: &OutputTarget,
    project_root: &Path,
    dry_run: bool,
) -> Result<(PathBuf, String), EmitError> {
    let path = resolve_output_path(&target.file_path, project_root);
    let text = assemble(fragments);

    if dry_run {
        debug!(path = %path.display(), bytes = text.len(), "dry run, not writing");
    } else {
        write_atomic(&path, &text)?;
        info!(path = %path.display(), bytes = text.len(), "wrote generated file");
    }

    Ok((path, text))
}

/// Writes `companion` into the directory of the already resolved `primary`
/// output path.
#[instrument(skip(companion, primary), fields(file = %companion.file_name))]
pub fn emit_companion(
    companion: &Companion,
    primary: &Path,
    dry_run: bool,
) -> Result<(PathBuf, String), EmitError> {
    let path = primary.with_file_name(&companion.file_name);
    let text = assemble(&companion.fragments);

    if !dry_run {
        write_atomic(&path, &text)?;
        info!(path = %path.display(), bytes = text.len(), "wrote companion file");
    }

    Ok((path, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fragments() -> Fragments {
        Fragments {
            header: "package api\n".to_string(),
            imports: String::new(),
            types: "type User struct{}".to_string(),
            actions: "func A() {}\n".to_string(),
        }
    }

    fn target(file_path: &str) -> OutputTarget {
        OutputTarget {
            kind: "server".to_string(),
            language: "go".to_string(),
            package_name: Some("api".to_string()),
            file_path: file_path.to_string(),
            runtime: None,
        }
    }

    #[test]
    fn assembles_in_fixed_order_between_markers() {
        assert_eq!(
            assemble(&fragments()),
            "// Code generated by gapi. DO NOT EDIT.\n\npackage api\n\ntype User struct{}\n\nfunc A() {}\n\n// End of gapi generated code.\n"
        );
    }

    #[test]
    fn empty_fragments_still_carry_markers() {
        assert_eq!(
            assemble(&Fragments::default()),
            format!("{START_MARKER}\n\n{END_MARKER}\n")
        );
    }

    #[test]
    fn emit_resolves_placeholder_and_creates_directories() {
        let dir = TempDir::new().unwrap();
        let (path, text) = emit(&fragments(), &target("$project/gen/go/api.go"), dir.path(), false).unwrap();

        assert_eq!(path, dir.path().join("gen/go/api.go"));
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }

    #[test]
    fn emit_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api.go");
        fs::write(&path, "stale").unwrap();

        emit(&fragments(), &target("${projectDir}/api.go"), dir.path(), false).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with(START_MARKER));
        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1, "temporary file left behind");
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let (path, text) = emit(&fragments(), &target("$project/out/api.go"), dir.path(), true).unwrap();

        assert!(!path.exists());
        assert!(!dir.path().join("out").exists());
        assert!(text.contains("type User struct{}"));
    }

    #[test]
    fn companion_lands_next_to_primary() {
        let dir = TempDir::new().unwrap();
        let companion = Companion {
            file_name: "gapi_runtime.go".to_string(),
            fragments: Fragments {
                header: "package api\n".to_string(),
                ..Fragments::default()
            },
        };
        let primary = dir.path().join("gen/api.go");

        let (path, _) = emit_companion(&companion, &primary, true).unwrap();
        assert_eq!(path, dir.path().join("gen/gapi_runtime.go"));
        assert!(!path.exists());

        let (path, text) = emit_companion(&companion, &primary, false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
        assert!(text.starts_with(START_MARKER));
    }

    #[test]
    fn unwritable_directory_is_an_emit_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a dir").unwrap();

        let err = write_atomic(&blocker.join("sub/api.go"), "x").unwrap_err();
        assert!(matches!(err, EmitError::CreateDir { .. }), "got {err:?}");
    }
}
