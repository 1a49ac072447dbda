//! Project-root placeholder substitution for output paths.
//!
//! An output's `filePath` may start with one of [`PROJECT_TOKENS`]. The first
//! matching token is replaced, once, by the project root. A token anywhere
//! else in the path is ordinary text.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Recognized tokens, in match order. Longer spellings come before their
/// prefixes so `$projectDir` is never read as `$project` + `Dir`.
pub const PROJECT_TOKENS: &[&str] = &[
    "$projectdir",
    "$projectDir",
    "${ProjectDir}",
    "$ProjectDir",
    "$project",
    "$Project",
    "${projectDir}",
    "${projectdir}",
    "${Project}",
    "${project}",
];

/// Resolves `template` against `project_root`.
///
/// ```
/// use std::path::{Path, PathBuf};
/// use gapi_lib::placeholder::resolve_output_path;
///
/// let root = Path::new("/srv/app");
/// assert_eq!(
///     resolve_output_path("$projectDir/gen/api.go", root),
///     PathBuf::from("/srv/app/gen/api.go")
/// );
/// assert_eq!(
///     resolve_output_path("out/$project/api.go", root),
///     PathBuf::from("out/$project/api.go")
/// );
/// ```
pub fn resolve_output_path(template: &str, project_root: &Path) -> PathBuf {
    match strip_token(template) {
        Some(rest) => {
            let mut resolved = OsString::from(project_root.as_os_str());
            resolved.push(rest);
            PathBuf::from(resolved)
        }
        None => PathBuf::from(template),
    }
}

fn strip_token(template: &str) -> Option<&str> {
    PROJECT_TOKENS
        .iter()
        .find_map(|token| template.strip_prefix(token))
}
