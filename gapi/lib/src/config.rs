//! Run configuration.
//!
//! [`RootConfig`] is the project-level `.gapi.json` / `.gapi.yaml` file that
//! tells the generator where the project lives. [`GenerateOptions`] controls
//! how a single run behaves and is usually filled from CLI flags.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::debug;

use crate::error::ConfigError;
use crate::loader::decode_document;

/// File names tried by [`RootConfig::discover`], in order.
pub const ROOT_CONFIG_FILES: &[&str] = &[".gapi.json", ".gapi.yaml", ".gapi.yml"];

/// Project-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootConfig {
    /// Address the dispatch server listens on. Informational for the
    /// generator itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,

    /// Project root; relative paths are resolved against the config file's
    /// directory by [`RootConfig::load`].
    #[serde(default)]
    pub project: PathBuf,
}

impl RootConfig {
    /// Loads a root config file.
    ///
    /// ## Errors
    ///
    /// Returns `ConfigError::Load` for unreadable or malformed files and
    /// `ConfigError::CurrentDir` when a relative path cannot be made absolute.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let path = absolute(path)?;
        let mut config: RootConfig = decode_document(&path)?;

        if config.project.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("/"));
            config.project = base.join(&config.project);
        }

        debug!(
            config = %path.display(),
            project = %config.project.display(),
            "loaded root config"
        );
        Ok(config)
    }

    /// Finds the first of [`ROOT_CONFIG_FILES`] in `dir`.
    pub fn find(dir: &Path) -> Option<PathBuf> {
        ROOT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Finds and loads the root config in `dir`.
    ///
    /// ## Errors
    ///
    /// `ConfigError::NotFound` when none of [`ROOT_CONFIG_FILES`] exists,
    /// otherwise the errors of [`RootConfig::load`].
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::find(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;
        Self::load(&path)
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(ConfigError::CurrentDir)?;
    Ok(cwd.join(path))
}

/// How failures are surfaced during a run.
///
/// Both strategies return the same [`RunReport`](crate::pipeline::RunReport);
/// they differ only in whether failures are also logged as each file
/// finishes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum ReportStrategy {
    /// Collect everything into the final report.
    #[default]
    Aggregate,
    /// Additionally log each file's failures as soon as it is processed.
    PerFile,
}

/// Options for one generator run.
///
/// ```
/// use gapi_lib::config::{GenerateOptions, ReportStrategy};
///
/// let options = GenerateOptions::new().jobs(4).dry_run(true);
/// assert_eq!(options.jobs, 4);
/// assert!(options.dry_run);
/// assert_eq!(options.report, ReportStrategy::Aggregate);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Schema files processed concurrently. `1` runs everything on the
    /// calling thread.
    pub jobs: usize,
    /// Build everything but write nothing.
    pub dry_run: bool,
    pub report: ReportStrategy,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            dry_run: false,
            report: ReportStrategy::default(),
        }
    }
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker count; `0` is treated as `1`.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn report(mut self, report: ReportStrategy) -> Self {
        self.report = report;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn relative_project_resolves_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".gapi.json");
        fs::write(&path, r#"{"listen": ":8080", "project": "app"}"#).unwrap();

        let config = RootConfig::load(&path).unwrap();
        assert_eq!(config.listen.as_deref(), Some(":8080"));
        assert_eq!(config.project, dir.path().join("app"));
    }

    #[test]
    fn missing_project_means_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".gapi.yaml");
        fs::write(&path, "listen: ':9000'\n").unwrap();

        let config = RootConfig::load(&path).unwrap();
        assert_eq!(config.project, dir.path());
    }

    #[test]
    fn absolute_project_is_kept() {
        let dir = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let path = dir.path().join(".gapi.yml");
        fs::write(
            &path,
            format!("project: '{}'\n", elsewhere.path().display()),
        )
        .unwrap();

        assert_eq!(RootConfig::load(&path).unwrap().project, elsewhere.path());
    }

    #[test]
    fn discover_prefers_json_over_yaml() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gapi.yaml"), "project: from-yaml\n").unwrap();
        fs::write(dir.path().join(".gapi.json"), r#"{"project": "from-json"}"#).unwrap();

        let config = RootConfig::discover(dir.path()).unwrap();
        assert_eq!(config.project, dir.path().join("from-json"));
    }

    #[test]
    fn discover_without_config_is_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            RootConfig::discover(dir.path()),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn malformed_config_is_a_load_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".gapi.json");
        fs::write(&path, "{ nope").unwrap();

        assert!(matches!(RootConfig::load(&path), Err(ConfigError::Load(_))));
    }

    #[test]
    fn report_strategy_parses_kebab_case() {
        assert_eq!("per-file".parse::<ReportStrategy>().unwrap(), ReportStrategy::PerFile);
        assert_eq!("Aggregate".parse::<ReportStrategy>().unwrap(), ReportStrategy::Aggregate);
        assert_eq!(ReportStrategy::PerFile.to_string(), "per-file");
        assert!("streaming".parse::<ReportStrategy>().is_err());
    }

    #[test]
    fn zero_jobs_means_one() {
        assert_eq!(GenerateOptions::new().jobs(0).jobs, 1);
    }
}
