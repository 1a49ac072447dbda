//! The generator run: scan, load, validate, build, emit.
//!
//! Each schema file runs through its own pipeline and a failure there is
//! recorded in that file's [`FileReport`] without touching any other file.
//! Within a file every output is built and emitted independently, so one
//! bad output does not block its siblings.
//!
//! Only a failed directory walk aborts the whole run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};

use crate::builder::BuilderRegistry;
use crate::config::{GenerateOptions, ReportStrategy};
use crate::emitter::{emit, emit_companion};
use crate::error::{DiscoveryError, ErrorKind};
use crate::loader;
use crate::scanner::scan;
use crate::schema::{OutputTarget, Schema};
use crate::validation::validate;

/// Stops a run from scheduling further files.
///
/// Files already in flight finish normally; files never started are
/// reported as [`FileStatus::Skipped`]. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One recorded failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: ErrorKind, err: &impl ToString) -> Self {
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// Outcome of one output of one schema file.
#[derive(Debug, Clone, Serialize)]
pub struct OutputReport {
    /// Position in the schema's `outputs` list.
    pub index: usize,
    pub kind: String,
    pub language: String,
    /// Resolved destination, when the output got as far as emitting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Generated text, kept only on dry runs.
    #[serde(skip)]
    pub content: Option<String>,
    /// Files written next to the output, such as its runtime.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub companions: Vec<CompanionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Failure>,
}

/// A file written alongside an output.
#[derive(Debug, Clone, Serialize)]
pub struct CompanionReport {
    pub path: PathBuf,
    #[serde(skip)]
    pub content: Option<String>,
}

impl OutputReport {
    fn new(index: usize, target: &OutputTarget) -> Self {
        Self {
            index,
            kind: target.kind.clone(),
            language: target.language.clone(),
            path: None,
            content: None,
            companions: Vec::new(),
            error: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Every output was produced.
    Ok,
    /// Some outputs failed, others were produced.
    Partial,
    /// Nothing was produced.
    Failed,
    /// Never started because the run was cancelled.
    Skipped,
}

/// Outcome of one schema file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    /// Failures that stopped the file before any output ran (decode and
    /// validation).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<Failure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputReport>,
}

impl FileReport {
    fn skipped(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            status: FileStatus::Skipped,
            failures: Vec::new(),
            outputs: Vec::new(),
        }
    }

    fn failed(path: &Path, failures: Vec<Failure>) -> Self {
        Self {
            path: path.to_path_buf(),
            status: FileStatus::Failed,
            failures,
            outputs: Vec::new(),
        }
    }

    fn from_outputs(path: &Path, outputs: Vec<OutputReport>) -> Self {
        let succeeded = outputs.iter().filter(|o| o.succeeded()).count();
        let status = if succeeded == outputs.len() {
            FileStatus::Ok
        } else if succeeded == 0 {
            FileStatus::Failed
        } else {
            FileStatus::Partial
        };

        Self {
            path: path.to_path_buf(),
            status,
            failures: Vec::new(),
            outputs,
        }
    }

    /// Every failure of this file, file-level first.
    pub fn all_failures(&self) -> impl Iterator<Item = &Failure> {
        self.failures
            .iter()
            .chain(self.outputs.iter().filter_map(|o| o.error.as_ref()))
    }
}

/// Counts over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub files: usize,
    pub outputs: usize,
    pub failures: usize,
    pub skipped: usize,
}

/// Result of a run, one entry per discovered schema file in scan order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub summary: Summary,
    pub files: Vec<FileReport>,
}

impl RunReport {
    fn new(files: Vec<FileReport>, dry_run: bool) -> Self {
        let summary = Summary {
            files: files.len(),
            outputs: files
                .iter()
                .flat_map(|f| &f.outputs)
                .filter(|o| o.succeeded())
                .count(),
            failures: files.iter().map(|f| f.all_failures().count()).sum(),
            skipped: files
                .iter()
                .filter(|f| f.status == FileStatus::Skipped)
                .count(),
        };

        Self {
            dry_run,
            summary,
            files,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failures > 0
    }

    /// Paths of every produced output, in order.
    pub fn produced(&self) -> impl Iterator<Item = &OutputReport> {
        self.files
            .iter()
            .flat_map(|f| &f.outputs)
            .filter(|o| o.succeeded())
    }
}

/// Runs the generator over one project.
///
/// ```no_run
/// use std::path::PathBuf;
/// use gapi_lib::builder::BuilderRegistry;
/// use gapi_lib::config::GenerateOptions;
/// use gapi_lib::pipeline::Generator;
///
/// let report = Generator::new(BuilderRegistry::with_defaults(), PathBuf::from("."))
///     .with_options(GenerateOptions::new().jobs(4))
///     .run()?;
/// println!("{} outputs", report.summary.outputs);
/// # Ok::<(), gapi_lib::error::DiscoveryError>(())
/// ```
#[derive(Debug)]
pub struct Generator {
    registry: BuilderRegistry,
    project_root: PathBuf,
    options: GenerateOptions,
    cancel: CancellationToken,
}

impl Generator {
    pub fn new(registry: BuilderRegistry, project_root: PathBuf) -> Self {
        Self {
            registry,
            project_root,
            options: GenerateOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// A handle that cancels this generator's runs.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Processes every schema file under the project root.
    ///
    /// ## Errors
    ///
    /// Only discovery failures are returned; everything else ends up in the
    /// report.
    pub fn run(&self) -> Result<RunReport, DiscoveryError> {
        info!(project = %self.project_root.display(), "starting generation");

        let files = scan(&self.project_root)?.collect::<Result<Vec<_>, _>>()?;
        debug!(count = files.len(), "discovered schema files");

        let reports = if self.options.jobs > 1 && files.len() > 1 {
            self.run_parallel(&files)
        } else {
            files.iter().map(|path| self.schedule(path)).collect()
        };

        let report = RunReport::new(reports, self.options.dry_run);
        info!(
            files = report.summary.files,
            outputs = report.summary.outputs,
            failures = report.summary.failures,
            skipped = report.summary.skipped,
            "generation finished"
        );
        Ok(report)
    }

    fn run_parallel(&self, files: &[PathBuf]) -> Vec<FileReport> {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.jobs)
            .build()
        {
            Ok(pool) => pool.install(|| files.par_iter().map(|path| self.schedule(path)).collect()),
            Err(err) => {
                warn!(error = %err, "failed to start worker pool, running sequentially");
                files.iter().map(|path| self.schedule(path)).collect()
            }
        }
    }

    fn schedule(&self, path: &Path) -> FileReport {
        if self.cancel.is_cancelled() {
            debug!(path = %path.display(), "run cancelled, skipping");
            return FileReport::skipped(path);
        }

        let report = self.process_file(path);
        if self.options.report == ReportStrategy::PerFile {
            for failure in report.all_failures() {
                error!(
                    path = %path.display(),
                    kind = %failure.kind,
                    "{}",
                    failure.message
                );
            }
        }
        report
    }

    /// Runs one schema file through the whole pipeline.
    pub fn process_file(&self, path: &Path) -> FileReport {
        let span = info_span!("schema", path = %path.display());
        let _guard = span.enter();

        let schema = match loader::load(path) {
            Ok(schema) => schema,
            Err(err) => {
                debug!(error = %err, "failed to decode schema");
                return FileReport::failed(path, vec![Failure::new(ErrorKind::Decode, &err)]);
            }
        };

        let violations = validate(&schema, &self.registry);
        if !violations.is_empty() {
            debug!(count = violations.len(), "schema failed validation");
            let failures = violations
                .iter()
                .map(|v| Failure::new(ErrorKind::Validation, v))
                .collect();
            return FileReport::failed(path, failures);
        }

        let outputs = schema
            .outputs
            .iter()
            .enumerate()
            .map(|(index, target)| self.process_output(&schema, index, target))
            .collect();

        FileReport::from_outputs(path, outputs)
    }

    fn process_output(&self, schema: &Schema, index: usize, target: &OutputTarget) -> OutputReport {
        let mut report = OutputReport::new(index, target);

        let built = self.registry.create(schema, target).and_then(|builder| {
            let fragments = builder.build()?;
            Ok((fragments, builder.build_companions()?))
        });
        let (fragments, companions) = match built {
            Ok(built) => built,
            Err(err) => {
                debug!(index, language = %target.language, error = %err, "build failed");
                report.error = Some(Failure::new(ErrorKind::Build, &err));
                return report;
            }
        };

        let dry_run = self.options.dry_run;
        let primary = match emit(&fragments, target, &self.project_root, dry_run) {
            Ok((path, text)) => {
                report.path = Some(path.clone());
                if dry_run {
                    report.content = Some(text);
                }
                path
            }
            Err(err) => {
                debug!(index, error = %err, "emit failed");
                report.error = Some(Failure::new(ErrorKind::Emit, &err));
                return report;
            }
        };

        for companion in &companions {
            match emit_companion(companion, &primary, dry_run) {
                Ok((path, text)) => report.companions.push(CompanionReport {
                    path,
                    content: dry_run.then_some(text),
                }),
                Err(err) => {
                    debug!(index, file = %companion.file_name, error = %err, "emit failed");
                    report.error = Some(Failure::new(ErrorKind::Emit, &err));
                    break;
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SCHEMA: &str = "
version: gapi
apiPath: /gapi
outputs:
  - kind: server
    language: go
    package: api
    filePath: $project/gen/server.go
  - kind: client
    language: typescript
    filePath: $project/gen/client.ts
definitions:
  User:
    attributes:
      - name: id
        type: string
        required: true
actions:
  GetUser:
    method: GET
    returns:
      - type: User
";

    fn generator(dir: &TempDir) -> Generator {
        Generator::new(BuilderRegistry::with_defaults(), dir.path().to_path_buf())
    }

    #[test]
    fn writes_every_output() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("api.yaml"), SCHEMA).unwrap();

        let report = generator(&dir).run().unwrap();

        assert_eq!(report.summary.outputs, 2);
        assert!(!report.has_failures());
        assert_eq!(report.files[0].status, FileStatus::Ok);
        assert!(dir.path().join("gen/server.go").is_file());
        assert!(dir.path().join("gen/client.ts").is_file());
    }

    #[test]
    fn server_output_writes_its_runtime_alongside() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("api.yaml"), SCHEMA).unwrap();

        let report = generator(&dir).run().unwrap();

        let server = &report.files[0].outputs[0];
        assert_eq!(server.companions.len(), 1);
        assert_eq!(server.companions[0].path, dir.path().join("gen/gapi_runtime.go"));
        let runtime = fs::read_to_string(dir.path().join("gen/gapi_runtime.go")).unwrap();
        assert!(runtime.contains("package api\n"));
        assert!(runtime.contains("func NewRegistry() *Registry {"));
        assert!(report.files[0].outputs[1].companions.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_aborts_the_run() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("api.yaml"), SCHEMA).unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can still read the directory.
        let readable = fs::read_dir(&locked).is_ok();
        let result = if readable { None } else { Some(generator(&dir).run()) };
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if let Some(result) = result {
            assert!(matches!(result, Err(DiscoveryError::Walk { .. })), "got {result:?}");
            assert!(!dir.path().join("gen").exists());
        }
    }

    #[test]
    fn decode_failure_is_recorded_per_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), r#"{"version": "gapi", "outputs": 3}"#).unwrap();
        fs::write(dir.path().join("b.yaml"), SCHEMA).unwrap();

        let report = generator(&dir).run().unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[0].status, FileStatus::Failed);
        assert_eq!(report.files[0].failures[0].kind, ErrorKind::Decode);
        assert_eq!(report.files[1].status, FileStatus::Ok);
    }

    #[test]
    fn invalid_schema_produces_no_output() {
        let dir = TempDir::new().unwrap();
        let broken = SCHEMA.replace("type: User", "type: Ghost");
        fs::write(dir.path().join("api.yaml"), broken).unwrap();

        let report = generator(&dir).run().unwrap();

        let file = &report.files[0];
        assert_eq!(file.status, FileStatus::Failed);
        assert!(file.failures.iter().all(|f| f.kind == ErrorKind::Validation));
        assert!(!dir.path().join("gen").exists());
    }

    #[test]
    fn dry_run_keeps_content_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("api.yaml"), SCHEMA).unwrap();

        let report = generator(&dir)
            .with_options(GenerateOptions::new().dry_run(true))
            .run()
            .unwrap();

        assert!(report.dry_run);
        let outputs: Vec<_> = report.produced().collect();
        assert_eq!(outputs.len(), 2);
        assert!(outputs.iter().all(|o| o.content.is_some()));
        assert!(!dir.path().join("gen").exists());
    }

    #[test]
    fn cancelled_run_skips_every_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("api.yaml"), SCHEMA).unwrap();

        let generator = generator(&dir);
        generator.cancellation_token().cancel();
        let report = generator.run().unwrap();

        assert_eq!(report.summary.skipped, 1);
        assert_eq!(report.files[0].status, FileStatus::Skipped);
        assert!(!dir.path().join("gen").exists());
    }

    #[test]
    fn parallel_run_reports_in_scan_order() {
        let dir = TempDir::new().unwrap();
        for name in ["c", "a", "d", "b"] {
            let schema = SCHEMA.replace("$project/gen/", &format!("$project/gen/{name}/"));
            fs::write(dir.path().join(format!("{name}.yaml")), schema).unwrap();
        }

        let report = generator(&dir)
            .with_options(GenerateOptions::new().jobs(3))
            .run()
            .unwrap();

        let names: Vec<_> = report
            .files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.yaml", "b.yaml", "c.yaml", "d.yaml"]);
        assert_eq!(report.summary.outputs, 8);
    }

    #[test]
    fn missing_project_root_aborts() {
        let dir = TempDir::new().unwrap();
        let generator = Generator::new(BuilderRegistry::with_defaults(), dir.path().join("absent"));

        assert!(matches!(generator.run(), Err(DiscoveryError::RootNotFound(_))));
    }

    #[test]
    fn report_serializes_kinds_in_lowercase() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), "{\"version\": \"gapi\"}").unwrap();

        let report = generator(&dir).run().unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["files"][0]["status"], "failed");
        assert_eq!(json["files"][0]["failures"][0]["kind"], "decode");
        assert_eq!(json["summary"]["failures"], 1);
    }
}
