//! gapi CLI - generate server and client stubs from gapi schema files

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use gapi_lib::{
    BuilderRegistry, ConfigError, DiscoveryError, GenerateOptions, Generator, ReportStrategy,
    RootConfig, RunReport,
};
use thiserror::Error;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gapi", version)]
#[command(about = "Generate typed server and client stubs from gapi schema files", long_about = None)]
struct Cli {
    /// Root config file, or a directory containing .gapi.json/.gapi.yaml/.gapi.yml
    /// [default: current directory]
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Project root to scan, overriding the config's `project`
    #[arg(long, value_name = "DIR")]
    project: Option<PathBuf>,

    /// Number of schema files processed in parallel
    #[arg(short, long, value_name = "N", default_value_t = 1)]
    jobs: usize,

    /// Build every output but write nothing; print the generated files instead
    #[arg(long)]
    dry_run: bool,

    /// How failures are reported: aggregate or per-file
    #[arg(long, value_name = "STRATEGY", default_value = "aggregate")]
    report: ReportStrategy,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    log_verbosity: u8,

    /// Output logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Initialize tracing subscriber based on verbosity and output format
fn init_tracing(verbose: u8, json: bool) {
    let base_filter = match env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,gapi_lib=info".to_string(),
            2 => "info,gapi_lib=debug".to_string(),
            _ => "debug,gapi_lib=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_file(verbose >= 3)
                    .with_line_number(verbose >= 3)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    }
}

/// Determines the project root from `--project` and the root config.
///
/// An explicit `--project` makes the root config optional.
fn resolve_project(cli: &Cli) -> Result<PathBuf, ConfigError> {
    let cwd = env::current_dir().map_err(ConfigError::CurrentDir)?;

    if let Some(project) = &cli.project {
        return Ok(cwd.join(project));
    }

    let config = match &cli.config {
        Some(path) if path.is_file() => RootConfig::load(path)?,
        Some(dir) => RootConfig::discover(&cwd.join(dir))?,
        None => RootConfig::discover(&cwd)?,
    };
    if let Some(listen) = &config.listen {
        tracing::debug!(listen = %listen, "root config listen address");
    }
    Ok(config.project)
}

fn print_dry_run(report: &RunReport) {
    for output in report.produced() {
        if let (Some(path), Some(content)) = (&output.path, &output.content) {
            println!("=== {} ===", path.display());
            print!("{content}");
            println!();
        }
        for companion in &output.companions {
            if let Some(content) = &companion.content {
                println!("=== {} ===", companion.path.display());
                print!("{content}");
                println!();
            }
        }
    }
}

fn print_summary(report: &RunReport, project: &Path) {
    for file in &report.files {
        let path = file.path.strip_prefix(project).unwrap_or(&file.path);
        for failure in &file.failures {
            eprintln!("error: {}: [{}] {}", path.display(), failure.kind, failure.message);
        }
        for output in &file.outputs {
            if let Some(failure) = &output.error {
                eprintln!(
                    "error: {}: outputs[{}] ({} {}): [{}] {}",
                    path.display(),
                    output.index,
                    output.language,
                    output.kind,
                    failure.kind,
                    failure.message
                );
            }
        }
    }

    let summary = report.summary;
    let verb = if report.dry_run { "built" } else { "generated" };
    println!(
        "{verb} {} output(s) from {} schema file(s), {} failure(s)",
        summary.outputs, summary.files, summary.failures
    );
    if summary.skipped > 0 {
        println!("{} schema file(s) skipped", summary.skipped);
    }
}

fn run(cli: &Cli) -> Result<RunReport, CliError> {
    let project = resolve_project(cli)?;

    let options = GenerateOptions::new()
        .jobs(cli.jobs)
        .dry_run(cli.dry_run)
        .report(cli.report);
    let report = Generator::new(BuilderRegistry::with_defaults(), project.clone())
        .with_options(options)
        .run()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if cli.dry_run {
            print_dry_run(&report);
        }
        print_summary(&report, &project);
    }

    Ok(report)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_verbosity, cli.log_json);

    match run(&cli) {
        Ok(report) if report.has_failures() => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_all_flags() {
        let cli = Cli::try_parse_from([
            "gapi",
            "conf/.gapi.yaml",
            "--project",
            "app",
            "-j",
            "4",
            "--dry-run",
            "--report",
            "per-file",
            "--json",
            "-vv",
            "--log-json",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("conf/.gapi.yaml")));
        assert_eq!(cli.project, Some(PathBuf::from("app")));
        assert_eq!(cli.jobs, 4);
        assert!(cli.dry_run);
        assert_eq!(cli.report, ReportStrategy::PerFile);
        assert!(cli.json);
        assert_eq!(cli.log_verbosity, 2);
        assert!(cli.log_json);
    }

    #[test]
    fn rejects_unknown_report_strategy() {
        assert!(Cli::try_parse_from(["gapi", "--report", "streaming"]).is_err());
    }
}
