//! Build command handlers
//!
//! Handles submitting builds, looking them up, cancelling them and following
//! them until they finish.

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use colored::*;
use rpmb_core::domain::{BuildId, BuildJob, BuildPhase, BuildRequest, BuildSource, SourceFile};
use rpmb_orchestrator::{BuildPoller, BuildService, Config, PollOutcome};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Build subcommands
#[derive(Subcommand)]
pub enum BuildCommands {
    /// Submit a new build
    Submit {
        /// Package name
        name: String,

        /// Package version
        version: String,

        /// Package description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Source file to upload (repeatable)
        #[arg(short, long = "file", conflicts_with = "git_repo")]
        files: Vec<PathBuf>,

        /// Git repository to build from instead of uploaded files
        #[arg(long)]
        git_repo: Option<String>,

        /// Git branch (default: main)
        #[arg(long, requires = "git_repo")]
        git_branch: Option<String>,

        /// Target OS identifier or image reference
        #[arg(long, default_value = "rhivos")]
        target_os: String,

        /// Target architecture
        #[arg(long, default_value = "aarch64")]
        arch: String,

        /// Runtime dependency (repeatable)
        #[arg(long = "dependency")]
        dependencies: Vec<String>,

        /// Build flag passed to %build (repeatable)
        #[arg(long = "build-option", allow_hyphen_values = true)]
        build_options: Vec<String>,

        /// Custom spec file instead of the generated one
        #[arg(long)]
        spec_file: Option<PathBuf>,

        /// Follow the build until it finishes
        #[arg(short, long)]
        watch: bool,

        /// Print the documents that would be created and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// List builds
    List,
    /// Get build status
    Status {
        /// Build ID or pipeline run name
        id: String,
    },
    /// Follow a build until it finishes
    Watch {
        /// Build ID or pipeline run name
        id: String,
    },
    /// Cancel a running build
    Cancel {
        /// Build ID or pipeline run name
        id: String,
    },
    /// Show build logs
    Logs {
        /// Build ID or pipeline run name
        id: String,
    },
    /// Show the request a build was submitted with
    Request {
        /// Build ID or pipeline run name
        id: String,
    },
}

/// Handle build commands
///
/// Routes build subcommands to their respective handlers.
///
/// # Arguments
/// * `command` - The build command to execute
/// * `config` - The orchestrator configuration
/// * `namespace` - Namespace given on the command line, if any
pub async fn handle_build_command(
    command: BuildCommands,
    config: &Config,
    namespace: Option<&str>,
) -> Result<()> {
    let client = config
        .cluster_client()
        .context("Failed to create cluster client")?;
    let service = Arc::new(BuildService::new(Arc::new(client), config));

    match command {
        BuildCommands::Submit {
            name,
            version,
            description,
            files,
            git_repo,
            git_branch,
            target_os,
            arch,
            dependencies,
            build_options,
            spec_file,
            watch,
            dry_run,
        } => {
            let source = match git_repo {
                Some(repository) => BuildSource::Git {
                    repository,
                    branch: git_branch,
                },
                None => BuildSource::Upload {
                    files: read_source_files(&files)?,
                },
            };

            let spec_file = match spec_file {
                Some(path) => Some(
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read spec file: {}", path.display()))?,
                ),
                None => None,
            };

            let request = BuildRequest {
                name,
                version,
                description,
                source,
                target_os,
                architecture: arch,
                dependencies,
                build_options,
                spec_file,
            };

            if dry_run {
                return render_build(&service, &request, namespace);
            }

            let job = submit_build(&service, request, namespace).await?;
            if watch {
                watch_build(&service, config, &job.build_id, Some(&job.namespace)).await?;
            }
            Ok(())
        }
        BuildCommands::List => list_builds(&service, namespace).await,
        BuildCommands::Status { id } => get_build(&service, &BuildId::new(&id), namespace).await,
        BuildCommands::Watch { id } => {
            watch_build(&service, config, &BuildId::new(&id), namespace).await
        }
        BuildCommands::Cancel { id } => {
            cancel_build(&service, &BuildId::new(&id), namespace).await
        }
        BuildCommands::Logs { id } => get_build_logs(&service, &BuildId::new(&id), namespace).await,
        BuildCommands::Request { id } => {
            get_build_request(&service, &BuildId::new(&id), namespace).await
        }
    }
}

/// Read each file and encode it for upload
fn read_source_files(paths: &[PathBuf]) -> Result<Vec<SourceFile>> {
    paths
        .iter()
        .map(|path| {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read source file: {}", path.display()))?;
            Ok(SourceFile::from_bytes(file_name(path)?, &bytes))
        })
        .collect()
}

fn file_name(path: &Path) -> Result<String> {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => Ok(name.to_string()),
        None => bail!("Not a file name: {}", path.display()),
    }
}

/// Print the documents of a build without creating them
fn render_build(service: &BuildService, request: &BuildRequest, namespace: Option<&str>) -> Result<()> {
    let namespace = service.resolve_namespace(namespace)?;
    let build_id = BuildId::generate();

    let documents = service.render(&build_id, request, &namespace)?;

    println!("{}", serde_json::to_string_pretty(&documents)?);
    eprintln!(
        "{}",
        format!(
            "Dry run: {} document(s) for build {} in {} not created",
            documents.source_files.len() + 2,
            build_id,
            namespace
        )
        .dimmed()
    );

    Ok(())
}

async fn submit_build(
    service: &BuildService,
    request: BuildRequest,
    namespace: Option<&str>,
) -> Result<BuildJob> {
    let job = service.submit(request, namespace).await?;

    println!("{}", "✓ Build submitted successfully!".green().bold());
    println!("  Build ID:  {}", job.build_id.to_string().cyan());
    println!("  Name:      {}", job.name);
    println!("  Namespace: {}", job.namespace);
    println!("  Status:    {}", colorize_phase(job.phase()));

    Ok(job)
}

async fn list_builds(service: &BuildService, namespace: Option<&str>) -> Result<()> {
    let jobs = service.list(namespace).await?;

    if jobs.is_empty() {
        println!("{}", "No builds found.".yellow());
    } else {
        println!("{}", format!("Found {} build(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_build_summary(&job);
        }
    }

    Ok(())
}

async fn get_build(service: &BuildService, id: &BuildId, namespace: Option<&str>) -> Result<()> {
    let job = service.status(id, namespace).await?;

    print_build_details(&job);

    Ok(())
}

/// Poll a build until it finishes or the user presses Ctrl+C
async fn watch_build(
    service: &Arc<BuildService>,
    config: &Config,
    id: &BuildId,
    namespace: Option<&str>,
) -> Result<()> {
    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    println!("{}", format!("Watching build {} (Ctrl+C to stop)...", id).dimmed());

    let poller = BuildPoller::from_config(Arc::clone(service), config);
    let mut last_phase = None;
    let outcome = poller
        .run(id, namespace, &token, |job| {
            if last_phase != Some(job.phase()) {
                last_phase = Some(job.phase());
                println!("  {} {}", "▸".cyan(), colorize_phase(job.phase()));
            }
        })
        .await?;
    token.cancel();

    match outcome {
        PollOutcome::Finished(job) => {
            println!();
            print_build_details(&job);
            if job.phase() == BuildPhase::Failed {
                bail!("Build {} failed", job.build_id);
            }
        }
        PollOutcome::Cancelled => {
            println!("{}", "Stopped watching; the build keeps running.".yellow());
        }
    }

    Ok(())
}

async fn cancel_build(service: &BuildService, id: &BuildId, namespace: Option<&str>) -> Result<()> {
    let job = service.cancel(id, namespace).await?;

    println!("{}", "✓ Build cancellation requested!".green().bold());
    println!("  Build ID: {}", job.build_id.to_string().cyan());

    Ok(())
}

async fn get_build_logs(service: &BuildService, id: &BuildId, namespace: Option<&str>) -> Result<()> {
    let logs = service.logs(id, namespace).await?;

    println!("{}", format!("Logs for build {}:", id).bold());
    println!("{}", "─".repeat(80).dimmed());
    print!("{}", logs);
    if !logs.ends_with('\n') {
        println!();
    }
    println!("{}", "─".repeat(80).dimmed());

    Ok(())
}

async fn get_build_request(
    service: &BuildService,
    id: &BuildId,
    namespace: Option<&str>,
) -> Result<()> {
    let request = service.request(id, namespace).await?;

    println!("{}", serde_json::to_string_pretty(&request)?);

    Ok(())
}

/// Print a one-build summary for listings
fn print_build_summary(job: &BuildJob) {
    println!(
        "  {} {} {}",
        "▸".cyan(),
        job.package_name.bold(),
        job.build_id.to_string().dimmed()
    );
    println!("    Status:  {}", colorize_phase(job.phase()));
    println!("    Target:  {} / {}", job.target_os, job.architecture);
    if let Some(started) = job.status.start_time {
        println!(
            "    Started: {}",
            started.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
    }
    println!();
}

/// Print detailed build information
fn print_build_details(job: &BuildJob) {
    println!("{}", "Build Details:".bold());
    println!("  Build ID:     {}", job.build_id.to_string().cyan());
    println!("  Pipeline run: {}", job.name);
    println!("  Namespace:    {}", job.namespace);
    println!("  Package:      {}", job.package_name);
    println!("  Target OS:    {}", job.target_os);
    println!("  Architecture: {}", job.architecture);
    println!("  Status:       {}", colorize_phase(job.phase()));

    if let Some(started) = job.status.start_time {
        println!("  Started:      {}", started.format("%Y-%m-%d %H:%M:%S"));
    }

    if let Some(completed) = job.status.completion_time {
        println!("  Completed:    {}", completed.format("%Y-%m-%d %H:%M:%S"));

        if let Some(started) = job.status.start_time {
            let duration = completed.signed_duration_since(started);
            println!("  Duration:     {}s", duration.num_seconds());
        }
    }
}

/// Colorize build phase for display
fn colorize_phase(phase: BuildPhase) -> ColoredString {
    match phase {
        BuildPhase::Pending => phase.as_str().yellow(),
        BuildPhase::Running => phase.as_str().cyan(),
        BuildPhase::Succeeded => phase.as_str().green(),
        BuildPhase::Failed => phase.as_str().red(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_path() {
        assert_eq!(
            file_name(Path::new("/tmp/src/demo-1.0.tar.gz")).unwrap(),
            "demo-1.0.tar.gz"
        );
        assert!(file_name(Path::new("/")).is_err());
    }

    #[test]
    fn test_read_missing_source_file() {
        let err = read_source_files(&[PathBuf::from("/nonexistent/rpmb/a.txt")]).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rpmb/a.txt"));
    }
}
