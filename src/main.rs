mod cli;

use relayforge::{
    config,
    service::{JobService, JobStatusReport},
    worker::JobWorkerPool,
};
use relayforge_common::JobStatus;
use relayforge_db::JobSnapshot;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "relayforge=trace,relayforge_av=trace,relayforge_db=debug,relayforge_common=debug"
                .to_string()
        } else {
            "relayforge=info,relayforge_av=info,relayforge_db=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Submit {
            source,
            spec,
            detach,
        } => submit(&source, &spec, detach, cli.config.as_deref()),
        Commands::Status { id, json } => status(&id, json, cli.config.as_deref()),
        Commands::List {
            status,
            limit,
            json,
        } => list(status.as_deref(), limit, json, cli.config.as_deref()),
        Commands::Worker { workers } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_workers(workers, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("relayforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn pipeline_service(config_path: Option<&Path>) -> Result<(config::Config, JobService)> {
    let config = config::load_config_or_default(config_path)?;
    config::validate_config(&config)?;
    let service = JobService::from_config(&config)?;
    Ok((config, service))
}

fn ledger_service(config_path: Option<&Path>) -> Result<JobService> {
    let config = config::load_config_or_default(config_path)?;
    JobService::from_config(&config)
}

fn submit(source: &str, spec: &str, detach: bool, config_path: Option<&Path>) -> Result<()> {
    let (_, service) = pipeline_service(config_path)?;

    if detach {
        let id = service.submit_job(source, spec)?;
        println!("{}", id);
        return Ok(());
    }

    let id = service.create_new_job(source, spec)?;
    match service.get_job_status(&id.to_string())? {
        Some(report) => {
            print_report(&report);
            if report.job.status != JobStatus::Completed {
                std::process::exit(1);
            }
        }
        None => anyhow::bail!("Job {} vanished from the ledger", id),
    }
    Ok(())
}

fn status(id: &str, json: bool, config_path: Option<&Path>) -> Result<()> {
    let service = ledger_service(config_path)?;

    let Some(report) = service.get_job_status(id)? else {
        anyhow::bail!("Job not found: {}", id);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn list(status: Option<&str>, limit: usize, json: bool, config_path: Option<&Path>) -> Result<()> {
    let status = status
        .map(|s| s.parse::<JobStatus>())
        .transpose()
        .map_err(anyhow::Error::msg)?;

    let service = ledger_service(config_path)?;
    let jobs = service.list_jobs(status, limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
        return Ok(());
    }

    if jobs.is_empty() {
        println!("No jobs found.");
        return Ok(());
    }
    for job in &jobs {
        print_row(job);
    }
    Ok(())
}

fn print_row(job: &JobSnapshot) {
    println!(
        "{}  {:<26} {:>5.1}%  {}",
        job.id, job.status, job.progress_percent, job.source_path
    );
}

fn print_report(report: &JobStatusReport) {
    let job = &report.job;
    println!("Job:      {}", job.id);
    println!("Status:   {}", job.status);
    println!("Progress: {:.1}%", job.progress_percent);
    println!("Source:   {}", job.source_path);
    println!("Output:   {}", job.output_path);
    println!("Spec:     {}", job.conversion_spec);
    println!(
        "Updated:  {} ({:.0}s ago)",
        job.last_updated.to_rfc3339(),
        report.elapsed_seconds
    );
    if let Some(ref notes) = job.notes {
        println!("Notes:    {}", notes);
    }
}

async fn run_workers(workers: Option<usize>, config_path: Option<&Path>) -> Result<()> {
    let (config, service) = pipeline_service(config_path)?;

    let pool = JobWorkerPool::new(
        service.orchestrator().clone(),
        workers.unwrap_or(config.pipeline.workers),
        Duration::from_secs(config.pipeline.poll_interval_secs),
    );
    let stop = pool.stop_signal();
    let handle = tokio::task::spawn_blocking(move || pool.run());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down, waiting for running jobs to finish...");
    stop.store(true, Ordering::Relaxed);

    handle.await?
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = relayforge_av::check_tools_at(
        config.tools.rsync_path.as_deref().unwrap_or(Path::new("rsync")),
        config.tools.ssh_path.as_deref().unwrap_or(Path::new("ssh")),
        config.tools.ffmpeg_path.as_deref().unwrap_or(Path::new("ffmpeg")),
    );
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Jobs will fail at the stage that needs them.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!(
                "  Remote: {}@{} (archive {})",
                config.remote.user, config.remote.host, config.remote.archive_dir
            );
            println!(
                "  SSH key: {}",
                config
                    .remote
                    .ssh_key_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "none".to_string())
            );
            println!("  Database: {}", config.paths.database.display());
            println!("  Temp dir: {}", config.paths.temp_dir.display());
            println!("  Output dir: {}", config.paths.output_dir.display());
            println!("  Workers: {}", config.pipeline.workers);
            println!(
                "  Spec validation: {}",
                if config.conversion.validate_spec { "on" } else { "off" }
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Database: {}", config.paths.database.display());
            println!("  Output extension: {}", config.pipeline.output_extension);
        }
    }

    Ok(())
}
