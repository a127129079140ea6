use anyhow::{Context, Result};
use autoremove::{AppConfig, Cli, Commands, RunArgs, Task, init_tracing};
use clap::Parser;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_format, cli.debug);

    let result = match cli.command {
        Commands::Run(args) => run_once(&args),
        Commands::Daemon { run, interval } => run_daemon(&run, interval),
    };

    if let Err(e) = result {
        tracing::error!("Error: {e:#}");
        process::exit(1);
    }
}

/// Loads the configuration and runs the selected tasks. A failing task is
/// logged and does not stop the others.
fn run_once(args: &RunArgs) -> Result<()> {
    tracing::info!("Loading configuration from: {}", args.config.display());
    let config = AppConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    let selected = config.select(&args.tasks)?;
    tracing::info!(
        "Configuration loaded: {} task(s) selected{}",
        selected.len(),
        if args.view { " (view mode)" } else { "" }
    );

    let mut failed = 0;
    for (name, task_config) in selected {
        let outcome = Task::new(name, task_config.clone(), !args.view)
            .map_err(anyhow::Error::from)
            .and_then(|mut task| task.run().map_err(anyhow::Error::from));

        match outcome {
            Ok(report) => {
                let removed = report
                    .removal
                    .as_ref()
                    .map_or(0, |removal| removal.removed.len());
                tracing::info!(
                    "Task '{name}' finished: {} torrent(s), {} selected for removal, {removed} removed",
                    report.total,
                    report.remove.len()
                );
            }
            Err(e) => {
                failed += 1;
                tracing::error!("Task '{name}' failed: {e:#}");
            }
        }
    }

    if failed > 0 {
        tracing::warn!("{failed} task(s) failed");
    }
    Ok(())
}

fn run_daemon(args: &RunArgs, interval: u64) -> Result<()> {
    tracing::info!(
        "Starting daemon mode (interval: {}s, config: {})",
        interval,
        args.config.display()
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received interrupt signal, shutting down gracefully...");
        r.store(false, Ordering::SeqCst);
    }) {
        tracing::warn!("Failed to set Ctrl-C handler: {e}");
    }

    let mut run_number = 1;

    while running.load(Ordering::SeqCst) {
        tracing::info!("===== Daemon run #{run_number} =====");

        if let Err(e) = run_once(args) {
            // Keep running; the configuration may be fixed before the next run
            tracing::error!("Run failed: {e:#}");
        }

        if !running.load(Ordering::SeqCst) {
            break;
        }

        tracing::info!("Sleeping for {interval} seconds until next run...");

        // Sleep in smaller chunks to allow quick shutdown
        for _ in 0..interval {
            if !running.load(Ordering::SeqCst) {
                break;
            }
            std::thread::sleep(Duration::from_secs(1));
        }

        run_number += 1;
    }

    tracing::info!("Daemon stopped gracefully");
    Ok(())
}
