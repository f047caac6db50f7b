use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use workboard::cli::Cli;
use workboard::cmd::*;
use workboard::config::Config;
use workboard::db::JsonDirStorage;
use workboard::notify::LogNotifier;
use workboard::store::{Store, SystemClock};
use workboard::tui::run::run_dashboard;

fn init_tracing(default_filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or("off")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    init_tracing(config.log.as_deref());

    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return Ok(());
    }

    let data_dir = config.data_dir(cli.data_dir.as_deref());
    let storage = JsonDirStorage::open(&data_dir)
        .with_context(|| format!("opening data directory {}", data_dir.display()))?;
    let mut store = Store::open(storage, LogNotifier, SystemClock)
        .with_reminder_lead(chrono::Duration::minutes(config.reminder_lead_minutes));

    if store.needs_onboarding() && !matches!(cli.command, Commands::Onboard { .. } | Commands::User { .. }) {
        eprintln!("No current user yet. Run `wb onboard --name <NAME> --email <EMAIL>` to get started.");
    }

    match cli.command {
        Commands::Onboard {
            name, email, role, work_start, work_end, break_interval, theme, no_notifications,
        } => cmd_onboard(
            &mut store, name, email, role, work_start, work_end, break_interval, theme, no_notifications,
        ),
        Commands::User { action } => cmd_user(&mut store, action),
        Commands::Task { action } => cmd_task(&mut store, action),
        Commands::Project { action } => cmd_project(&mut store, action),
        Commands::Stats { json } => cmd_stats(&store, json),
        Commands::Dashboard => {
            run_dashboard(store, Duration::from_millis(config.search_debounce_ms))?;
            Ok(())
        }
        Commands::Completions { .. } => unreachable!("completions handled above"),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
