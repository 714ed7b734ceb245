use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};

use congress_control::cli::{formatters, Cli, Commands, UpdateArgs};
use congress_control::config::{Config, Overrides};
use congress_control::error::CongressError;
use congress_control::models::Chamber;
use congress_control::scraping::HttpFetcher;
use congress_control::{pipeline, snapshot};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output only
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config_path = cli.config.clone();
    match cli
        .command
        .unwrap_or_else(|| Commands::Update(UpdateArgs::default()))
    {
        Commands::Update(args) => handle_update(config_path.as_deref(), args, cli.json).await,
        Commands::Extract { chamber, file } => {
            handle_extract(config_path.as_deref(), chamber, &file, cli.json)
        }
        Commands::Show { output } => handle_show(config_path.as_deref(), output, cli.json),
    }
}

/// Fetch, extract and write the snapshot
async fn handle_update(config_path: Option<&Path>, args: UpdateArgs, json: bool) -> Result<()> {
    let overrides = Overrides {
        house_url: args.house_url,
        senate_url: args.senate_url,
        output: args.output,
        timeout_secs: args.timeout,
        strict_totals: args.strict,
    };
    let config = Config::load(config_path, &overrides).context("failed to load configuration")?;

    let fetcher = HttpFetcher::new(&config.fetch_options()).map_err(CongressError::Client)?;
    let today = Utc::now().date_naive();
    let outcome = pipeline::run_update(&fetcher, &config, today, args.dry_run)
        .await
        .context("update failed, previous snapshot left untouched")?;

    let snap = &outcome.snapshot;
    info!(
        "{}; {}",
        formatters::format_chamber_line(Chamber::House, &snap.lower_chamber),
        formatters::format_chamber_line(Chamber::Senate, &snap.upper_chamber)
    );
    if !outcome.warnings.is_empty() {
        let action = if outcome.written_to.is_some() {
            "written"
        } else {
            "built (dry run, not written)"
        };
        warn!(
            "Snapshot {} with {} consistency warning(s)",
            action,
            outcome.warnings.len()
        );
    }

    if json {
        print!("{}", snapshot::to_json(snap)?);
    } else {
        print!(
            "{}",
            formatters::format_update_summary(snap, outcome.written_to.as_deref())
        );
        if args.dry_run {
            print!("{}", snapshot::to_json(snap)?);
        }
    }
    Ok(())
}

/// Apply one chamber's rule-set to a saved page
fn handle_extract(
    config_path: Option<&Path>,
    chamber: Chamber,
    file: &Path,
    json: bool,
) -> Result<()> {
    let config = Config::load(config_path, &Overrides::default())
        .context("failed to load configuration")?;
    let page = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read page {}", file.display()))?;

    let count = config.chamber(chamber).rules.extract(chamber, &page)?;
    if let Some(warning) = count.check_total(chamber) {
        warn!("Consistency check failed: {}", warning);
    }

    if json {
        println!("{}", formatters::format_count_json(chamber, &count));
    } else {
        println!("{}", formatters::format_count_table(chamber, &count));
    }
    Ok(())
}

/// Print the stored snapshot
fn handle_show(config_path: Option<&Path>, output: Option<PathBuf>, json: bool) -> Result<()> {
    let path = match output {
        Some(path) => path,
        None => {
            Config::load(config_path, &Overrides::default())
                .context("failed to load configuration")?
                .output
        }
    };
    let snap = snapshot::read_snapshot(&path)?;
    for warning in snap.consistency_warnings() {
        warn!("Consistency check failed: {}", warning);
    }

    if json {
        print!("{}", snapshot::to_json(&snap)?);
    } else {
        print!("{}", formatters::format_snapshot_table(&snap));
    }
    Ok(())
}
