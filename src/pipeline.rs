//! Fetch → extract → write
//!
//! [`build_snapshot`] is pure: page text and a date in, snapshot out. Network
//! and filesystem access live in [`fetch_pages`] and [`run_update`].

use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{CongressError, ConsistencyWarning, FetchError};
use crate::models::{Chamber, Snapshot, Sources};
use crate::scraping::PageSource;
use crate::snapshot;

/// Raw text of both chamber pages
#[derive(Debug, Clone)]
pub struct Pages {
    pub house: String,
    pub senate: String,
}

/// A built snapshot plus any non-fatal data-quality findings
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub snapshot: Snapshot,
    pub warnings: Vec<ConsistencyWarning>,
    /// Where the snapshot was written; `None` on a dry run
    pub written_to: Option<PathBuf>,
}

/// Fetch both chamber pages concurrently
pub async fn fetch_pages<S: PageSource + ?Sized>(
    source: &S,
    config: &Config,
) -> Result<Pages, FetchError> {
    let (house, senate) = tokio::try_join!(
        source.fetch_page(&config.house.url),
        source.fetch_page(&config.senate.url),
    )?;
    Ok(Pages { house, senate })
}

/// Extract both chambers and assemble the snapshot
pub fn build_snapshot(
    config: &Config,
    pages: &Pages,
    today: NaiveDate,
) -> Result<(Snapshot, Vec<ConsistencyWarning>), CongressError> {
    let lower_chamber = config.house.rules.extract(Chamber::House, &pages.house)?;
    let upper_chamber = config.senate.rules.extract(Chamber::Senate, &pages.senate)?;

    let snapshot = Snapshot {
        updated_at: today,
        lower_chamber,
        upper_chamber,
        sources: Sources {
            house: config.house.url.clone(),
            senate: config.senate.url.clone(),
        },
    };

    let warnings = snapshot.consistency_warnings();
    for warning in &warnings {
        warn!("Consistency check failed: {}", warning);
    }
    if config.strict_totals {
        if let Some(first) = warnings.first() {
            return Err(CongressError::Inconsistent(first.clone()));
        }
    }

    Ok((snapshot, warnings))
}

/// Run one full update. Nothing is written unless every stage succeeds.
pub async fn run_update<S: PageSource + ?Sized>(
    source: &S,
    config: &Config,
    today: NaiveDate,
    dry_run: bool,
) -> Result<UpdateOutcome, CongressError> {
    info!(
        house = %config.house.url,
        senate = %config.senate.url,
        "Fetching chamber pages"
    );
    let pages = fetch_pages(source, config).await?;
    let (snapshot, warnings) = build_snapshot(config, &pages, today)?;

    let written_to = if dry_run {
        info!("Dry run, not writing {}", config.output.display());
        None
    } else {
        snapshot::write_snapshot(&config.output, &snapshot)?;
        Some(config.output.clone())
    };

    Ok(UpdateOutcome {
        snapshot,
        warnings,
        written_to,
    })
}
