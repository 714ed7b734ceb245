//! Pipeline tests against in-memory page sources
//!
//! These tests verify end-to-end behavior without network access:
//! - Extraction of both chambers from fixture pages
//! - Snapshot round-trip through the writer
//! - Fetch and parse failures leave the previous snapshot untouched
//! - Both pages are fetched concurrently

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use congress_control::config::Config;
use congress_control::error::{CongressError, FetchError, ParseError};
use congress_control::models::{Category, Chamber, ChamberCount};
use congress_control::pipeline::{fetch_pages, run_update};
use congress_control::scraping::{LabelRule, PageSource, RuleSet, Strategy};
use congress_control::snapshot::{read_snapshot, to_json};
use tempfile::TempDir;
use tokio::sync::Barrier;

const HOUSE_URL: &str = "https://clerk.example.test/";
const SENATE_URL: &str = "https://senate.example.test/senators/";

/// Serves canned responses keyed by URL; anything else is a 404
struct StaticSource {
    pages: HashMap<String, Result<String, u16>>,
}

impl StaticSource {
    fn new(house: Result<&str, u16>, senate: Result<&str, u16>) -> Self {
        let mut pages = HashMap::new();
        pages.insert(HOUSE_URL.to_string(), house.map(str::to_string));
        pages.insert(SENATE_URL.to_string(), senate.map(str::to_string));
        Self { pages }
    }
}

#[async_trait]
impl PageSource for StaticSource {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        match self.pages.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(Path::new("tests/fixtures").join(name))
        .expect("failed to read fixture")
}

fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.house.url = HOUSE_URL.to_string();
    config.senate.url = SENATE_URL.to_string();
    config.output = dir.path().join("congress-control.json");
    config
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

const HOUSE_TEXT: &str = "Republicans 218\nDemocrats 213\nIndependents 1\nVacancies 3";
const SENATE_TEXT: &str = "Majority Party: Republicans (53 seats)\n\
                           Minority Party: Democrats (45 seats)\n\
                           Other Parties: Independents (2 seats)";

#[tokio::test]
async fn test_end_to_end_scenario() -> Result<()> {
    let dir = TempDir::new()?;
    let config = test_config(&dir);
    let source = StaticSource::new(Ok(HOUSE_TEXT), Ok(SENATE_TEXT));

    let outcome = run_update(&source, &config, today(), false).await?;

    let house = &outcome.snapshot.lower_chamber;
    assert_eq!(
        *house,
        ChamberCount {
            democratic: 213,
            republican: 218,
            independent: 1,
            vacancies: Some(3),
            total_seats: 435,
            degraded: false,
        }
    );
    assert_eq!(
        house.democratic + house.republican + house.independent + house.vacancies.unwrap(),
        435
    );
    assert_eq!(
        outcome.snapshot.upper_chamber,
        ChamberCount {
            democratic: 45,
            republican: 53,
            independent: 2,
            vacancies: None,
            total_seats: 100,
            degraded: false,
        }
    );
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.written_to.as_deref(), Some(config.output.as_path()));

    // Round-trip through the file
    assert_eq!(read_snapshot(&config.output)?, outcome.snapshot);

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&config.output)?)?;
    assert_eq!(json["updated_at"], "2024-06-01");
    assert_eq!(json["house"]["vacancies"], 3);
    assert!(json["senate"].get("vacancies").is_none());
    assert_eq!(json["sources"]["house"], HOUSE_URL);
    assert_eq!(json["sources"]["senate"], SENATE_URL);
    Ok(())
}

#[tokio::test]
async fn test_html_fixtures_extract_like_plain_text() -> Result<()> {
    let dir = TempDir::new()?;
    let config = test_config(&dir);
    let house = fixture("house_clerk.html");
    let senate = fixture("senate_party_division.html");
    let source = StaticSource::new(Ok(&house), Ok(&senate));

    let from_html = run_update(&source, &config, today(), true).await?;
    let plain = StaticSource::new(Ok(HOUSE_TEXT), Ok(SENATE_TEXT));
    let from_text = run_update(&plain, &config, today(), true).await?;

    assert_eq!(from_html.snapshot, from_text.snapshot);
    Ok(())
}

#[tokio::test]
async fn test_fetch_failure_writes_nothing() -> Result<()> {
    let dir = TempDir::new()?;
    let config = test_config(&dir);
    let source = StaticSource::new(Err(503), Ok(SENATE_TEXT));

    let err = run_update(&source, &config, today(), false)
        .await
        .unwrap_err();
    match &err {
        CongressError::Fetch(FetchError::Status { url, status }) => {
            assert_eq!(url, HOUSE_URL);
            assert_eq!(*status, 503);
        }
        other => panic!("expected fetch error, got {:?}", other),
    }
    assert!(err.to_string().contains(HOUSE_URL));
    assert!(err.to_string().contains("503"));
    assert!(!config.output.exists());
    Ok(())
}

#[tokio::test]
async fn test_failures_keep_previous_snapshot() -> Result<()> {
    let dir = TempDir::new()?;
    let config = test_config(&dir);

    let good = StaticSource::new(Ok(HOUSE_TEXT), Ok(SENATE_TEXT));
    let first = run_update(&good, &config, today(), false).await?;
    let before = std::fs::read_to_string(&config.output)?;
    assert_eq!(before, to_json(&first.snapshot)?);

    let later = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();

    let unavailable = StaticSource::new(Ok(HOUSE_TEXT), Err(500));
    assert!(run_update(&unavailable, &config, later, false).await.is_err());
    assert_eq!(std::fs::read_to_string(&config.output)?, before);

    let redesigned = StaticSource::new(Ok(HOUSE_TEXT), Ok("Party Division: see table"));
    let err = run_update(&redesigned, &config, later, false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CongressError::Parse(ParseError::MissingLabel {
            chamber: Chamber::Senate,
            ..
        })
    ));
    assert_eq!(std::fs::read_to_string(&config.output)?, before);
    Ok(())
}

#[tokio::test]
async fn test_dry_run_does_not_write() -> Result<()> {
    let dir = TempDir::new()?;
    let config = test_config(&dir);
    let source = StaticSource::new(Ok(HOUSE_TEXT), Ok(SENATE_TEXT));

    let outcome = run_update(&source, &config, today(), true).await?;
    assert!(outcome.written_to.is_none());
    assert!(!config.output.exists());
    Ok(())
}

#[tokio::test]
async fn test_occurrence_count_fallback_is_flagged() -> Result<()> {
    let dir = TempDir::new()?;
    let mut config = test_config(&dir);
    config.senate.rules = RuleSet {
        strategy: Strategy::OccurrenceCount,
        total_seats: 100,
        strip_markup: true,
        labels: vec![
            LabelRule::required(Category::Democratic, "Democrat"),
            LabelRule::required(Category::Republican, "Republican"),
            LabelRule::optional(Category::Independent, "Independent"),
        ],
    };
    let roster = fixture("senate_roster.html");
    let source = StaticSource::new(Ok(HOUSE_TEXT), Ok(&roster));

    let outcome = run_update(&source, &config, today(), false).await?;
    let senate = &outcome.snapshot.upper_chamber;
    assert!(senate.degraded);
    assert!(senate.democratic >= 2);
    assert!(senate.republican >= 2);
    assert!(senate.independent >= 1);
    // A handful of mentions cannot account for a 100-seat chamber
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].chamber, Chamber::Senate);

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&config.output)?)?;
    assert_eq!(json["senate"]["degraded"], true);
    assert!(json["house"].get("degraded").is_none());
    Ok(())
}

/// Each fetch blocks until the other has started; a sequential fetch would never finish
struct RendezvousSource {
    barrier: Arc<Barrier>,
}

#[async_trait]
impl PageSource for RendezvousSource {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self.barrier.wait().await;
        Ok(format!("page for {}", url))
    }
}

#[tokio::test]
async fn test_pages_are_fetched_concurrently() -> Result<()> {
    let dir = TempDir::new()?;
    let config = test_config(&dir);
    let source = RendezvousSource {
        barrier: Arc::new(Barrier::new(2)),
    };

    let pages = tokio::time::timeout(Duration::from_secs(5), fetch_pages(&source, &config))
        .await
        .expect("fetches did not overlap")?;
    assert_eq!(pages.house, format!("page for {}", HOUSE_URL));
    assert_eq!(pages.senate, format!("page for {}", SENATE_URL));
    Ok(())
}
