//! Output formatting module for CLI display
//!
//! Keeps presentation apart from extraction: every function here takes
//! already-built counts and returns a string.

use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

use crate::models::{Chamber, ChamberCount, Snapshot};

/// One-line human summary of a chamber, e.g. "House: 213 D, 218 R, 1 I, 3 vacant of 435"
pub fn format_chamber_line(chamber: Chamber, count: &ChamberCount) -> String {
    let mut line = format!(
        "{}: {} D, {} R, {} I",
        chamber.display_name(),
        count.democratic,
        count.republican,
        count.independent
    );
    if let Some(vacancies) = count.vacancies {
        line.push_str(&format!(", {} vacant", vacancies));
    }
    line.push_str(&format!(" of {}", count.total_seats));
    if count.degraded {
        line.push_str(" (degraded: occurrence count)");
    }
    line
}

/// Confirmation printed after an update
pub fn format_update_summary(snapshot: &Snapshot, written_to: Option<&Path>) -> String {
    let mut output = match written_to {
        Some(path) => format!(
            "{} Updated {} ({})\n",
            "✓".green().bold(),
            path.display(),
            snapshot.updated_at
        ),
        None => format!(
            "{} Dry run - snapshot for {} not written\n",
            "ℹ".blue().bold(),
            snapshot.updated_at
        ),
    };
    for chamber in Chamber::ALL {
        output.push_str(&format!(
            "  {}\n",
            format_chamber_line(chamber, snapshot.chamber(chamber))
        ));
    }
    output
}

#[derive(Tabled)]
struct ChamberRow {
    #[tabled(rename = "Chamber")]
    chamber: String,
    #[tabled(rename = "Dem")]
    dem: u32,
    #[tabled(rename = "Rep")]
    rep: u32,
    #[tabled(rename = "Ind")]
    ind: u32,
    #[tabled(rename = "Vacant")]
    vacant: String,
    #[tabled(rename = "Total")]
    total: u32,
    #[tabled(rename = "Check")]
    check: String,
}

fn chamber_row(chamber: Chamber, count: &ChamberCount) -> ChamberRow {
    let check = match count.check_total(chamber) {
        None if count.degraded => "degraded".yellow().to_string(),
        None => "ok".green().to_string(),
        Some(w) => format!("{}/{}", w.actual, w.expected).yellow().to_string(),
    };
    ChamberRow {
        chamber: chamber.display_name().to_string(),
        dem: count.democratic,
        rep: count.republican,
        ind: count.independent,
        vacant: count
            .vacancies
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string()),
        total: count.total_seats,
        check,
    }
}

fn render(rows: Vec<ChamberRow>) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..6)).with(Alignment::right()))
        .to_string()
}

/// Table of a single extraction result
pub fn format_count_table(chamber: Chamber, count: &ChamberCount) -> String {
    render(vec![chamber_row(chamber, count)])
}

/// Table of a stored snapshot with its provenance
pub fn format_snapshot_table(snapshot: &Snapshot) -> String {
    let mut output = format!(
        "\n{} Party division as of {}\n\n",
        "🏛".cyan().bold(),
        snapshot.updated_at
    );
    output.push_str(&render(
        Chamber::ALL
            .iter()
            .map(|c| chamber_row(*c, snapshot.chamber(*c)))
            .collect(),
    ));
    output.push('\n');
    for chamber in Chamber::ALL {
        output.push_str(&format!(
            "  {} source: {}\n",
            chamber.display_name(),
            snapshot.source(chamber)
        ));
    }
    output
}

/// JSON for `extract --json`
pub fn format_count_json(chamber: Chamber, count: &ChamberCount) -> String {
    #[derive(Serialize)]
    struct JsonExtraction<'a> {
        chamber: Chamber,
        counts: &'a ChamberCount,
        consistent: bool,
    }

    let json = JsonExtraction {
        chamber,
        counts: count,
        consistent: count.check_total(chamber).is_none(),
    };
    serde_json::to_string_pretty(&json)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}
