//! Extraction rule-sets for chamber pages
//!
//! A rule-set names one [`Strategy`] plus the labels to look for. Which
//! strategy a chamber uses is configuration, never guessed from the page:
//! when a source changes format the rule-set is edited, not the code.

use std::borrow::Cow;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::models::{Category, Chamber, ChamberCount};

static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style)\b.*?</(script|style)\s*>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z!?][^<>]*>").unwrap());
static ENTITY_SPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)&nbsp;|&#160;|&#xa0;").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// How counts are recovered from page text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// "Republicans 218": the label followed by whitespace and a number
    LabeledInteger,
    /// "Republicans (53 seats)": a party-division summary
    ParentheticalSeats,
    /// Case-insensitive mentions of the label anywhere in the page.
    /// Noisy fallback, never authoritative.
    OccurrenceCount,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::LabeledInteger => "labeled-integer",
            Strategy::ParentheticalSeats => "parenthetical-seats",
            Strategy::OccurrenceCount => "occurrence-count",
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Strategy::OccurrenceCount)
    }

    fn pattern(&self, label: &str) -> String {
        // Any whitespace run inside a label matches any whitespace run in the page
        let label = label
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+");
        match self {
            Strategy::LabeledInteger => format!(r"(?i){}\s+([0-9]+)", label),
            Strategy::ParentheticalSeats => format!(r"(?i){}\s*\(\s*([0-9]+)\s*seats?\s*\)", label),
            Strategy::OccurrenceCount => format!(r"(?i){}", label),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One label to look for and the seat category it feeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelRule {
    pub category: Category,
    pub label: String,
    /// Missing mandatory labels fail the run; optional ones default to 0
    #[serde(default)]
    pub required: bool,
}

impl LabelRule {
    pub fn required(category: Category, label: &str) -> Self {
        Self {
            category,
            label: label.to_string(),
            required: true,
        }
    }

    pub fn optional(category: Category, label: &str) -> Self {
        Self {
            required: false,
            ..Self::required(category, label)
        }
    }
}

fn default_strip_markup() -> bool {
    true
}

/// Named set of extraction rules for one page format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSet {
    pub strategy: Strategy,
    /// Fixed chamber size, used only for the consistency check
    pub total_seats: u32,
    /// Reduce HTML to plain text before matching. Occurrence counting always
    /// runs on the raw page.
    #[serde(default = "default_strip_markup")]
    pub strip_markup: bool,
    pub labels: Vec<LabelRule>,
}

impl RuleSet {
    /// House Clerk front page, which prints the tally directly
    pub fn house_clerk() -> Self {
        Self {
            strategy: Strategy::LabeledInteger,
            total_seats: 435,
            strip_markup: true,
            labels: vec![
                LabelRule::required(Category::Republican, "Republicans"),
                LabelRule::required(Category::Democratic, "Democrats"),
                LabelRule::required(Category::Independent, "Independents"),
                LabelRule::required(Category::Vacancies, "Vacancies"),
            ],
        }
    }

    /// Senate "Party Division" summary
    pub fn senate_party_division() -> Self {
        Self {
            strategy: Strategy::ParentheticalSeats,
            total_seats: 100,
            strip_markup: true,
            labels: vec![
                LabelRule::required(Category::Republican, "Republicans"),
                LabelRule::required(Category::Democratic, "Democrats"),
                LabelRule::required(Category::Independent, "Independents"),
            ],
        }
    }

    pub fn default_for(chamber: Chamber) -> Self {
        match chamber {
            Chamber::House => Self::house_clerk(),
            Chamber::Senate => Self::senate_party_division(),
        }
    }

    pub fn tracks(&self, category: Category) -> bool {
        self.labels.iter().any(|r| r.category == category)
    }

    pub fn validate(&self, chamber: Chamber) -> Result<(), String> {
        if self.total_seats == 0 {
            return Err(format!("{} rules: total_seats must be positive", chamber));
        }
        if self.labels.is_empty() {
            return Err(format!("{} rules: at least one label is required", chamber));
        }
        for (i, rule) in self.labels.iter().enumerate() {
            if rule.label.trim().is_empty() {
                return Err(format!("{} rules: empty label for {}", chamber, rule.category));
            }
            if self.labels[..i].iter().any(|r| r.category == rule.category) {
                return Err(format!(
                    "{} rules: category {} is listed more than once",
                    chamber, rule.category
                ));
            }
            Regex::new(&self.strategy.pattern(&rule.label))
                .map_err(|e| format!("{} rules: label \"{}\": {}", chamber, rule.label, e))?;
        }
        Ok(())
    }

    /// Apply the rule-set to a chamber page.
    ///
    /// Optional labels that do not appear default to 0. Categories the
    /// rule-set never mentions stay at 0 (vacancies stay untracked).
    pub fn extract(&self, chamber: Chamber, page: &str) -> Result<ChamberCount, ParseError> {
        let normalize = self.strip_markup && self.strategy != Strategy::OccurrenceCount;
        let text: Cow<'_, str> = if normalize {
            Cow::Owned(normalize_markup(page))
        } else {
            Cow::Borrowed(page)
        };

        let mut count = ChamberCount::new(self.total_seats);
        count.degraded = self.strategy.is_degraded();

        for rule in &self.labels {
            let found = self.find(chamber, rule, &text)?;
            let value = match found {
                Some(value) => {
                    debug!(%chamber, label = %rule.label, value, "matched label");
                    value
                }
                None if rule.required => {
                    return Err(ParseError::MissingLabel {
                        chamber,
                        label: rule.label.clone(),
                        strategy: self.strategy,
                    });
                }
                None => {
                    debug!(%chamber, label = %rule.label, "optional label absent, using 0");
                    0
                }
            };
            count.set(rule.category, value);
        }

        if count.degraded {
            warn!(
                %chamber,
                "counts come from the occurrence-count fallback and are NOT authoritative"
            );
        }

        Ok(count)
    }

    fn find(
        &self,
        chamber: Chamber,
        rule: &LabelRule,
        text: &str,
    ) -> Result<Option<u32>, ParseError> {
        let re = Regex::new(&self.strategy.pattern(&rule.label)).map_err(|e| {
            ParseError::InvalidPattern {
                label: rule.label.clone(),
                message: e.to_string(),
            }
        })?;

        if self.strategy == Strategy::OccurrenceCount {
            let n = re.find_iter(text).count();
            return match u32::try_from(n) {
                Ok(0) => Ok(None),
                Ok(n) => Ok(Some(n)),
                Err(_) => Err(ParseError::InvalidCount {
                    chamber,
                    label: rule.label.clone(),
                    value: n.to_string(),
                }),
            };
        }

        // First occurrence wins: sources list the authoritative figure once, near the top
        let Some(digits) = re.captures(text).and_then(|c| c.get(1)) else {
            return Ok(None);
        };
        digits
            .as_str()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ParseError::InvalidCount {
                chamber,
                label: rule.label.clone(),
                value: digits.as_str().to_string(),
            })
    }
}

/// Reduce an HTML page to whitespace-normalized text.
///
/// Tags become spaces so that figures in adjacent cells stay separated from
/// their labels by whitespace.
pub fn normalize_markup(html: &str) -> String {
    let text = COMMENT_RE.replace_all(html, " ");
    let text = SCRIPT_RE.replace_all(&text, " ");
    let text = TAG_RE.replace_all(&text, " ");
    let text = ENTITY_SPACE_RE.replace_all(&text, " ");
    let text = text.replace("&amp;", "&");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}
