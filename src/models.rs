use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConsistencyWarning;

/// Legislative chamber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Chamber {
    House,  // Lower chamber
    Senate, // Upper chamber
}

impl Chamber {
    pub const ALL: [Chamber; 2] = [Chamber::House, Chamber::Senate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Chamber::House => "house",
            Chamber::Senate => "senate",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Chamber::House => "House",
            Chamber::Senate => "Senate",
        }
    }
}

impl fmt::Display for Chamber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chamber {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "house" | "lower" => Ok(Chamber::House),
            "senate" | "upper" => Ok(Chamber::Senate),
            _ => Err(()),
        }
    }
}

/// Seat category a label maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Democratic,
    Republican,
    Independent,
    Vacancies,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Democratic => "democratic",
            Category::Republican => "republican",
            Category::Independent => "independent",
            Category::Vacancies => "vacancies",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Seat breakdown of one chamber.
///
/// Field names are the persisted names consumed downstream and must not change.
/// `vacancies` is `None` when the chamber's rule-set does not track them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChamberCount {
    #[serde(rename = "dem")]
    pub democratic: u32,
    #[serde(rename = "rep")]
    pub republican: u32,
    #[serde(rename = "ind")]
    pub independent: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacancies: Option<u32>,
    #[serde(rename = "total")]
    pub total_seats: u32,
    /// Counts came from the occurrence-count fallback and are not authoritative
    #[serde(default, skip_serializing_if = "is_false")]
    pub degraded: bool,
}

impl ChamberCount {
    pub fn new(total_seats: u32) -> Self {
        Self {
            total_seats,
            ..Default::default()
        }
    }

    pub fn get(&self, category: Category) -> u32 {
        match category {
            Category::Democratic => self.democratic,
            Category::Republican => self.republican,
            Category::Independent => self.independent,
            Category::Vacancies => self.vacancies.unwrap_or(0),
        }
    }

    pub fn set(&mut self, category: Category, value: u32) {
        match category {
            Category::Democratic => self.democratic = value,
            Category::Republican => self.republican = value,
            Category::Independent => self.independent = value,
            Category::Vacancies => self.vacancies = Some(value),
        }
    }

    /// Seats accounted for by the scraped figures, vacancies included
    pub fn accounted(&self) -> u32 {
        self.democratic
            .saturating_add(self.republican)
            .saturating_add(self.independent)
            .saturating_add(self.vacancies.unwrap_or(0))
    }

    /// Compare the scraped figures against the chamber's fixed size
    pub fn check_total(&self, chamber: Chamber) -> Option<ConsistencyWarning> {
        let actual = self.accounted();
        if actual == self.total_seats {
            None
        } else {
            Some(ConsistencyWarning {
                chamber,
                expected: self.total_seats,
                actual,
            })
        }
    }
}

/// Where each chamber's figures were scraped from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sources {
    pub house: String,
    pub senate: String,
}

/// The persisted party division of both chambers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub updated_at: NaiveDate,
    #[serde(rename = "house")]
    pub lower_chamber: ChamberCount,
    #[serde(rename = "senate")]
    pub upper_chamber: ChamberCount,
    pub sources: Sources,
}

impl Snapshot {
    pub fn chamber(&self, chamber: Chamber) -> &ChamberCount {
        match chamber {
            Chamber::House => &self.lower_chamber,
            Chamber::Senate => &self.upper_chamber,
        }
    }

    pub fn source(&self, chamber: Chamber) -> &str {
        match chamber {
            Chamber::House => &self.sources.house,
            Chamber::Senate => &self.sources.senate,
        }
    }

    pub fn consistency_warnings(&self) -> Vec<ConsistencyWarning> {
        Chamber::ALL
            .iter()
            .filter_map(|c| self.chamber(*c).check_total(*c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn house() -> ChamberCount {
        ChamberCount {
            democratic: 213,
            republican: 218,
            independent: 1,
            vacancies: Some(3),
            total_seats: 435,
            degraded: false,
        }
    }

    #[test]
    fn test_chamber_parsing() {
        assert_eq!("House".parse::<Chamber>(), Ok(Chamber::House));
        assert_eq!(" upper ".parse::<Chamber>(), Ok(Chamber::Senate));
        assert!("assembly".parse::<Chamber>().is_err());
    }

    #[test]
    fn test_full_house_has_no_warning() {
        assert_eq!(house().accounted(), 435);
        assert_eq!(house().check_total(Chamber::House), None);
    }

    #[test]
    fn test_mismatch_produces_warning() {
        let mut count = house();
        count.vacancies = Some(1);
        let warning = count.check_total(Chamber::House).unwrap();
        assert_eq!(warning.expected, 435);
        assert_eq!(warning.actual, 433);
        assert_eq!(warning.chamber, Chamber::House);
    }

    #[test]
    fn test_untracked_vacancies_count_as_zero() {
        let mut count = ChamberCount::new(100);
        count.set(Category::Republican, 53);
        count.set(Category::Democratic, 45);
        count.set(Category::Independent, 2);
        assert_eq!(count.vacancies, None);
        assert_eq!(count.get(Category::Vacancies), 0);
        assert_eq!(count.check_total(Chamber::Senate), None);
    }

    #[test]
    fn test_chamber_count_field_names() {
        let json = serde_json::to_value(house()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"dem": 213, "rep": 218, "ind": 1, "vacancies": 3, "total": 435})
        );

        let senate = ChamberCount {
            democratic: 45,
            republican: 53,
            independent: 2,
            vacancies: None,
            total_seats: 100,
            degraded: true,
        };
        let json = serde_json::to_value(senate).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"dem": 45, "rep": 53, "ind": 2, "total": 100, "degraded": true})
        );
    }
}
