//! Data models for discovered publications and their classification.
//!
//! - [`Period`]: the year bounds a run is scoped to
//! - [`ScrapedRow`]: a row as rendered by the portal table, year still raw text
//! - [`Publication`]: a row retained by the collector, persisted between the two stages
//! - [`Verdict`] / [`DricRecord`]: the classification outcome written by `check_dric`

use crate::error::PeriodError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static FOUR_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("static regex"));

/// Parse the first 4-digit year out of a free-form cell such as `"2019"` or
/// `"Published 2019, vol. 4"`.
pub fn parse_year(text: &str) -> Option<i32> {
    FOUR_DIGITS.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Inclusive year range derived from a period string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub year_min: i32,
    pub year_max: i32,
}

impl Period {
    /// Extract every 4-digit number from `period` and take the min and max.
    ///
    /// Accepts `"2020"`, `"2016-2017"`, `"2015/2016"` and similar.
    pub fn parse(period: &str) -> Result<Self, PeriodError> {
        let years: Vec<i32> = FOUR_DIGITS
            .find_iter(period)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();
        match (years.iter().min(), years.iter().max()) {
            (Some(&year_min), Some(&year_max)) => Ok(Self { year_min, year_max }),
            _ => Err(PeriodError(period.to_string())),
        }
    }

    /// Inclusive at both ends.
    pub fn contains(&self, year: i32) -> bool {
        (self.year_min..=self.year_max).contains(&year)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.year_min == self.year_max {
            write!(f, "{}", self.year_min)
        } else {
            write!(f, "{}-{}", self.year_min, self.year_max)
        }
    }
}

/// One row as rendered in the portal's publication table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedRow {
    pub authors: String,
    pub title: String,
    pub year_text: String,
    pub link: String,
}

impl ScrapedRow {
    pub fn year(&self) -> Option<i32> {
        parse_year(&self.year_text)
    }
}

/// A publication retained for classification.
///
/// Serialized with the column names the classification stage reads back.
/// `year` is kept as text so pass-through values survive the round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Publication {
    pub authors: String,
    pub title: String,
    pub year: String,
    pub scholar_link: String,
}

/// Outcome of classifying one publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// The article acknowledges DRIC.
    #[serde(rename = "YES")]
    Yes,
    /// The model answered anything other than YES.
    #[serde(rename = "NO")]
    No,
    /// No usable article text: no link, fetch failed, or empty text.
    #[serde(rename = "NF")]
    NotFound,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Yes => "YES",
            Verdict::No => "NO",
            Verdict::NotFound => "NF",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified publication as written to the output CSV. The link column is
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DricRecord {
    pub authors: String,
    pub title: String,
    pub year: String,
    pub dric: Verdict,
}

impl DricRecord {
    pub fn new(publication: &Publication, dric: Verdict) -> Self {
        Self {
            authors: publication.authors.clone(),
            title: publication.title.clone(),
            year: publication.year.clone(),
            dric,
        }
    }
}
