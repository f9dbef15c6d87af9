//! Case data module
//!
//! Holds the unified case table built once at startup and the types that flow
//! from the loader through the deriver to the charts.

pub mod derive;
pub mod fetch;
pub mod loader;

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use derive::derive_view;
pub use loader::build_unified_table;

/// Sub-region sentinel for "the whole region" (blank Province/State in the source)
pub const ALL_SUB_REGIONS: &str = "<all>";

/// One of the three tracked counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Metric {
    Confirmed,
    Deaths,
    Recovered,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Confirmed, Metric::Deaths, Metric::Recovered];

    pub fn label(self) -> &'static str {
        match self {
            Metric::Confirmed => "Confirmed",
            Metric::Deaths => "Deaths",
            Metric::Recovered => "Recovered",
        }
    }

    /// File name of the global time series for this metric
    pub fn source_file(self) -> &'static str {
        match self {
            Metric::Confirmed => "time_series_covid19_confirmed_global.csv",
            Metric::Deaths => "time_series_covid19_deaths_global.csv",
            Metric::Recovered => "time_series_covid19_recovered_global.csv",
        }
    }

    /// Bar colour used for this metric in both chart families
    pub fn color(self) -> &'static str {
        match self {
            Metric::Deaths => "rgb(200,30,30)",
            Metric::Recovered => "rgb(30,200,30)",
            Metric::Confirmed => "rgb(100,140,240)",
        }
    }

    pub fn cumulative(self, row: &DerivedRow) -> i64 {
        match self {
            Metric::Confirmed => row.cum_confirmed,
            Metric::Deaths => row.cum_deaths,
            Metric::Recovered => row.cum_recovered,
        }
    }

    pub fn new_count(self, row: &DerivedRow) -> i64 {
        match self {
            Metric::Confirmed => row.new_confirmed,
            Metric::Deaths => row.new_deaths,
            Metric::Recovered => row.new_recovered,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown metric '{}'", s.trim()))
    }
}

/// One (region, sub-region, date) count for a single metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongRow {
    pub region: String,
    pub sub_region: String,
    pub date: NaiveDate,
    pub value: i64,
}

/// Joined cumulative counts for one (region, sub-region, date)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnifiedRow {
    pub region: String,
    pub sub_region: String,
    pub date: NaiveDate,
    pub cum_confirmed: i64,
    pub cum_deaths: i64,
    pub cum_recovered: i64,
}

/// Per-query row handed to the charts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedRow {
    pub date: NaiveDate,
    pub date_label: String,
    pub cum_confirmed: i64,
    pub cum_deaths: i64,
    pub cum_recovered: i64,
    pub new_confirmed: i64,
    pub new_deaths: i64,
    pub new_recovered: i64,
}

/// Immutable unified table, built once at startup
#[derive(Debug)]
pub struct Dataset {
    rows: Vec<UnifiedRow>,
    countries: Vec<String>,
}

/// Read-only handle shared by every request
pub type SharedDataset = Arc<Dataset>;

impl Dataset {
    /// Rows are sorted by (region, sub-region, date) before being stored.
    pub fn new(mut rows: Vec<UnifiedRow>) -> Self {
        rows.sort_by(|a, b| {
            (&a.region, &a.sub_region, a.date).cmp(&(&b.region, &b.sub_region, b.date))
        });
        let countries = rows
            .iter()
            .map(|r| r.region.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self { rows, countries }
    }

    pub fn rows(&self) -> &[UnifiedRow] {
        &self.rows
    }

    /// Distinct region names, sorted
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn has_country(&self, country: &str) -> bool {
        self.countries.binary_search_by(|c| c.as_str().cmp(country)).is_ok()
    }

    /// Selectable sub-regions of a country, `"<all>"` first.
    ///
    /// Unknown countries yield an empty list.
    pub fn sub_regions(&self, country: &str) -> Vec<String> {
        if !self.has_country(country) {
            return Vec::new();
        }
        let named: BTreeSet<&str> = self
            .rows
            .iter()
            .filter(|r| r.region == country && r.sub_region != ALL_SUB_REGIONS)
            .map(|r| r.sub_region.as_str())
            .collect();

        std::iter::once(ALL_SUB_REGIONS)
            .chain(named)
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
