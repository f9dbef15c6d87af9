//! Wide-to-long reshaping of the source time series and the three-way join

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use super::fetch::SourceClient;
use super::{Dataset, LongRow, Metric, UnifiedRow, ALL_SUB_REGIONS};
use crate::error::LoadError;

const SUB_REGION_COLUMN: &str = "Province/State";
const REGION_COLUMN: &str = "Country/Region";
/// Geographic coordinates are not part of the table
const COORDINATE_COLUMNS: &[&str] = &["Lat", "Long", "Long_"];

/// Column positions resolved from a CSV header row
#[derive(Debug)]
struct ColumnLayout {
    region: usize,
    sub_region: usize,
    dates: Vec<(usize, NaiveDate)>,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord, source_url: &str) -> Result<Self, LoadError> {
        let mut region = None;
        let mut sub_region = None;
        let mut dates = Vec::new();

        for (idx, raw) in headers.iter().enumerate() {
            let name = raw.trim().trim_start_matches('\u{feff}');
            match name {
                REGION_COLUMN => region = Some(idx),
                SUB_REGION_COLUMN => sub_region = Some(idx),
                _ if COORDINATE_COLUMNS.contains(&name) => {}
                _ => match parse_header_date(name) {
                    Some(date) => dates.push((idx, date)),
                    None => {
                        return Err(LoadError::schema(
                            source_url,
                            format!("column '{}' is neither a region nor a date", name),
                        ))
                    }
                },
            }
        }

        let region = region.ok_or_else(|| {
            LoadError::schema(source_url, format!("missing column '{}'", REGION_COLUMN))
        })?;
        let sub_region = sub_region.ok_or_else(|| {
            LoadError::schema(source_url, format!("missing column '{}'", SUB_REGION_COLUMN))
        })?;
        if dates.is_empty() {
            return Err(LoadError::schema(source_url, "no date columns"));
        }

        Ok(Self {
            region,
            sub_region,
            dates,
        })
    }
}

/// Date headers are US short dates ("1/22/20"); ISO dates are accepted too.
fn parse_header_date(name: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(name, "%m/%d/%y")
        .or_else(|_| NaiveDate::parse_from_str(name, "%Y-%m-%d"))
        .ok()
}

/// Blank or unparseable counts become 0; decimals are truncated.
fn parse_count(field: Option<&str>) -> i64 {
    let field = field.map(str::trim).unwrap_or_default();
    if field.is_empty() {
        return 0;
    }
    field.parse::<i64>().unwrap_or_else(|_| {
        field
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v.trunc() as i64)
            .unwrap_or(0)
    })
}

/// Melt one wide CSV body into long rows for `metric`.
///
/// A repeated (region, sub-region) record keeps its first occurrence so that
/// (region, sub-region, date) stays unique. Records without a region are skipped.
pub fn parse_metric(
    body: &str,
    source_url: &str,
    metric: Metric,
) -> Result<Vec<LongRow>, LoadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| LoadError::unavailable(source_url, e))?
        .clone();
    let layout = ColumnLayout::from_headers(&headers, source_url)?;

    let mut rows = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut duplicates = 0usize;
    let mut unnamed = 0usize;

    for record in reader.records() {
        let record = record.map_err(|e| LoadError::unavailable(source_url, e))?;

        let region = record.get(layout.region).map(str::trim).unwrap_or_default();
        if region.is_empty() {
            unnamed += 1;
            continue;
        }
        let sub_region = match record.get(layout.sub_region).map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => ALL_SUB_REGIONS,
        };
        if !seen.insert((region.to_string(), sub_region.to_string())) {
            duplicates += 1;
            continue;
        }

        rows.extend(layout.dates.iter().map(|&(idx, date)| LongRow {
            region: region.to_string(),
            sub_region: sub_region.to_string(),
            date,
            value: parse_count(record.get(idx)),
        }));
    }

    if duplicates > 0 {
        warn!(
            "{}: skipped {} duplicate region records in {}",
            metric, duplicates, source_url
        );
    }
    if unnamed > 0 {
        debug!("{}: skipped {} records without a region", metric, unnamed);
    }
    debug!(
        "{}: {} regions x {} dates from {}",
        metric,
        seen.len(),
        layout.dates.len(),
        source_url
    );

    Ok(rows)
}

/// Fetch one metric's time series and reshape it to long form.
pub async fn load_metric(
    client: &SourceClient,
    source_location: &str,
    metric: Metric,
) -> Result<Vec<LongRow>, LoadError> {
    let body = client.fetch_text(source_location).await?;
    parse_metric(&body, source_location, metric)
}

/// Rows of each input that found no partner in the other two
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JoinStats {
    pub matched: usize,
    pub dropped_confirmed: usize,
    pub dropped_deaths: usize,
    pub dropped_recovered: usize,
}

impl JoinStats {
    pub fn dropped(&self) -> usize {
        self.dropped_confirmed + self.dropped_deaths + self.dropped_recovered
    }
}

type JoinKey<'a> = (&'a str, &'a str, NaiveDate);

fn index(rows: &[LongRow]) -> HashMap<JoinKey<'_>, i64> {
    rows.iter()
        .map(|r| ((r.region.as_str(), r.sub_region.as_str(), r.date), r.value))
        .collect()
}

/// Inner join of the three metric tables on (region, sub-region, date).
///
/// Keys missing from any input are dropped without error.
pub fn join_metrics(
    confirmed: &[LongRow],
    deaths: &[LongRow],
    recovered: &[LongRow],
) -> (Vec<UnifiedRow>, JoinStats) {
    let deaths_by_key = index(deaths);
    let recovered_by_key = index(recovered);

    let joined: Vec<UnifiedRow> = confirmed
        .iter()
        .filter_map(|c| {
            let key = (c.region.as_str(), c.sub_region.as_str(), c.date);
            let cum_deaths = *deaths_by_key.get(&key)?;
            let cum_recovered = *recovered_by_key.get(&key)?;
            Some(UnifiedRow {
                region: c.region.clone(),
                sub_region: c.sub_region.clone(),
                date: c.date,
                cum_confirmed: c.value,
                cum_deaths,
                cum_recovered,
            })
        })
        .collect();

    let matched = joined.len();
    let stats = JoinStats {
        matched,
        dropped_confirmed: confirmed.len().saturating_sub(matched),
        dropped_deaths: deaths_by_key.len().saturating_sub(matched),
        dropped_recovered: recovered_by_key.len().saturating_sub(matched),
    };
    (joined, stats)
}

/// Load all three metrics and join them into the startup dataset.
pub async fn build_unified_table(
    client: &SourceClient,
    confirmed_location: &str,
    deaths_location: &str,
    recovered_location: &str,
) -> Result<Dataset, LoadError> {
    let (confirmed, deaths, recovered) = tokio::try_join!(
        load_metric(client, confirmed_location, Metric::Confirmed),
        load_metric(client, deaths_location, Metric::Deaths),
        load_metric(client, recovered_location, Metric::Recovered),
    )?;
    info!(
        "Loaded {} confirmed, {} deaths, {} recovered rows",
        confirmed.len(),
        deaths.len(),
        recovered.len()
    );

    let (rows, stats) = join_metrics(&confirmed, &deaths, &recovered);
    if stats.dropped() > 0 {
        warn!(
            "Sources disagree on coverage: joined {} rows, dropped {} confirmed, \
             {} deaths, {} recovered",
            stats.matched,
            stats.dropped_confirmed,
            stats.dropped_deaths,
            stats.dropped_recovered
        );
    }

    let dataset = Dataset::new(rows);
    if dataset.is_empty() {
        warn!("Unified table is empty; the sources share no (region, state, date) keys");
    }
    info!(
        "Unified table ready: {} rows across {} countries",
        dataset.len(),
        dataset.countries().len()
    );
    Ok(dataset)
}
