//! Per-selection view of the unified table with day-over-day deltas

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::{DerivedRow, UnifiedRow, ALL_SUB_REGIONS};

/// Axis label format, e.g. "Jan 22, 2020"
pub const DATE_LABEL_FORMAT: &str = "%b %d, %Y";

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    confirmed: i64,
    deaths: i64,
    recovered: i64,
}

impl Totals {
    fn of(row: &UnifiedRow) -> Self {
        Self {
            confirmed: row.cum_confirmed,
            deaths: row.cum_deaths,
            recovered: row.cum_recovered,
        }
    }

    fn add(&mut self, row: &UnifiedRow) {
        self.confirmed += row.cum_confirmed;
        self.deaths += row.cum_deaths;
        self.recovered += row.cum_recovered;
    }
}

/// Filter the table to one region and compute daily deltas.
///
/// `"<all>"` sums every sub-region of `region` per date; any other value keeps
/// only that exact sub-region. No match yields an empty view. The first day's
/// delta is 0.
pub fn derive_view(table: &[UnifiedRow], region: &str, sub_region: &str) -> Vec<DerivedRow> {
    let in_region = table.iter().filter(|r| r.region == region);

    let series: Vec<(NaiveDate, Totals)> = if sub_region == ALL_SUB_REGIONS {
        let mut by_date: BTreeMap<NaiveDate, Totals> = BTreeMap::new();
        for row in in_region {
            by_date.entry(row.date).or_default().add(row);
        }
        by_date.into_iter().collect()
    } else {
        let mut series: Vec<_> = in_region
            .filter(|r| r.sub_region == sub_region)
            .map(|r| (r.date, Totals::of(r)))
            .collect();
        series.sort_by_key(|(date, _)| *date);
        series
    };

    let mut previous: Option<Totals> = None;
    series
        .into_iter()
        .map(|(date, cum)| {
            let prev = previous.replace(cum).unwrap_or(cum);
            DerivedRow {
                date,
                date_label: date.format(DATE_LABEL_FORMAT).to_string(),
                cum_confirmed: cum.confirmed,
                cum_deaths: cum.deaths,
                cum_recovered: cum.recovered,
                new_confirmed: cum.confirmed - prev.confirmed,
                new_deaths: cum.deaths - prev.deaths,
                new_recovered: cum.recovered - prev.recovered,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::row;

    fn italy() -> Vec<UnifiedRow> {
        vec![
            row("Italy", "<all>", 22, 0, 0, 0),
            row("Italy", "<all>", 23, 0, 0, 0),
            row("Italy", "<all>", 24, 1, 0, 0),
        ]
    }

    #[test]
    fn first_case_appears_as_new() {
        let view = derive_view(&italy(), "Italy", "<all>");
        let new: Vec<i64> = view.iter().map(|r| r.new_confirmed).collect();
        assert_eq!(new, [0, 0, 1]);
    }

    #[test]
    fn all_sums_sub_regions_per_date() {
        let table = vec![
            row("Country", "A", 22, 0, 1, 0),
            row("Country", "B", 22, 0, 3, 0),
            row("Country", "A", 23, 0, 2, 0),
            row("Country", "B", 23, 0, 5, 0),
            row("Other", "<all>", 22, 0, 100, 0),
        ];
        let view = derive_view(&table, "Country", "<all>");
        let cum: Vec<i64> = view.iter().map(|r| r.cum_deaths).collect();
        let new: Vec<i64> = view.iter().map(|r| r.new_deaths).collect();
        assert_eq!(cum, [4, 7]);
        assert_eq!(new, [0, 3]);
    }

    #[test]
    fn unknown_selection_is_empty() {
        assert!(derive_view(&italy(), "Nonexistent", "<all>").is_empty());
        assert!(derive_view(&italy(), "Italy", "Lombardy").is_empty());
    }

    #[test]
    fn sub_region_is_sorted_by_date_without_aggregation() {
        let table = vec![
            row("Canada", "Ontario", 24, 9, 2, 1),
            row("Canada", "Alberta", 22, 100, 0, 0),
            row("Canada", "Ontario", 22, 4, 0, 0),
            row("Canada", "Ontario", 23, 6, 1, 1),
        ];
        let view = derive_view(&table, "Canada", "Ontario");
        let dates: Vec<&str> = view.iter().map(|r| r.date_label.as_str()).collect();
        assert_eq!(dates, ["Jan 22, 2020", "Jan 23, 2020", "Jan 24, 2020"]);
        let new: Vec<(i64, i64, i64)> = view
            .iter()
            .map(|r| (r.new_confirmed, r.new_deaths, r.new_recovered))
            .collect();
        assert_eq!(new, [(0, 0, 0), (2, 1, 1), (3, 1, 0)]);
    }

    #[test]
    fn deltas_are_first_differences() {
        let cumulative = [3i64, 3, 10, 25, 24];
        let table: Vec<UnifiedRow> = cumulative
            .iter()
            .enumerate()
            .map(|(i, &c)| row("X", "<all>", 22 + i as u32, c, 0, 0))
            .collect();
        let new: Vec<i64> = derive_view(&table, "X", "<all>")
            .iter()
            .map(|r| r.new_confirmed)
            .collect();
        // a downward correction shows up as a negative delta
        assert_eq!(new, [0, 0, 7, 15, -1]);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let table = italy();
        assert_eq!(
            derive_view(&table, "Italy", "<all>"),
            derive_view(&table, "Italy", "<all>")
        );
    }
}
