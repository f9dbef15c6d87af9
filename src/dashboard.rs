//! Selection-change handling
//!
//! Every change of the country, state or metric controls arrives as one
//! `Selection`; the handler recomputes the view from the shared dataset and
//! returns both figures.

use serde::Serialize;
use tracing::debug;

use crate::chart::{bar_chart, Family, Figure};
use crate::config::DashboardConfig;
use crate::data::{derive_view, Metric, SharedDataset, ALL_SUB_REGIONS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub country: String,
    pub state: String,
    pub metrics: Vec<Metric>,
}

impl Selection {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            state: ALL_SUB_REGIONS.to_string(),
            metrics: vec![Metric::Confirmed, Metric::Deaths],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Figures {
    pub new: Figure,
    pub cumulative: Figure,
}

#[derive(Clone)]
pub struct Dashboard {
    dataset: SharedDataset,
    default_country: String,
    default_metrics: Vec<Metric>,
}

impl Dashboard {
    /// A configured default country missing from the data falls back to the
    /// first country in the table.
    pub fn new(dataset: SharedDataset, config: &DashboardConfig) -> Self {
        let default_country = if dataset.has_country(&config.default_country) {
            config.default_country.clone()
        } else {
            dataset.countries().first().cloned().unwrap_or_default()
        };
        Self {
            dataset,
            default_country,
            default_metrics: config.metrics(),
        }
    }

    pub fn dataset(&self) -> &SharedDataset {
        &self.dataset
    }

    pub fn default_country(&self) -> &str {
        &self.default_country
    }

    pub fn default_metrics(&self) -> &[Metric] {
        &self.default_metrics
    }

    pub fn on_selection(&self, selection: &Selection) -> Figures {
        let view = derive_view(self.dataset.rows(), &selection.country, &selection.state);
        debug!(
            "Selection {}/{}: {} rows, {} metrics",
            selection.country,
            selection.state,
            view.len(),
            selection.metrics.len()
        );
        Figures {
            new: bar_chart(&view, &selection.metrics, Family::New),
            cumulative: bar_chart(&view, &selection.metrics, Family::Cumulative),
        }
    }
}
