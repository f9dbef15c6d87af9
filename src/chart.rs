//! Plotly figure construction for the two bar charts
//!
//! Figures are plain serde structs; the page hands them to `Plotly.react`
//! unchanged.

use serde::Serialize;

use crate::data::{DerivedRow, Metric};

const FONT_FAMILY: &str = "Courier New, monospace";
const FONT_COLOR: &str = "rgb(30,30,30)";
const GRID_COLOR: &str = "#DDDDDD";

/// Which value of each metric a chart plots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    New,
    Cumulative,
}

impl Family {
    pub fn axis_title(self) -> &'static str {
        match self {
            Family::New => "Daily New",
            Family::Cumulative => "Cumulative",
        }
    }

    fn value(self, metric: Metric, row: &DerivedRow) -> i64 {
        match self {
            Family::New => metric.new_count(row),
            Family::Cumulative => metric.cumulative(row),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<BarTrace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize)]
pub struct BarTrace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<i64>,
    pub marker: Marker,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub color: &'static str,
    pub line: Line,
}

#[derive(Debug, Clone, Serialize)]
pub struct Line {
    pub color: &'static str,
    pub width: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Font {
    pub family: &'static str,
    pub size: u32,
    pub color: &'static str,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: FONT_FAMILY,
            size: 12,
            color: FONT_COLOR,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub title: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickangle: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickfont: Option<Font>,
    pub showgrid: bool,
    pub gridcolor: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub barmode: &'static str,
    pub legend: Legend,
    pub plot_bgcolor: &'static str,
    pub font: Font,
    pub xaxis: Axis,
    pub yaxis: Axis,
}

/// Grouped bar chart with one series per selected metric.
///
/// An empty view produces series with no points.
pub fn bar_chart(view: &[DerivedRow], metrics: &[Metric], family: Family) -> Figure {
    let labels: Vec<String> = view.iter().map(|r| r.date_label.clone()).collect();

    let data = metrics
        .iter()
        .map(|&metric| BarTrace {
            kind: "bar",
            name: metric.label().to_string(),
            x: labels.clone(),
            y: view.iter().map(|r| family.value(metric, r)).collect(),
            marker: Marker {
                color: metric.color(),
                line: Line {
                    color: "rgb(0,0,0)",
                    width: 1,
                },
            },
        })
        .collect();

    Figure {
        data,
        layout: Layout {
            barmode: "group",
            legend: Legend { x: 0.5, y: 0.95 },
            plot_bgcolor: "#FFFFFF",
            font: Font::default(),
            xaxis: Axis {
                title: String::new(),
                kind: Some("category"),
                tickangle: Some(-90),
                tickfont: Some(Font::default()),
                showgrid: true,
                gridcolor: GRID_COLOR,
            },
            yaxis: Axis {
                title: family.axis_title().to_string(),
                kind: None,
                tickangle: None,
                tickfont: None,
                showgrid: true,
                gridcolor: GRID_COLOR,
            },
        },
    }
}
