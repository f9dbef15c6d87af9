//! HTTP routes
//!
//! Every API call recomputes its view from the shared dataset.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::AppState;
use crate::dashboard::{Figures, Selection};
use crate::data::{derive_view, DerivedRow, Metric, ALL_SUB_REGIONS};

/// Serve the dashboard page
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

pub async fn health() -> &'static str {
    "ok"
}

/// Rejected query parameters
#[derive(Debug)]
pub struct ApiError(String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.0).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct CountriesResponse {
    pub countries: Vec<String>,
    pub default_country: String,
    pub default_metrics: Vec<Metric>,
}

/// API: Countries for the dropdown plus the initial selection
pub async fn api_countries(State(state): State<Arc<AppState>>) -> Json<CountriesResponse> {
    let dashboard = &state.dashboard;
    Json(CountriesResponse {
        countries: dashboard.dataset().countries().to_vec(),
        default_country: dashboard.default_country().to_string(),
        default_metrics: dashboard.default_metrics().to_vec(),
    })
}

#[derive(Debug, Deserialize)]
pub struct RegionsQuery {
    pub country: String,
}

/// API: States/provinces of a country, `"<all>"` first
pub async fn api_regions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RegionsQuery>,
) -> Json<Vec<String>> {
    Json(state.dashboard.dataset().sub_regions(&query.country))
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    pub country: String,
    #[serde(default = "default_state")]
    pub state: String,
    /// Comma-separated metric names; absent means the configured defaults
    pub metrics: Option<String>,
}

fn default_state() -> String {
    ALL_SUB_REGIONS.to_string()
}

/// API: Derived rows for a country/state
pub async fn api_view(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Json<Vec<DerivedRow>> {
    let rows = state.dashboard.dataset().rows();
    Json(derive_view(rows, &query.country, &query.state))
}

fn parse_metrics(raw: &str) -> Result<Vec<Metric>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| m.parse::<Metric>().map_err(ApiError))
        .collect()
}

/// API: Both bar charts for a selection
pub async fn api_figures(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<Figures>, ApiError> {
    let metrics = match query.metrics.as_deref() {
        Some(raw) => parse_metrics(raw)?,
        None => state.dashboard.default_metrics().to_vec(),
    };
    let selection = Selection {
        state: query.state,
        metrics,
        ..Selection::new(query.country)
    };
    Ok(Json(state.dashboard.on_selection(&selection)))
}

#[cfg(test)]
mod tests {
    use crate::config::DashboardConfig;
    use crate::dashboard::Dashboard;
    use crate::data::tests::row;
    use crate::data::Dataset;
    use crate::web::router;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let dataset = Arc::new(Dataset::new(vec![
            row("Country", "A", 22, 5, 1, 0),
            row("Country", "B", 22, 1, 3, 0),
            row("Country", "A", 23, 6, 2, 1),
            row("Country", "B", 23, 2, 5, 0),
            row("Italy", "<all>", 22, 0, 0, 0),
            row("Italy", "<all>", 23, 0, 0, 0),
            row("Italy", "<all>", 24, 1, 0, 0),
        ]));
        router(Dashboard::new(dataset, &DashboardConfig::default()))
    }

    async fn get(uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let cache = response
            .headers()
            .get(header::CACHE_CONTROL)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, cache, body.to_vec())
    }

    async fn get_json(uri: &str) -> Value {
        let (status, _, body) = get(uri).await;
        assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&body));
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn lists_countries_with_defaults() {
        let json = get_json("/api/countries").await;
        assert_eq!(json["countries"], serde_json::json!(["Country", "Italy"]));
        assert_eq!(json["default_country"], "Italy");
        assert_eq!(json["default_metrics"], serde_json::json!(["Confirmed", "Deaths"]));
    }

    #[tokio::test]
    async fn lists_regions() {
        let json = get_json("/api/regions?country=Country").await;
        assert_eq!(json, serde_json::json!(["<all>", "A", "B"]));
        let json = get_json("/api/regions?country=Nowhere").await;
        assert_eq!(json, serde_json::json!([]));
    }

    #[tokio::test]
    async fn view_aggregates_all_states() {
        let json = get_json("/api/view?country=Country&state=%3Call%3E").await;
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["cum_deaths"], 7);
        assert_eq!(rows[1]["new_deaths"], 3);
        assert_eq!(rows[0]["date"], "2020-01-22");
        assert_eq!(rows[0]["date_label"], "Jan 22, 2020");
    }

    #[tokio::test]
    async fn view_defaults_to_all_states() {
        let json = get_json("/api/view?country=Italy").await;
        let new: Vec<i64> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["new_confirmed"].as_i64().unwrap())
            .collect();
        assert_eq!(new, [0, 0, 1]);
    }

    #[tokio::test]
    async fn unknown_country_is_an_empty_view() {
        let json = get_json("/api/view?country=Nonexistent").await;
        assert_eq!(json, serde_json::json!([]));
    }

    #[tokio::test]
    async fn figures_follow_selected_metrics() {
        let json = get_json("/api/figures?country=Country&state=A&metrics=Recovered").await;
        let traces = json["new"]["data"].as_array().unwrap();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0]["name"], "Recovered");
        assert_eq!(traces[0]["y"], serde_json::json!([0, 1]));
        assert_eq!(json["cumulative"]["data"][0]["y"], serde_json::json!([0, 1]));
    }

    #[tokio::test]
    async fn figures_use_default_metrics() {
        let json = get_json("/api/figures?country=Italy").await;
        let names: Vec<&str> = json["cumulative"]["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Confirmed", "Deaths"]);
    }

    #[tokio::test]
    async fn empty_metric_list_means_no_series() {
        let json = get_json("/api/figures?country=Italy&metrics=").await;
        assert_eq!(json["new"]["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn unknown_metric_is_rejected() {
        let (status, _, body) = get("/api/figures?country=Italy&metrics=Active").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(String::from_utf8(body).unwrap(), "unknown metric 'Active'");
    }

    #[tokio::test]
    async fn api_responses_are_not_cached() {
        let (_, cache, _) = get("/api/countries").await;
        assert_eq!(cache.as_deref(), Some("no-store"));
    }

    #[tokio::test]
    async fn page_ignores_superseded_state_lists() {
        let (_, _, body) = get("/").await;
        let page = String::from_utf8(body).unwrap();
        assert!(page.contains("if (seq !== statesSeq) return false;"));
        assert!(page.contains("if (seq !== requestSeq) return;"));
    }

    #[tokio::test]
    async fn serves_page_and_health() {
        let (status, _, body) = get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body).unwrap().contains("Case History of the Coronavirus"));

        let (status, _, body) = get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");

        let (status, _, _) = get("/wp-login.php").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
