//! Axum route handlers for the Forecast API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::forecast::pipeline::ForecastReport;
use crate::forecast::query::{ForecastQuery, MAX_HINT_CHARS, MAX_HORIZON_YEARS, MIN_HORIZON_YEARS};
use crate::models::observation::{OccupationType, Region};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub region: Region,
    pub occupation_type: OccupationType,
    pub horizon_years: u32,
    #[serde(default)]
    pub hint: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ForecastOptionsResponse {
    pub regions: Vec<&'static str>,
    pub occupation_types: Vec<&'static str>,
    pub min_horizon_years: u32,
    pub max_horizon_years: u32,
    pub max_hint_chars: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/forecasts/options
///
/// Choices accepted by the prediction endpoint.
pub async fn handle_forecast_options() -> Json<ForecastOptionsResponse> {
    Json(ForecastOptionsResponse {
        regions: Region::ALL.iter().map(Region::label).collect(),
        occupation_types: OccupationType::ALL
            .iter()
            .map(OccupationType::label)
            .collect(),
        min_horizon_years: MIN_HORIZON_YEARS,
        max_horizon_years: MAX_HORIZON_YEARS,
        max_hint_chars: MAX_HINT_CHARS,
    })
}

/// POST /api/v1/forecasts
///
/// Runs the forecast pipeline for one query. Extraction failures still return 200
/// with the narrative and a status; only upstream or storage failures are errors.
pub async fn handle_predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<ForecastReport>, AppError> {
    let query = ForecastQuery::new(
        request.region,
        request.occupation_type,
        request.horizon_years,
        request.hint,
    )?;

    info!(
        "Forecast requested: {} / {} / {} years",
        query.region, query.occupation, query.horizon_years
    );

    let report = state.pipeline.run(query).await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::forecast::pipeline::tests::{
        wales_history, FixedHistory, ScriptedModel, TWO_ROW_REPLY,
    };
    use crate::forecast::pipeline::ForecastPipeline;
    use crate::routes::build_router;

    fn app(model: ScriptedModel) -> axum::Router {
        let pipeline = ForecastPipeline::new(
            Arc::new(FixedHistory(wales_history())),
            Arc::new(model),
            Duration::from_secs(30),
        );
        build_router(AppState { pipeline })
    }

    async fn post(app: axum::Router, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::post("/api/v1/forecasts")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_predict_returns_outcome_and_chart() {
        let (status, body) = post(
            app(ScriptedModel::replying(TWO_ROW_REPLY)),
            json!({
                "region": "Wales",
                "occupation_type": "2: professional occupations",
                "horizon_years": 1
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"]["status"], "forecast");
        assert_eq!(body["outcome"]["window"]["start_year"], 2024);
        assert_eq!(body["outcome"]["dataset"][0]["RegionName"], "Wales");
        assert_eq!(body["outcome"]["dataset"][0]["EmploymentPercentage"], 12.03);
        assert_eq!(body["chart"]["series"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_predict_without_payload_returns_narrative_only() {
        let (status, body) = post(
            app(ScriptedModel::replying("Only prose today.")),
            json!({
                "region": "Wales",
                "occupation_type": "2: professional occupations",
                "horizon_years": 2,
                "hint": "Mention devolved policy."
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"]["status"], "no_structured_data");
        assert!(body["outcome"]["narrative"]
            .as_str()
            .unwrap()
            .contains("Only prose today."));
        assert!(body["chart"].is_null());
    }

    #[tokio::test]
    async fn test_predict_rejects_horizon_out_of_range() {
        let (status, body) = post(
            app(ScriptedModel::replying(TWO_ROW_REPLY)),
            json!({
                "region": "Wales",
                "occupation_type": "2: professional occupations",
                "horizon_years": 0
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_predict_upstream_failure_is_retryable() {
        let (status, body) = post(
            app(ScriptedModel::failing(500)),
            json!({
                "region": "England",
                "occupation_type": "1: managers, directors and senior officials",
                "horizon_years": 4
            }),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "UPSTREAM_UNAVAILABLE");
        assert_eq!(body["error"]["retryable"], true);
    }

    #[tokio::test]
    async fn test_options_lists_form_choices() {
        let Json(options) = handle_forecast_options().await;
        assert_eq!(options.regions.len(), 4);
        assert!(options.regions.contains(&"Northern Ireland"));
        assert_eq!(options.occupation_types.len(), 8);
        assert_eq!(options.max_horizon_years, 10);
        assert_eq!(options.max_hint_chars, 600);
    }
}
