//! Forecast Pipeline — one strictly linear pass per query.
//!
//! Flow: fetch history → build request (Built) → model call (Sent) →
//!       parse (ParsedOk | ParsedFailed) → chart.
//!
//! The model call is the only untrusted transition. Nothing is retried here; the
//! outcome classifies whatever came back. No state is shared between runs.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::forecast::data_source::HistoricalDataSource;
use crate::forecast::query::ForecastQuery;
use crate::forecast::render::{build_chart, ChartSpec};
use crate::forecast::request_builder::build_forecast_request;
use crate::forecast::response_parser::{parse_forecast_reply, ForecastOutcome};
use crate::llm_client::{GenerativeForecastClient, LlmError};

/// Conditions that abort a run. Extraction problems are outcomes, not errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("generative service call failed: {0}")]
    UpstreamUnavailable(#[source] LlmError),

    #[error("generative service did not answer within {seconds}s")]
    UpstreamTimeout { seconds: u64 },

    #[error("historical data unavailable: {0}")]
    HistoricalData(#[source] AppError),

    #[error("forecast request could not be built: {0}")]
    RequestConstruction(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Built,
    Sent,
    ParsedOk,
    ParsedFailed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Built => "built",
            PipelineStage::Sent => "sent",
            PipelineStage::ParsedOk => "parsed_ok",
            PipelineStage::ParsedFailed => "parsed_failed",
        };
        f.write_str(name)
    }
}

/// Everything handed back to the caller for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    pub outcome: ForecastOutcome,
    /// Present only when the outcome has at least one row.
    pub chart: Option<ChartSpec>,
}

#[derive(Clone)]
pub struct ForecastPipeline {
    history: Arc<dyn HistoricalDataSource>,
    model: Arc<dyn GenerativeForecastClient>,
    upstream_timeout: Duration,
}

impl ForecastPipeline {
    pub fn new(
        history: Arc<dyn HistoricalDataSource>,
        model: Arc<dyn GenerativeForecastClient>,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            history,
            model,
            upstream_timeout,
        }
    }

    pub async fn run(&self, query: ForecastQuery) -> Result<ForecastReport, PipelineError> {
        let span = tracing::info_span!(
            "forecast",
            run_id = %Uuid::new_v4(),
            region = %query.region,
            occupation = %query.occupation,
            horizon = query.horizon_years,
        );
        self.run_stages(query).instrument(span).await
    }

    async fn run_stages(&self, query: ForecastQuery) -> Result<ForecastReport, PipelineError> {
        let history = self
            .history
            .fetch_observations(query.region, query.occupation)
            .await
            .map_err(PipelineError::HistoricalData)?;

        let request =
            build_forecast_request(&query, &history).map_err(PipelineError::RequestConstruction)?;
        let window = request.window;
        info!(
            stage = %PipelineStage::Built,
            "Built forecast request from {} historical rows for {}-{}",
            history.len(),
            window.start_year,
            window.end_year
        );

        let reply = tokio::time::timeout(self.upstream_timeout, self.model.generate(&request.text))
            .await
            .map_err(|_| PipelineError::UpstreamTimeout {
                seconds: self.upstream_timeout.as_secs(),
            })?
            .map_err(PipelineError::UpstreamUnavailable)?;
        info!(
            stage = %PipelineStage::Sent,
            "Received {} chars from generative service",
            reply.as_str().len()
        );

        let outcome =
            parse_forecast_reply(reply.as_str(), query.region, query.occupation, window);
        log_outcome(&outcome);

        let chart = build_chart(outcome.dataset(), query.region, &outcome.window());
        Ok(ForecastReport { outcome, chart })
    }
}

fn log_outcome(outcome: &ForecastOutcome) {
    let stage = match outcome {
        ForecastOutcome::Forecast { .. } | ForecastOutcome::EmptyForecast { .. } => {
            PipelineStage::ParsedOk
        }
        _ => PipelineStage::ParsedFailed,
    };
    info!(
        stage = %stage,
        status = outcome.status(),
        "Parsed reply: {} rows, {} rejected, {} chars of narrative",
        outcome.dataset().len(),
        outcome.rejected().len(),
        outcome.narrative().len()
    );

    for rejection in outcome.rejected() {
        warn!("Rejected forecast row {}: {}", rejection.index, rejection.reason);
    }

    match outcome {
        ForecastOutcome::NoStructuredData { raw_text, .. } => {
            warn!("No JSON array found in {} char reply", raw_text.len());
        }
        ForecastOutcome::MalformedStructuredData {
            diagnostic,
            payload,
            ..
        } => {
            warn!(
                "Forecast payload failed to decode: {diagnostic}; payload: {}",
                payload.chars().take(200).collect::<String>()
            );
        }
        _ => {}
    }
}
