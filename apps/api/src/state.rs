use crate::forecast::pipeline::ForecastPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// The pipeline holds only shared handles (data source, model client); every
/// request runs it on its own task with no state carried between runs.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: ForecastPipeline,
}
