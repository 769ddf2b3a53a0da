// Forecast extraction & validation pipeline.
// Implements: request building, the model call boundary, reply parsing, chart shaping.
// All model calls go through llm_client::GenerativeForecastClient.

pub mod data_source;
pub mod handlers;
pub mod pipeline;
pub mod precision;
pub mod prompts;
pub mod query;
pub mod render;
pub mod request_builder;
pub mod response_parser;
