use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use std::sync::Arc;

use crate::metrics::MetricRegistry;

pub type SharedRegistry = Arc<MetricRegistry>;

/// Content type of the Prometheus text exposition format.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render the registry as it is right now. Never waits on the scrape loop
/// beyond the registry's own short-lived lock, and never fails.
pub async fn metrics_handler(State(registry): State<SharedRegistry>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        registry.render(),
    )
}

pub async fn index_handler() -> Html<&'static str> {
    Html(
        "<html><head><title>GPU Exporter</title></head>\
         <body><h1>GPU Exporter</h1><p><a href=\"/metrics\">Metrics</a></p></body></html>",
    )
}
