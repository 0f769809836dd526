// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::handlers::{index_handler, metrics_handler};
use crate::common::config::ExporterConfig;
use crate::device::DeviceEnumerator;
use crate::error::Result;
use crate::metrics::{register_gpu_metrics, MetricRegistry};
use crate::scraper::Scraper;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gpu_exporter=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Cancel `cancel` on Ctrl+C, or on SIGTERM on Unix systems.
pub fn cancel_on_shutdown_signal(cancel: CancellationToken) {
    let token = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("Failed to listen for Ctrl+C: {e}");
                return;
            }
        }
        token.cancel();
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                return;
            }
        };
        sigterm.recv().await;
        tracing::info!("Received SIGTERM, shutting down");
        cancel.cancel();
    });
}

/// Routes served by the exporter.
pub fn router(registry: Arc<MetricRegistry>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(registry)
        .layer(TraceLayer::new_for_http())
}

/// Serve the exposition endpoint on `listener` until `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<MetricRegistry>,
    cancel: CancellationToken,
) -> Result<()> {
    let shutdown = async move {
        cancel.cancelled().await;
        tracing::info!("Metrics endpoint shutting down");
    };
    axum::serve(listener, router(registry))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Register the gauges, bind the listener, then run the scrape loop and the
/// endpoint side by side until `cancel` fires.
///
/// Returns an error if the listener cannot be bound or the server fails.
/// `cancel` is cancelled on every return path, so other tasks sharing the
/// token stop too, and the scrape loop has finished before this returns.
pub async fn run_exporter<E>(
    config: &ExporterConfig,
    enumerator: Arc<E>,
    cancel: CancellationToken,
) -> Result<()>
where
    E: DeviceEnumerator + 'static,
{
    let shutdown = cancel.clone().drop_guard();

    let registry = Arc::new(MetricRegistry::new());
    register_gpu_metrics(&registry, config.power_unit)?;

    let listener = TcpListener::bind(config.listen_addr()).await?;
    tracing::info!(
        "Metrics endpoint listening on http://{}/metrics",
        listener.local_addr()?
    );

    let scraper = Scraper::new(enumerator, registry.clone(), config.power_unit);
    let scrape_task = tokio::spawn(scraper.run(config.interval, cancel.clone()));

    let served = serve(listener, registry, cancel.clone()).await;
    if let Err(e) = &served {
        tracing::error!("Metrics endpoint failed: {e}");
    }

    drop(shutdown);
    if let Err(e) = scrape_task.await {
        tracing::error!("Scrape loop task failed: {e}");
    }
    served
}
