//! Claims Adjudicator Service Binary
//!
//! Runs the claims middleware over the demo in-memory adjudicator:
//! - Structured JSON logging
//! - Request tracing with correlation IDs
//! - Graceful shutdown handling
//! - Health check endpoints
//!
//! ## Configuration
//!
//! Environment variables:
//! - `PORT`: Service port (default: 8080)
//! - `HOST`: Service host (default: 0.0.0.0)
//! - `CLAIMS_PREFIX`: Mount path of the claims routes (default: /claims)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! LOG_FORMAT=pretty cargo run --bin claims_service
//! curl localhost:8080/claims
//! ```

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use claims_middleware::service::{create_app, LogFormat, ServiceConfig};
use claims_middleware::{Adjudicator, InMemoryAdjudicator};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "claims_service=info,claims_middleware=info,tower_http=info".into());

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE)
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_current_span(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .flatten_event(true)
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::from_env()?;

    init_tracing(config.log_format);

    let version = env!("CARGO_PKG_VERSION");
    info!(version = version, "Starting Claims Adjudicator Service");

    let adjudicator = Arc::new(InMemoryAdjudicator::demo());
    info!(
        concept_count = adjudicator.concepts().len(),
        subject_count = adjudicator.num_subjects(),
        "Demo adjudicator initialized"
    );

    let app = create_app(&config, adjudicator)?;

    let addr = config.socket_addr()?;
    info!(
        address = %addr,
        prefix = %config.prefix,
        version = version,
        "Claims Adjudicator Service listening"
    );

    let listener = TcpListener::bind(addr).await?;

    // Graceful shutdown handling
    let shutdown_signal = async {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
            _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Claims Adjudicator Service shutdown complete");

    Ok(())
}
