//! Video job worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vclip_queue::{JobBus, Subject};
use vclip_worker::{CallbackClient, HandlerRegistry, JobExecutor, StubHandler, WorkerConfig};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive("vclip=info".parse().unwrap()))
        .init();

    info!("Starting vclip-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let bus = match JobBus::from_env() {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to create job bus: {}", e);
            std::process::exit(1);
        }
    };

    let callbacks = CallbackClient::new(&config);
    let handler: Arc<dyn vclip_worker::JobHandler> = Arc::new(StubHandler::new(callbacks));

    let registry = Subject::ALL.into_iter().fold(HandlerRegistry::new(), |r, subject| r.register(subject, Arc::clone(&handler)));

    let executor = match JobExecutor::new(config, bus, registry) {
        Ok(e) => e,
        Err(e) => {
            error!("Failed to create job executor: {}", e);
            std::process::exit(1);
        }
    };

    let shutdown_handle = tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
    });

    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    shutdown_handle.await.ok();

    info!("Worker shutdown complete");
}
