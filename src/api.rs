//! gRPC listener for the service.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use tonic::transport::Server;
use tonic_health::server::health_reporter;
use tracing::info;

use crate::broker::Broker;
use crate::config::Config;
use crate::proto::mq::internal_mq_service_server::InternalMqServiceServer;
use crate::service::MqService;

/// Serve the internal MQ API on the configured port.
///
/// Listener setup failure is fatal to the process; broker trouble is not.
pub async fn listen(config: &Config, broker: Arc<Broker>) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", config.port)
        .parse()
        .context("Failed to build the API listen address")?;

    let (mut health_reporter, health_service) = health_reporter();
    health_reporter
        .set_service_status("", tonic_health::ServingStatus::Serving)
        .await;

    info!(port = config.port, "MQ service is listening");
    Server::builder()
        .add_service(health_service)
        .add_service(InternalMqServiceServer::new(MqService::new(broker)))
        .serve_with_shutdown(addr, shutdown_signal())
        .await
        .context("API listener failed")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received, stopping listener");
    }
}
