use std::sync::Arc;

use tracing::error;

use mq_service::broker::Broker;
use mq_service::config::Config;
use mq_service::{api, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Invalid configuration aborts before anything else is wired up.
    let config = Config::load()?;
    logging::init(&config);

    let broker = Arc::new(Broker::new(&config));

    // Topology trouble must not take the process down: keep listening and let
    // publishes fail until the broker is reachable again.
    if let Err(err) = broker.ensure_topology().await {
        error!(message = %err.message, "Error while ensuring broker topology");
    }

    api::listen(&config, broker).await
}
