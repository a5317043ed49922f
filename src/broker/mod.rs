//! Broker connection, topology, and publish subsystem.
//!
//! All cached connection state lives behind one lock: concurrent RPC
//! handlers serialize on acquire-or-invalidate, so two callers observing an
//! empty cache collapse into a single dial attempt.

mod channel_manager;
mod connection;
mod errors;
mod publisher;
mod recovery;
mod topology;

use std::time::Duration;

use tokio::sync::Mutex;
use tracing::info;

use crate::config::Config;
use crate::proto::core;
use crate::proto::mq::{system_event, Context, SystemEvent};

use channel_manager::ChannelManager;
use connection::ConnectionManager;

/// Facade over the broker subsystem used by the RPC layer.
pub struct Broker {
    channels: Mutex<ChannelManager>,
    publish_timeout: Duration,
}

impl Broker {
    /// Build a broker handle. No I/O happens until the first operation.
    pub fn new(config: &Config) -> Self {
        let connections = ConnectionManager::new(
            config.broker_connection_string.clone(),
            config.connect_timeout(),
        );
        Self {
            channels: Mutex::new(ChannelManager::new(connections)),
            publish_timeout: config.publish_timeout(),
        }
    }

    /// Ensure the exchange, queues, and bindings this service needs exist.
    ///
    /// Called once at startup and safe to call again: declarations are
    /// idempotent at the broker. On failure, cached state is reset and the
    /// uniform structured error is returned; the process stays up.
    pub async fn ensure_topology(&self) -> Result<(), core::Error> {
        info!("Ensuring broker topology");
        let mut channels = self.channels.lock().await;

        let channel = match channels.acquire().await {
            Ok(channel) => channel,
            Err(err) => return Err(recovery::reset_on_error(&mut channels, &err).await),
        };

        if let Err(err) = topology::declare(&channel).await {
            return Err(recovery::reset_on_error(&mut channels, &err).await);
        }

        Ok(())
    }

    /// Publish one system event to the events exchange.
    ///
    /// Encoding failures are reported without touching cached broker state;
    /// any broker-side failure resets it so the next call starts from a
    /// fresh dial.
    pub async fn publish_event(
        &self,
        payload: system_event::Event,
        context: Option<Context>,
    ) -> Result<(), core::Error> {
        let routing_key = payload.routing_key();
        let envelope = SystemEvent {
            context,
            event: Some(payload),
        };
        let body = match publisher::encode_envelope(&envelope) {
            Ok(body) => body,
            Err(err) => return Err(recovery::classify(&err)),
        };

        let mut channels = self.channels.lock().await;

        let channel = match channels.acquire().await {
            Ok(channel) => channel,
            Err(err) => return Err(recovery::reset_on_error(&mut channels, &err).await),
        };

        if let Err(err) =
            publisher::publish(&channel, routing_key, &body, self.publish_timeout).await
        {
            return Err(recovery::reset_on_error(&mut channels, &err).await);
        }

        Ok(())
    }
}
