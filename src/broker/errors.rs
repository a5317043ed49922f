use std::time::Duration;

use thiserror::Error;

/// Classified failures from the broker subsystem.
///
/// lapin's native error type stops here: callers above the broker facade
/// only ever see the structured error produced by the recovery controller.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Broker dial failed: {0}")]
    Connect(#[source] lapin::Error),

    #[error("Channel open failed: {0}")]
    Channel(#[source] lapin::Error),

    #[error("Topology declaration failed: {0}")]
    Topology(#[source] lapin::Error),

    #[error("Publish failed: {0}")]
    Publish(#[source] lapin::Error),

    #[error("Event encoding failed: {0}")]
    Serialization(#[from] prost::EncodeError),

    #[error("Broker {operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}
