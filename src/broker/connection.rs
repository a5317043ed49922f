use std::time::Duration;

use lapin::{Connection, ConnectionProperties};
use tokio::time::timeout;
use tracing::{info, warn};

use super::errors::BrokerError;

/// Owns the single physical link to the broker.
///
/// The connection is dialed lazily, cached while it reports itself live, and
/// discarded wholesale by `invalidate`. At most one exists at a time.
pub(crate) struct ConnectionManager {
    uri: String,
    connect_timeout: Duration,
    connection: Option<Connection>,
}

impl ConnectionManager {
    pub(crate) fn new(uri: String, connect_timeout: Duration) -> Self {
        ConnectionManager {
            uri,
            connect_timeout,
            connection: None,
        }
    }

    /// Return the cached connection, dialing a new one if needed.
    pub(crate) async fn acquire(&mut self) -> Result<&Connection, BrokerError> {
        if self
            .connection
            .as_ref()
            .map_or(false, |conn| conn.status().connected())
        {
            return Ok(self.connection.as_ref().unwrap());
        }

        // Drop any stale handle first so a failed dial leaves nothing cached.
        self.connection = None;

        info!("Establishing broker connection");
        let dial = Connection::connect(&self.uri, ConnectionProperties::default());
        let connection = match timeout(self.connect_timeout, dial).await {
            Ok(Ok(connection)) => connection,
            Ok(Err(err)) => return Err(BrokerError::Connect(err)),
            Err(_) => {
                return Err(BrokerError::Timeout {
                    operation: "dial",
                    after: self.connect_timeout,
                })
            }
        };

        self.connection = Some(connection);
        Ok(self.connection.as_ref().unwrap())
    }

    /// Close (best-effort) and forget the cached connection.
    pub(crate) async fn invalidate(&mut self) {
        if let Some(connection) = self.connection.take() {
            if let Err(err) = connection.close(0, "resetting broker state").await {
                warn!(error = %err, "Failed to close broker connection during reset");
            }
        }
    }
}
