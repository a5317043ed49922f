use lapin::Channel;
use tracing::{info, warn};

use super::connection::ConnectionManager;
use super::errors::BrokerError;

/// Owns the single logical channel multiplexed over the managed connection.
///
/// A channel never outlives its parent connection: invalidating the
/// connection drops the channel in the same step, and a failed channel open
/// tears the connection down as well.
pub(crate) struct ChannelManager {
    connections: ConnectionManager,
    channel: Option<Channel>,
}

impl ChannelManager {
    pub(crate) fn new(connections: ConnectionManager) -> Self {
        ChannelManager {
            connections,
            channel: None,
        }
    }

    /// Return a live channel, opening one (and dialing if necessary) on demand.
    ///
    /// The returned handle is a clone and can be used independently of the
    /// cache slot.
    pub(crate) async fn acquire(&mut self) -> Result<Channel, BrokerError> {
        let connection = self.connections.acquire().await?;

        if self
            .channel
            .as_ref()
            .map_or(false, |channel| channel.status().connected())
        {
            return Ok(self.channel.as_ref().unwrap().clone());
        }
        self.channel = None;

        info!("Opening broker channel");
        match connection.create_channel().await {
            Ok(channel) => {
                self.channel = Some(channel.clone());
                Ok(channel)
            }
            Err(err) => {
                // An unusable channel on an otherwise-live connection is
                // treated as a connection fault.
                self.connections.invalidate().await;
                Err(BrokerError::Channel(err))
            }
        }
    }

    /// Close (best-effort) and forget the cached channel, then the connection.
    pub(crate) async fn invalidate(&mut self) {
        if let Some(channel) = self.channel.take() {
            if let Err(err) = channel.close(0, "resetting broker state").await {
                warn!(error = %err, "Failed to close broker channel during reset");
            }
        }
        self.connections.invalidate().await;
    }
}
