use tracing::error;

use super::channel_manager::ChannelManager;
use super::errors::BrokerError;
use crate::proto::core;

/// Reset cached broker state after a failed operation and hand back the
/// uniform error callers are allowed to see.
///
/// Closes are best-effort: the goal is clearing the cache so the next call
/// re-establishes cleanly, not guaranteeing server-side cleanup.
pub(crate) async fn reset_on_error(
    channels: &mut ChannelManager,
    err: &BrokerError,
) -> core::Error {
    channels.invalidate().await;
    classify(err)
}

/// Log the underlying failure with whatever detail it carries and map it to
/// the one stable error shape exposed across the RPC boundary.
pub(crate) fn classify(err: &BrokerError) -> core::Error {
    match err {
        BrokerError::Connect(cause)
        | BrokerError::Channel(cause)
        | BrokerError::Topology(cause)
        | BrokerError::Publish(cause) => match cause {
            lapin::Error::ProtocolError(protocol) => {
                error!(
                    code = protocol.get_id(),
                    reason = %protocol.get_message(),
                    from_server = true,
                    "{err}"
                );
            }
            other => {
                error!(cause = %other, "{err}");
            }
        },
        BrokerError::Serialization(cause) => {
            error!(cause = %cause, "Failed to encode event envelope");
        }
        BrokerError::Timeout { operation, after } => {
            error!(
                operation,
                after_ms = after.as_millis() as u64,
                "Broker operation timed out"
            );
        }
    }

    core::Error::internal()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use prost::Message;

    #[test]
    fn test_timeout_classifies_to_generic_internal_error() {
        let err = BrokerError::Timeout {
            operation: "dial",
            after: Duration::from_secs(2),
        };

        let classified = classify(&err);
        assert_eq!(classified, core::Error::internal());
    }

    #[test]
    fn test_serialization_classifies_to_generic_internal_error() {
        let context = crate::proto::mq::Context {
            trace_id: "trace-1".to_string(),
            actor_id: "actor-1".to_string(),
        };
        let mut full: &mut [u8] = &mut [];
        let encode_err = context.encode(&mut full).unwrap_err();

        let classified = classify(&BrokerError::Serialization(encode_err));
        assert_eq!(classified.status, 500);
        assert!(classified.meta.is_empty());
    }
}
