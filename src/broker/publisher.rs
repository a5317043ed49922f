use std::time::Duration;

use chrono::Utc;
use lapin::options::BasicPublishOptions;
use lapin::{BasicProperties, Channel};
use prost::Message;
use tokio::time::timeout;
use tracing::debug;
use uuid::Uuid;

use super::errors::BrokerError;
use super::topology::EXCHANGE_EVENTS;
use crate::proto::mq::SystemEvent;

/// Application identifier stamped on every published message.
pub(crate) const APP_ID: &str = "mq-service";

/// Content type tag for the protobuf-encoded envelope.
pub(crate) const CONTENT_TYPE: &str = "application/protobuf";

const DELIVERY_MODE_PERSISTENT: u8 = 2;

/// Encode the envelope into its wire form.
///
/// A failure here is a local bug, not a broker fault: it must never reach
/// the recovery path that resets cached connection state.
pub(crate) fn encode_envelope(envelope: &SystemEvent) -> Result<Vec<u8>, BrokerError> {
    let mut body = Vec::with_capacity(envelope.encoded_len());
    envelope.encode(&mut body)?;
    Ok(body)
}

/// Publish an encoded envelope to the events exchange.
///
/// Messages are persistent and flagged mandatory: an event with no matching
/// binding is a topology bug, not something to drop silently. Broker
/// acknowledgement is not awaited, so success means written to the wire.
pub(crate) async fn publish(
    channel: &Channel,
    routing_key: &str,
    body: &[u8],
    publish_timeout: Duration,
) -> Result<(), BrokerError> {
    let properties = BasicProperties::default()
        .with_message_id(Uuid::new_v4().to_string().into())
        .with_content_type(CONTENT_TYPE.into())
        .with_timestamp(Utc::now().timestamp() as u64)
        .with_app_id(APP_ID.into())
        .with_delivery_mode(DELIVERY_MODE_PERSISTENT);

    let deliver = channel.basic_publish(
        EXCHANGE_EVENTS,
        routing_key,
        BasicPublishOptions {
            mandatory: true,
            ..BasicPublishOptions::default()
        },
        body,
        properties,
    );

    match timeout(publish_timeout, deliver).await {
        Ok(Ok(_confirmation)) => {
            debug!(
                exchange = EXCHANGE_EVENTS,
                routing_key, "Published system event"
            );
            Ok(())
        }
        Ok(Err(err)) => Err(BrokerError::Publish(err)),
        Err(_) => Err(BrokerError::Timeout {
            operation: "publish",
            after: publish_timeout,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::mq::{system_event::Event, Context, EventImageScanUploaded, SystemEvent};

    fn sample_envelope() -> SystemEvent {
        SystemEvent {
            context: Some(Context {
                trace_id: "trace-1".to_string(),
                actor_id: "scan-service".to_string(),
            }),
            event: Some(Event::ImageScanUploaded(EventImageScanUploaded {
                id: "scan-42".to_string(),
            })),
        }
    }

    #[test]
    fn test_encode_envelope_preserves_context_and_payload() {
        let envelope = sample_envelope();
        let body = encode_envelope(&envelope).expect("envelope encodes");

        let decoded = SystemEvent::decode(body.as_slice()).expect("envelope decodes");
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_encode_into_exhausted_buffer_is_a_serialization_error() {
        let envelope = sample_envelope();
        let mut full: &mut [u8] = &mut [];
        let err = envelope.encode(&mut full).unwrap_err();

        assert!(matches!(
            BrokerError::from(err),
            BrokerError::Serialization(_)
        ));
    }
}
