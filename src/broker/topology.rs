use lapin::options::{ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions};
use lapin::types::{AMQPValue, FieldTable};
use lapin::{Channel, ExchangeKind};

use super::errors::BrokerError;

/// Central topic exchange all system events flow through.
pub(crate) const EXCHANGE_EVENTS: &str = "events";

// Ten minutes is the current SLA for message processing, applied as the
// per-queue message TTL.
pub(crate) const MESSAGE_TTL_MS: i32 = 1000 * 60 * 10;

/// Backing queue and binding key for each event type this service
/// provisions. The binding key is the event's routing key, so a published
/// event always has at least this queue to land in.
pub(crate) const EVENT_QUEUES: &[(&str, &str)] = &[
    ("events.image_scan_uploaded", "events.scan.image.uploaded"),
    ("events.photo_scan_uploaded", "events.photoscan.uploaded"),
    ("events.photo_scan_sampled", "events.photoscan.sampled"),
];

/// Declare the exchange, queues, and bindings this service depends on,
/// short-circuiting on the first failure.
///
/// Declarations are idempotent at the broker, so running this again after a
/// reconnect is safe.
pub(crate) async fn declare(channel: &Channel) -> Result<(), BrokerError> {
    channel
        .exchange_declare(
            EXCHANGE_EVENTS,
            ExchangeKind::Topic,
            ExchangeDeclareOptions {
                durable: true,
                ..ExchangeDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(BrokerError::Topology)?;

    for &(queue, routing_key) in EVENT_QUEUES {
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                sla_arguments(),
            )
            .await
            .map_err(BrokerError::Topology)?;

        channel
            .queue_bind(
                queue,
                EXCHANGE_EVENTS,
                routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(BrokerError::Topology)?;
    }

    Ok(())
}

fn sla_arguments() -> FieldTable {
    let mut arguments = FieldTable::default();
    arguments.insert("x-message-ttl".into(), AMQPValue::LongInt(MESSAGE_TTL_MS));
    arguments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::mq::{
        system_event::Event, EventImageScanUploaded, EventPhotoScanSampled,
        EventPhotoScanUploaded,
    };

    #[test]
    fn test_sla_arguments_set_message_ttl() {
        let rendered = format!("{:?}", sla_arguments());
        assert!(rendered.contains("x-message-ttl"));
        assert!(rendered.contains("600000"));
    }

    #[test]
    fn test_queues_and_binding_keys_are_distinct() {
        for (index, &(queue, routing_key)) in EVENT_QUEUES.iter().enumerate() {
            for &(other_queue, other_key) in &EVENT_QUEUES[index + 1..] {
                assert_ne!(queue, other_queue);
                assert_ne!(routing_key, other_key);
            }
        }
    }

    #[test]
    fn test_every_event_variant_has_a_binding() {
        let variants = [
            Event::ImageScanUploaded(EventImageScanUploaded {
                id: "scan-1".to_string(),
            }),
            Event::PhotoScanUploaded(EventPhotoScanUploaded {
                id: "scan-1".to_string(),
            }),
            Event::PhotoScanSampled(EventPhotoScanSampled {
                id: "scan-1".to_string(),
            }),
        ];

        for variant in &variants {
            assert!(
                EVENT_QUEUES
                    .iter()
                    .any(|&(_, key)| key == variant.routing_key()),
                "no queue bound for routing key {}",
                variant.routing_key()
            );
        }
    }
}
