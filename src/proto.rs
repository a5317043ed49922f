//! Generated wire contracts plus the hand-written pieces the generated code
//! does not carry: routing keys for event payloads and error constructors.

use std::collections::HashMap;

pub mod core {
    tonic::include_proto!("core");
}

pub mod mq {
    tonic::include_proto!("mq");
}

use mq::system_event;

// The `system_event::Event` oneof is the full set of message types that may
// be emitted to the events exchange. Adding a variant here without a matching
// queue binding in the broker topology leaves the event unroutable.
impl system_event::Event {
    /// Routing key for this event, used both when publishing and for the
    /// queue binding provisioned at startup.
    pub fn routing_key(&self) -> &'static str {
        match self {
            system_event::Event::ImageScanUploaded(_) => "events.scan.image.uploaded",
            system_event::Event::PhotoScanUploaded(_) => "events.photoscan.uploaded",
            system_event::Event::PhotoScanSampled(_) => "events.photoscan.sampled",
        }
    }
}

impl core::Error {
    /// Vanilla 500 error.
    ///
    /// Every broker-side failure is reported to callers as this value;
    /// transport detail stays in the logs.
    pub fn internal() -> Self {
        Self {
            message: "Internal server error. We're working on it.".to_string(),
            status: 500,
            code: String::new(),
            meta: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mq::{
        system_event::Event, EventImageScanUploaded, EventPhotoScanSampled,
        EventPhotoScanUploaded,
    };
    use super::*;

    #[test]
    fn test_routing_keys_are_fixed_per_variant() {
        let uploaded = Event::ImageScanUploaded(EventImageScanUploaded {
            id: "scan-1".to_string(),
        });
        assert_eq!(uploaded.routing_key(), "events.scan.image.uploaded");

        // The key is a property of the variant, not of the payload id.
        let other = Event::ImageScanUploaded(EventImageScanUploaded {
            id: "scan-2".to_string(),
        });
        assert_eq!(other.routing_key(), uploaded.routing_key());

        let photo = Event::PhotoScanUploaded(EventPhotoScanUploaded {
            id: "scan-1".to_string(),
        });
        assert_eq!(photo.routing_key(), "events.photoscan.uploaded");

        let sampled = Event::PhotoScanSampled(EventPhotoScanSampled {
            id: "scan-1".to_string(),
        });
        assert_eq!(sampled.routing_key(), "events.photoscan.sampled");
    }

    #[test]
    fn test_internal_error_shape() {
        let error = core::Error::internal();
        assert_eq!(error.status, 500);
        assert!(!error.message.is_empty());
        assert!(error.code.is_empty());
        assert!(error.meta.is_empty());
    }
}
