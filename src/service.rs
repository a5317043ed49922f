//! `InternalMqService` implementation: one publish RPC per event type.
//!
//! Broker trouble is reported in-band through the response's error field;
//! a gRPC status is reserved for transport-level problems.

use std::sync::Arc;

use tonic::{Request, Response, Status};

use crate::broker::Broker;
use crate::proto::mq::internal_mq_service_server::InternalMqService;
use crate::proto::mq::{
    system_event, EventImageScanUploaded, EventPhotoScanSampled, EventPhotoScanUploaded,
    PubImageScanUploadedRequest, PubImageScanUploadedResponse, PubPhotoScanSampledRequest,
    PubPhotoScanSampledResponse, PubPhotoScanUploadedRequest, PubPhotoScanUploadedResponse,
};

pub struct MqService {
    broker: Arc<Broker>,
}

impl MqService {
    pub fn new(broker: Arc<Broker>) -> Self {
        MqService { broker }
    }
}

#[tonic::async_trait]
impl InternalMqService for MqService {
    async fn pub_image_scan_uploaded(
        &self,
        request: Request<PubImageScanUploadedRequest>,
    ) -> Result<Response<PubImageScanUploadedResponse>, Status> {
        let req = request.into_inner();
        let event = system_event::Event::ImageScanUploaded(EventImageScanUploaded { id: req.id });

        let error = self.broker.publish_event(event, req.context).await.err();
        Ok(Response::new(PubImageScanUploadedResponse { error }))
    }

    async fn pub_photo_scan_uploaded(
        &self,
        request: Request<PubPhotoScanUploadedRequest>,
    ) -> Result<Response<PubPhotoScanUploadedResponse>, Status> {
        let req = request.into_inner();
        let event = system_event::Event::PhotoScanUploaded(EventPhotoScanUploaded { id: req.id });

        let error = self.broker.publish_event(event, req.context).await.err();
        Ok(Response::new(PubPhotoScanUploadedResponse { error }))
    }

    async fn pub_photo_scan_sampled(
        &self,
        request: Request<PubPhotoScanSampledRequest>,
    ) -> Result<Response<PubPhotoScanSampledResponse>, Status> {
        let req = request.into_inner();
        let event = system_event::Event::PhotoScanSampled(EventPhotoScanSampled { id: req.id });

        let error = self.broker.publish_event(event, req.context).await.err();
        Ok(Response::new(PubPhotoScanSampledResponse { error }))
    }
}
