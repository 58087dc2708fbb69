//! `Custom::CloudTrailEventSelector` request handling.

use std::sync::Arc;

use tracing::{error, info};

use acctstack_cloudtrail_model::{
    CustomResourceRequest, CustomResourceResponse, DesiredSpec, ReconcileError, RequestType,
    ResponseStatus,
};

use crate::reconciler::EventSelectorReconciler;
use crate::store::TrailSelectorStore;

/// Turns CloudFormation custom resource requests into reconciliations.
///
/// The physical resource ID is the trail name, so pointing the resource at a
/// different trail is a replacement: CloudFormation follows up with a Delete
/// carrying the old properties for the old trail.
#[derive(Debug, Clone)]
pub struct EventSelectorResourceHandler {
    reconciler: EventSelectorReconciler,
    log_stream_name: String,
}

impl EventSelectorResourceHandler {
    /// Create a handler writing through `store`.
    ///
    /// `log_stream_name` is quoted in response reasons so stack events point
    /// at the invocation's logs.
    #[must_use]
    pub fn new(store: Arc<dyn TrailSelectorStore>, log_stream_name: impl Into<String>) -> Self {
        Self {
            reconciler: EventSelectorReconciler::new(store),
            log_stream_name: log_stream_name.into(),
        }
    }

    /// Handle one request and build the response to send back.
    ///
    /// Never fails: every error becomes a `FAILED` response.
    pub async fn handle(&self, request: &CustomResourceRequest) -> CustomResourceResponse {
        let spec = DesiredSpec::from_properties(&request.resource_properties);
        let physical_resource_id = match &spec {
            Ok(spec) => spec.trail_name.clone(),
            Err(_) => request
                .physical_resource_id
                .clone()
                .unwrap_or_else(|| request.logical_resource_id.clone()),
        };

        let outcome = match spec {
            Ok(spec) => self.reconcile(request, &spec).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                info!(
                    request_id = %request.request_id,
                    operation = %request.request_type,
                    trail = %physical_resource_id,
                    "event selector resource succeeded"
                );
                CustomResourceResponse::for_request(
                    request,
                    ResponseStatus::Success,
                    format!(
                        "See the details in CloudWatch Log Stream: {}",
                        self.log_stream_name
                    ),
                    physical_resource_id,
                )
            }
            Err(e) => {
                error!(
                    request_id = %request.request_id,
                    operation = %request.request_type,
                    error = %e,
                    "event selector resource failed"
                );
                CustomResourceResponse::for_request(
                    request,
                    ResponseStatus::Failed,
                    format!("{e} (CloudWatch Log Stream: {})", self.log_stream_name),
                    physical_resource_id,
                )
            }
        }
    }

    async fn reconcile(
        &self,
        request: &CustomResourceRequest,
        spec: &DesiredSpec,
    ) -> Result<(), ReconcileError> {
        let previous = match (request.request_type, &request.old_resource_properties) {
            (RequestType::Update, Some(old)) => Some(DesiredSpec::from_properties(old).map_err(
                |e| ReconcileError::ValidationFailed(format!("OldResourceProperties: {e}")),
            )?),
            _ => None,
        };

        self.reconciler
            .reconcile(request.request_type, spec, previous.as_ref())
            .await
    }
}
