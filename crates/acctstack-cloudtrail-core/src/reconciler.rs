//! Fetch-diff-write reconciliation of a trail's event selectors.

use std::sync::Arc;

use tracing::{debug, info};

use acctstack_cloudtrail_model::{DesiredSpec, EventSelector, ReconcileError, RequestType};

use crate::selector_set::EventSelectorSet;
use crate::store::TrailSelectorStore;

/// Compute the selectors to write for one request.
///
/// - `Create` unions the desired data resources into `current`.
/// - `Update` subtracts `previous` and then unions `spec`. If the trail name
///   changed, the resource was replaced and the old trail is cleaned up by the
///   Delete CloudFormation sends for it, so nothing is subtracted here.
/// - `Delete` subtracts `spec`.
///
/// The management event selection is applied last for every request type and
/// is a no-op when `spec` does not set it.
#[must_use]
pub fn reconcile_selectors(
    operation: RequestType,
    current: &[EventSelector],
    spec: &DesiredSpec,
    previous: Option<&DesiredSpec>,
) -> Vec<EventSelector> {
    let mut selectors = EventSelectorSet::from_wire(current);

    match operation {
        RequestType::Create => selectors.union(&spec.data_event_selectors),
        RequestType::Update => {
            if let Some(previous) = previous.filter(|p| p.trail_name == spec.trail_name) {
                selectors.subtract(&previous.data_event_selectors);
            }
            selectors.union(&spec.data_event_selectors);
        }
        RequestType::Delete => selectors.subtract(&spec.data_event_selectors),
    }

    if let Some(selection) = spec.management_event_read_write_type {
        selectors.select_management_events(selection);
    }

    selectors.to_wire()
}

/// Applies [`DesiredSpec`]s to trails through a [`TrailSelectorStore`].
///
/// Each call fetches the trail's selectors, computes the new document with
/// [`reconcile_selectors`] and writes it back in a single call. The two calls
/// are not atomic: a concurrent writer's change is lost. Callers must not
/// reconcile the same trail concurrently and should manage a trail from a
/// single template resource only.
#[derive(Debug, Clone)]
pub struct EventSelectorReconciler {
    store: Arc<dyn TrailSelectorStore>,
}

impl EventSelectorReconciler {
    /// Create a reconciler writing through `store`.
    #[must_use]
    pub fn new(store: Arc<dyn TrailSelectorStore>) -> Self {
        Self { store }
    }

    /// Reconcile `spec.trail_name` for one lifecycle request.
    ///
    /// `previous` is required for `Update` and ignored otherwise.
    pub async fn reconcile(
        &self,
        operation: RequestType,
        spec: &DesiredSpec,
        previous: Option<&DesiredSpec>,
    ) -> Result<(), ReconcileError> {
        spec.validate()?;
        if operation == RequestType::Update && previous.is_none() {
            return Err(ReconcileError::ValidationFailed(
                "Update request is missing the previous properties".to_owned(),
            ));
        }

        let trail = spec.trail_name.as_str();
        let current = self
            .store
            .get_event_selectors(trail)
            .await
            .map_err(|e| ReconcileError::FetchFailed {
                trail: trail.to_owned(),
                message: e.to_string(),
            })?;

        let selectors = reconcile_selectors(operation, &current, spec, previous);
        debug!(trail, ?selectors, "computed event selectors");

        let written = selectors.len();
        self.store
            .put_event_selectors(trail, selectors)
            .await
            .map_err(|e| ReconcileError::WriteFailed {
                trail: trail.to_owned(),
                message: e.to_string(),
            })?;

        info!(
            trail,
            operation = %operation,
            fetched = current.len(),
            written,
            "event selectors reconciled"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use async_trait::async_trait;
    use serde_json::json;

    use acctstack_cloudtrail_model::{
        DataEventSelectors, DataResource, ManagementEventSelection, ReadWriteType,
    };

    use super::*;
    use crate::store::{InMemoryTrailStore, TrailStoreError};

    const S3_OBJECT: &str = "AWS::S3::Object";

    fn spec(value: serde_json::Value) -> DesiredSpec {
        DesiredSpec::from_properties(&value).unwrap()
    }

    fn arns(selectors: &[EventSelector], rw: ReadWriteType) -> BTreeSet<String> {
        selectors
            .iter()
            .filter(|s| s.read_write_type == Some(rw))
            .flat_map(|s| s.data_resources.iter())
            .flat_map(|d| d.values.iter().cloned())
            .collect()
    }

    fn flags(selectors: &[EventSelector]) -> BTreeMap<Option<ReadWriteType>, Option<bool>> {
        selectors
            .iter()
            .map(|s| (s.read_write_type, s.include_management_events))
            .collect()
    }

    fn existing_trail() -> Vec<EventSelector> {
        vec![
            EventSelector {
                read_write_type: Some(ReadWriteType::All),
                include_management_events: Some(true),
                data_resources: vec![DataResource {
                    resource_type: S3_OBJECT.to_owned(),
                    values: vec!["arn:aws:s3:::audit/".to_owned()],
                }],
                exclude_management_event_sources: Vec::new(),
            },
            EventSelector {
                read_write_type: Some(ReadWriteType::ReadOnly),
                include_management_events: Some(false),
                data_resources: vec![DataResource {
                    resource_type: "AWS::Lambda::Function".to_owned(),
                    values: vec!["arn:aws:lambda".to_owned()],
                }],
                exclude_management_event_sources: Vec::new(),
            },
        ]
    }

    #[test]
    fn test_should_create_single_record_from_empty_trail() {
        let create = spec(json!({
            "TrailName": "t",
            "ManagementEventReadWriteType": "All",
            "DataEventSelectors": { "All": { S3_OBJECT: ["arn:aws:s3:::bucket-a/"] } }
        }));

        let out = reconcile_selectors(RequestType::Create, &[], &create, None);

        assert_eq!(
            out,
            vec![EventSelector {
                read_write_type: Some(ReadWriteType::All),
                include_management_events: Some(true),
                data_resources: vec![DataResource {
                    resource_type: S3_OBJECT.to_owned(),
                    values: vec!["arn:aws:s3:::bucket-a/".to_owned()],
                }],
                exclude_management_event_sources: Vec::new(),
            }]
        );
    }

    #[test]
    fn test_should_be_idempotent_on_create() {
        let create = spec(json!({
            "TrailName": "t",
            "DataEventSelectors": {
                "All": { S3_OBJECT: ["arn:aws:s3:::a/"] },
                "WriteOnly": { S3_OBJECT: ["arn:aws:s3:::b/"] }
            }
        }));
        let once = reconcile_selectors(RequestType::Create, &existing_trail(), &create, None);
        let twice = reconcile_selectors(RequestType::Create, &once, &create, None);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_should_retract_then_apply_on_update() {
        let s1 = spec(json!({
            "TrailName": "t",
            "DataEventSelectors": {
                "All": { S3_OBJECT: ["arn:aws:s3:::a/", "arn:aws:s3:::shared/"] }
            }
        }));
        let s2 = spec(json!({
            "TrailName": "t",
            "DataEventSelectors": {
                "All": { S3_OBJECT: ["arn:aws:s3:::shared/", "arn:aws:s3:::c/"] }
            }
        }));
        let initial = existing_trail();

        let after_create = reconcile_selectors(RequestType::Create, &initial, &s1, None);
        let after_update = reconcile_selectors(RequestType::Update, &after_create, &s2, Some(&s1));

        // (initial - S1) ∪ S2
        let expected: BTreeSet<String> = [
            "arn:aws:s3:::audit/",
            "arn:aws:s3:::shared/",
            "arn:aws:s3:::c/",
        ]
        .into_iter()
        .map(str::to_owned)
        .collect();
        assert_eq!(arns(&after_update, ReadWriteType::All), expected);
        assert_eq!(
            arns(&after_update, ReadWriteType::ReadOnly),
            arns(&initial, ReadWriteType::ReadOnly)
        );
    }

    #[test]
    fn test_should_move_selector_between_partitions_on_update() {
        let s1 = spec(json!({
            "TrailName": "t",
            "ManagementEventReadWriteType": "All",
            "DataEventSelectors": { "All": { S3_OBJECT: ["arn:aws:s3:::bucket-a/"] } }
        }));
        let s2 = spec(json!({
            "TrailName": "t",
            "DataEventSelectors": { "WriteOnly": { S3_OBJECT: ["arn:aws:s3:::bucket-b/"] } }
        }));

        let created = reconcile_selectors(RequestType::Create, &[], &s1, None);
        let updated = reconcile_selectors(RequestType::Update, &created, &s2, Some(&s1));

        // The management flag is untouched by s2, so `All` survives without
        // data resources.
        assert_eq!(updated.len(), 2);
        let all = &updated[1];
        assert_eq!(all.read_write_type, Some(ReadWriteType::All));
        assert_eq!(all.include_management_events, Some(true));
        assert!(all.data_resources.is_empty());

        let write = &updated[0];
        assert_eq!(write.read_write_type, Some(ReadWriteType::WriteOnly));
        assert_eq!(write.include_management_events, Some(false));
        assert_eq!(write.data_resources[0].values, vec!["arn:aws:s3:::bucket-b/"]);
    }

    #[test]
    fn test_should_drop_partition_emptied_by_update() {
        let s1 = spec(json!({
            "TrailName": "t",
            "DataEventSelectors": { "All": { S3_OBJECT: ["arn:aws:s3:::bucket-a/"] } }
        }));
        let s2 = spec(json!({
            "TrailName": "t",
            "DataEventSelectors": { "WriteOnly": { S3_OBJECT: ["arn:aws:s3:::bucket-b/"] } }
        }));

        let created = reconcile_selectors(RequestType::Create, &[], &s1, None);
        let updated = reconcile_selectors(RequestType::Update, &created, &s2, Some(&s1));

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].read_write_type, Some(ReadWriteType::WriteOnly));
    }

    #[test]
    fn test_should_skip_retraction_when_trail_replaced() {
        let old = spec(json!({
            "TrailName": "old-trail",
            "DataEventSelectors": { "All": { S3_OBJECT: ["arn:aws:s3:::audit/"] } }
        }));
        let new = spec(json!({ "TrailName": "new-trail" }));

        let out = reconcile_selectors(RequestType::Update, &existing_trail(), &new, Some(&old));
        assert!(arns(&out, ReadWriteType::All).contains("arn:aws:s3:::audit/"));
    }

    #[test]
    fn test_should_return_to_empty_after_create_then_delete() {
        let s = spec(json!({
            "TrailName": "t",
            "DataEventSelectors": {
                "All": { S3_OBJECT: ["arn:aws:s3:::a/"] },
                "ReadOnly": { "AWS::Lambda::Function": ["arn:aws:lambda:us-east-1:123456789012:function:f"] }
            }
        }));
        let created = reconcile_selectors(RequestType::Create, &[], &s, None);
        assert_eq!(created.len(), 2);

        let deleted = reconcile_selectors(RequestType::Delete, &created, &s, None);
        assert!(deleted.is_empty());
    }

    #[test]
    fn test_should_keep_management_events_exclusive_across_invocations() {
        let read_only = spec(json!({ "TrailName": "t", "ManagementEventReadWriteType": "ReadOnly" }));
        let all = spec(json!({ "TrailName": "t", "ManagementEventReadWriteType": "All" }));

        let first = reconcile_selectors(RequestType::Create, &existing_trail(), &read_only, None);
        let second = reconcile_selectors(RequestType::Update, &first, &all, Some(&read_only));

        let flagged: Vec<_> = second
            .iter()
            .filter(|s| s.include_management_events == Some(true))
            .map(|s| s.read_write_type)
            .collect();
        assert_eq!(flagged, vec![Some(ReadWriteType::All)]);
    }

    #[test]
    fn test_should_leave_management_flags_untouched_when_unset() {
        let s = spec(json!({
            "TrailName": "t",
            "DataEventSelectors": { "WriteOnly": { S3_OBJECT: ["arn:aws:s3:::new/"] } }
        }));
        let initial = existing_trail();
        let out = reconcile_selectors(RequestType::Create, &initial, &s, None);

        let before = flags(&initial);
        let after = flags(&out);
        for (rw, flag) in &before {
            assert_eq!(after.get(rw), Some(flag));
        }
        assert_eq!(after.get(&Some(ReadWriteType::WriteOnly)), Some(&Some(false)));
    }

    #[test]
    fn test_should_never_serialize_vacuous_selectors() {
        let s = spec(json!({
            "TrailName": "t",
            "ManagementEventReadWriteType": "None",
            "DataEventSelectors": { "All": { S3_OBJECT: ["arn:aws:s3:::audit/"] } }
        }));
        let out = reconcile_selectors(RequestType::Delete, &existing_trail(), &s, None);

        assert!(out.iter().all(|sel| {
            sel.include_management_events == Some(true) || !sel.data_resources.is_empty()
        }));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].read_write_type, Some(ReadWriteType::ReadOnly));
    }

    #[derive(Debug, Default)]
    struct FailingStore {
        fail_get: bool,
    }

    #[async_trait]
    impl TrailSelectorStore for FailingStore {
        async fn get_event_selectors(
            &self,
            _trail: &str,
        ) -> Result<Vec<EventSelector>, TrailStoreError> {
            if self.fail_get {
                Err(TrailStoreError::Api("throttled".to_owned()))
            } else {
                Ok(Vec::new())
            }
        }

        async fn put_event_selectors(
            &self,
            _trail: &str,
            _selectors: Vec<EventSelector>,
        ) -> Result<(), TrailStoreError> {
            Err(TrailStoreError::Api("InvalidEventSelectorsException".to_owned()))
        }
    }

    #[tokio::test]
    async fn test_should_write_reconciled_document_to_store() {
        let store = Arc::new(InMemoryTrailStore::new());
        store.insert_trail("t", existing_trail());
        let reconciler = EventSelectorReconciler::new(store.clone());

        let s = spec(json!({
            "TrailName": "t",
            "ManagementEventReadWriteType": "WriteOnly",
            "DataEventSelectors": { "WriteOnly": { S3_OBJECT: ["arn:aws:s3:::w/"] } }
        }));
        reconciler.reconcile(RequestType::Create, &s, None).await.unwrap();

        let stored = store.selectors("t").unwrap();
        assert_eq!(
            flags(&stored).get(&Some(ReadWriteType::WriteOnly)),
            Some(&Some(true))
        );
        assert!(arns(&stored, ReadWriteType::WriteOnly).contains("arn:aws:s3:::w/"));
    }

    #[tokio::test]
    async fn test_should_ignore_previous_properties_on_create() {
        let store = Arc::new(InMemoryTrailStore::new());
        store.insert_trail(
            "t",
            vec![EventSelector {
                read_write_type: Some(ReadWriteType::All),
                include_management_events: Some(false),
                data_resources: vec![DataResource {
                    resource_type: S3_OBJECT.to_owned(),
                    values: vec!["arn:aws:s3:::keep/".to_owned()],
                }],
                exclude_management_event_sources: Vec::new(),
            }],
        );
        let reconciler = EventSelectorReconciler::new(store.clone());

        let stale = spec(json!({
            "TrailName": "t",
            "DataEventSelectors": { "All": { S3_OBJECT: ["arn:aws:s3:::keep/"] } }
        }));
        reconciler
            .reconcile(RequestType::Create, &spec(json!({ "TrailName": "t" })), Some(&stale))
            .await
            .unwrap();

        let stored = store.selectors("t").unwrap();
        assert_eq!(stored.len(), 1);
        assert!(arns(&stored, ReadWriteType::All).contains("arn:aws:s3:::keep/"));
    }

    #[tokio::test]
    async fn test_should_report_fetch_failure() {
        let reconciler = EventSelectorReconciler::new(Arc::new(FailingStore { fail_get: true }));
        let err = reconciler
            .reconcile(RequestType::Create, &spec(json!({ "TrailName": "t" })), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::FetchFailed { ref message, .. } if message == "throttled"));
    }

    #[tokio::test]
    async fn test_should_report_write_failure() {
        let reconciler = EventSelectorReconciler::new(Arc::new(FailingStore::default()));
        let err = reconciler
            .reconcile(RequestType::Delete, &spec(json!({ "TrailName": "t" })), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::WriteFailed { .. }));
    }

    #[tokio::test]
    async fn test_should_reject_update_without_previous_spec() {
        let store = Arc::new(InMemoryTrailStore::new());
        store.insert_trail("t", Vec::new());
        let reconciler = EventSelectorReconciler::new(store);

        let err = reconciler
            .reconcile(RequestType::Update, &spec(json!({ "TrailName": "t" })), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_should_fail_for_unknown_trail() {
        let reconciler = EventSelectorReconciler::new(Arc::new(InMemoryTrailStore::new()));
        let err = reconciler
            .reconcile(RequestType::Create, &spec(json!({ "TrailName": "ghost" })), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_should_not_require_data_selectors_for_management_only_spec() {
        let s = DesiredSpec {
            trail_name: "t".to_owned(),
            management_event_read_write_type: Some(ManagementEventSelection::ReadOnly),
            data_event_selectors: DataEventSelectors::new(),
        };
        let out = reconcile_selectors(RequestType::Create, &[], &s, None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].read_write_type, Some(ReadWriteType::ReadOnly));
        assert_eq!(out[0].include_management_events, Some(true));
    }
}
