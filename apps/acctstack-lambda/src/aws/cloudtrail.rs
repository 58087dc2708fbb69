//! CloudTrail event selector store.

use async_trait::async_trait;
use aws_sdk_cloudtrail::error::ProvideErrorMetadata;
use aws_sdk_cloudtrail::types as sdk;

use acctstack_cloudtrail_core::{TrailSelectorStore, TrailStoreError};
use acctstack_cloudtrail_model::{DataResource, EventSelector, ReadWriteType};

const TRAIL_NOT_FOUND: &str = "TrailNotFoundException";

/// [`TrailSelectorStore`] backed by `GetEventSelectors` / `PutEventSelectors`.
#[derive(Debug, Clone)]
pub struct CloudTrailStore {
    client: aws_sdk_cloudtrail::Client,
}

impl CloudTrailStore {
    /// Wrap a CloudTrail client.
    #[must_use]
    pub fn new(client: aws_sdk_cloudtrail::Client) -> Self {
        Self { client }
    }
}

fn store_error<E>(trail: &str, err: &E) -> TrailStoreError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    if err.code() == Some(TRAIL_NOT_FOUND) {
        TrailStoreError::TrailNotFound(trail.to_owned())
    } else {
        TrailStoreError::Api(super::service_error(err).to_string())
    }
}

fn from_sdk(trail: &str, selector: &sdk::EventSelector) -> Result<EventSelector, TrailStoreError> {
    let read_write_type = match selector.read_write_type() {
        None => None,
        Some(t) => Some(ReadWriteType::from_name(t.as_str()).ok_or_else(|| {
            TrailStoreError::Unsupported {
                trail: trail.to_owned(),
                reason: format!("unrecognized ReadWriteType {:?}", t.as_str()),
            }
        })?),
    };
    Ok(EventSelector {
        read_write_type,
        include_management_events: selector.include_management_events(),
        data_resources: selector
            .data_resources()
            .iter()
            .map(|r| DataResource {
                resource_type: r.r#type().unwrap_or_default().to_owned(),
                values: r.values().to_vec(),
            })
            .collect(),
        exclude_management_event_sources: selector.exclude_management_event_sources().to_vec(),
    })
}

fn to_sdk(selector: EventSelector) -> sdk::EventSelector {
    let data_resources = selector
        .data_resources
        .into_iter()
        .map(|r| {
            sdk::DataResource::builder()
                .r#type(r.resource_type)
                .set_values(Some(r.values))
                .build()
        })
        .collect();

    sdk::EventSelector::builder()
        .set_read_write_type(
            selector
                .read_write_type
                .map(|t| sdk::ReadWriteType::from(t.as_str())),
        )
        .set_include_management_events(selector.include_management_events)
        .set_data_resources(Some(data_resources))
        .set_exclude_management_event_sources(Some(selector.exclude_management_event_sources))
        .build()
}

#[async_trait]
impl TrailSelectorStore for CloudTrailStore {
    async fn get_event_selectors(&self, trail: &str) -> Result<Vec<EventSelector>, TrailStoreError> {
        let output = self
            .client
            .get_event_selectors()
            .trail_name(trail)
            .send()
            .await
            .map_err(|e| store_error(trail, &e))?;

        if !output.advanced_event_selectors().is_empty() {
            return Err(TrailStoreError::Unsupported {
                trail: trail.to_owned(),
                reason: "trail uses advanced event selectors".to_owned(),
            });
        }

        output
            .event_selectors()
            .iter()
            .map(|s| from_sdk(trail, s))
            .collect()
    }

    async fn put_event_selectors(
        &self,
        trail: &str,
        selectors: Vec<EventSelector>,
    ) -> Result<(), TrailStoreError> {
        self.client
            .put_event_selectors()
            .trail_name(trail)
            .set_event_selectors(Some(selectors.into_iter().map(to_sdk).collect()))
            .send()
            .await
            .map_err(|e| store_error(trail, &e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_carry_every_selector_field_to_the_sdk() {
        let selector = EventSelector {
            read_write_type: Some(ReadWriteType::WriteOnly),
            include_management_events: Some(false),
            data_resources: vec![DataResource {
                resource_type: "AWS::S3::Object".to_owned(),
                values: vec!["arn:aws:s3:::logs/".to_owned()],
            }],
            exclude_management_event_sources: vec!["kms.amazonaws.com".to_owned()],
        };

        let sdk_selector = to_sdk(selector.clone());
        assert_eq!(
            sdk_selector.read_write_type(),
            Some(&sdk::ReadWriteType::WriteOnly)
        );
        assert_eq!(from_sdk("t", &sdk_selector).unwrap(), selector);
    }

    #[test]
    fn test_should_leave_absent_fields_absent() {
        let sdk_selector = sdk::EventSelector::builder().build();
        let selector = from_sdk("t", &sdk_selector).unwrap();
        assert_eq!(selector.read_write_type, None);
        assert_eq!(selector.include_management_events, None);
        assert!(selector.data_resources.is_empty());
    }

    #[test]
    fn test_should_reject_unrecognized_read_write_type() {
        let sdk_selector = sdk::EventSelector::builder()
            .read_write_type(sdk::ReadWriteType::from("ReadMostly"))
            .build();
        let err = from_sdk("audit", &sdk_selector).unwrap_err();
        assert!(
            matches!(err, TrailStoreError::Unsupported { ref trail, ref reason } if trail == "audit" && reason.contains("ReadMostly"))
        );
    }
}
