//! Bucket policy patching.
//!
//! Enrollment grants a new account access to the central buckets by merging
//! principals and resources into a statement identified by its `Sid`.
//! Revocation subtracts them again and drops the statement once it covers no
//! resources.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use acctstack_deploy_model::{OneOrMany, PolicyDocument, PolicyStatement, Principal};

use crate::error::{DeployError, DeployResult, ServiceError};

const PUT_OBJECT: &str = "s3:PutObject";

/// Whether a patch grants or revokes access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchMode {
    /// Union principals and resources into the statement.
    Grant,
    /// Subtract resources from the statement. Principals are subtracted
    /// only by patches that name no resources, since a principal shared by
    /// several resources stays needed until the last of them is gone.
    Revoke,
}

/// Principals and resources to merge into the statement with `sid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementPatch {
    /// Statement ID.
    pub sid: String,
    /// Principal type, e.g. `Service` or `AWS`.
    pub principal_type: String,
    /// Principals of that type.
    pub principals: Vec<String>,
    /// Resource ARNs.
    pub resources: Vec<String>,
    /// Actions of a newly created statement.
    pub actions: Vec<String>,
}

impl StatementPatch {
    /// Let an AWS service write objects under `resource`.
    #[must_use]
    pub fn service_put_object(service: &str, resource: String) -> Self {
        Self {
            sid: "PutObject".to_owned(),
            principal_type: "Service".to_owned(),
            principals: vec![service.to_owned()],
            resources: vec![resource],
            actions: vec![PUT_OBJECT.to_owned()],
        }
    }

    /// Let an account read objects covered by the existing `GetObject`
    /// statement.
    #[must_use]
    pub fn account_get_object(principal_arn: String) -> Self {
        Self {
            sid: "GetObject".to_owned(),
            principal_type: "AWS".to_owned(),
            principals: vec![principal_arn],
            resources: Vec::new(),
            actions: vec!["s3:GetObject".to_owned()],
        }
    }
}

/// Reads and writes bucket policies (S3 `GetBucketPolicy` / `PutBucketPolicy`).
#[async_trait]
pub trait BucketPolicyStore: Send + Sync + fmt::Debug {
    /// The bucket's policy JSON, or `None` if it has none.
    async fn get_policy(&self, bucket: &str) -> Result<Option<String>, ServiceError>;

    /// Replace the bucket's policy.
    async fn put_policy(&self, bucket: &str, policy: String) -> Result<(), ServiceError>;

    /// Remove the bucket's policy.
    async fn delete_policy(&self, bucket: &str) -> Result<(), ServiceError>;
}

/// Apply `patch` to `document`.
pub fn apply_patch(
    document: &mut PolicyDocument,
    bucket: &str,
    patch: &StatementPatch,
    mode: PatchMode,
) -> DeployResult<()> {
    let position = document
        .statement
        .0
        .iter()
        .position(|s| s.sid.as_deref() == Some(patch.sid.as_str()));

    let Some(idx) = position else {
        return match mode {
            PatchMode::Revoke => Ok(()),
            PatchMode::Grant => {
                document.statement.0.push(new_statement(bucket, patch)?);
                Ok(())
            }
        };
    };

    let statement = &mut document.statement.0[idx];
    let principals = typed_principals(&mut statement.principal, bucket, &patch.sid)?;
    let existing_principals = principals.entry(patch.principal_type.clone()).or_default();
    let mut principal_set: BTreeSet<String> = existing_principals.0.drain(..).collect();
    let mut resource_set: BTreeSet<String> = statement.resource.0.drain(..).collect();

    match mode {
        PatchMode::Grant => {
            principal_set.extend(patch.principals.iter().cloned());
            resource_set.extend(patch.resources.iter().cloned());
            statement.effect = "Allow".to_owned();
        }
        PatchMode::Revoke => {
            if patch.resources.is_empty() {
                for principal in &patch.principals {
                    principal_set.remove(principal);
                }
            }
            for resource in &patch.resources {
                resource_set.remove(resource);
            }
        }
    }

    existing_principals.0 = principal_set.into_iter().collect();
    statement.resource.0 = resource_set.into_iter().collect();

    if mode == PatchMode::Revoke && statement.resource.is_empty() {
        document.statement.0.remove(idx);
    }
    Ok(())
}

fn new_statement(bucket: &str, patch: &StatementPatch) -> DeployResult<PolicyStatement> {
    if patch.resources.is_empty() {
        return Err(DeployError::Policy {
            bucket: bucket.to_owned(),
            reason: format!("statement {} does not exist and no resources were given", patch.sid),
        });
    }

    let condition = patch.actions.iter().any(|a| a == PUT_OBJECT).then(|| {
        json!({ "StringEquals": { "s3:x-amz-acl": "bucket-owner-full-control" } })
    });

    Ok(PolicyStatement {
        sid: Some(patch.sid.clone()),
        effect: "Allow".to_owned(),
        principal: Some(Principal::Typed(BTreeMap::from([(
            patch.principal_type.clone(),
            OneOrMany(patch.principals.clone()),
        )]))),
        action: OneOrMany(patch.actions.clone()),
        resource: OneOrMany(patch.resources.clone()),
        condition,
        extra: serde_json::Map::new(),
    })
}

fn typed_principals<'a>(
    principal: &'a mut Option<Principal>,
    bucket: &str,
    sid: &str,
) -> DeployResult<&'a mut BTreeMap<String, OneOrMany<String>>> {
    match principal.get_or_insert_with(|| Principal::Typed(BTreeMap::new())) {
        Principal::Typed(map) => Ok(map),
        Principal::Wildcard(_) => Err(DeployError::Policy {
            bucket: bucket.to_owned(),
            reason: format!("statement {sid} has a wildcard principal"),
        }),
    }
}

/// Fetch a bucket's policy, patch it, and write it back.
///
/// A bucket without a policy starts from an empty document. A document left
/// without statements is deleted, as S3 rejects empty policies.
pub async fn patch_bucket_policy(
    store: &dyn BucketPolicyStore,
    bucket: &str,
    patch: &StatementPatch,
    mode: PatchMode,
) -> DeployResult<()> {
    let current = store
        .get_policy(bucket)
        .await
        .map_err(|e| DeployError::service("GetBucketPolicy", e))?;
    let mut document = match current {
        Some(json) => serde_json::from_str(&json)?,
        None => PolicyDocument::default(),
    };

    apply_patch(&mut document, bucket, patch, mode)?;

    if document.statement.is_empty() {
        store
            .delete_policy(bucket)
            .await
            .map_err(|e| DeployError::service("DeleteBucketPolicy", e))?;
        info!(bucket, sid = %patch.sid, "bucket policy deleted");
        return Ok(());
    }

    let policy = serde_json::to_string(&document)?;
    debug!(bucket, policy = %policy, "patched bucket policy");
    store
        .put_policy(bucket, policy)
        .await
        .map_err(|e| DeployError::service("PutBucketPolicy", e))?;
    info!(bucket, sid = %patch.sid, mode = ?mode, "bucket policy updated");
    Ok(())
}
