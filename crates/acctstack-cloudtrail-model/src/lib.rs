//! CloudTrail model types for AcctStack.
//!
//! Wire representations of trail event selectors (as exchanged with the
//! `GetEventSelectors` / `PutEventSelectors` APIs), the declarative
//! `DesiredSpec` carried in custom resource properties, and the CloudFormation
//! custom resource request/response protocol. All structs use `PascalCase`
//! JSON field naming to match the AWS wire formats.
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod custom_resource;
pub mod error;
pub mod selector;
pub mod spec;

pub use custom_resource::{CustomResourceRequest, CustomResourceResponse, RequestType, ResponseStatus};
pub use error::ReconcileError;
pub use selector::{DataResource, EventSelector, ReadWriteType};
pub use spec::{DataEventSelectors, DesiredSpec, ManagementEventSelection};
