//! Onboarding model types for AcctStack.
//!
//! Inputs and outputs of the onboarding handlers as they travel through the
//! Step Functions state machines, the S3 bucket policy document format, and
//! the SNS messages delivered to the notification endpoint.
//! Field names follow the `PascalCase` convention of the state machine
//! payloads (`RoleARN`, `TemplateURL` and friends are renamed explicitly).
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod credentials;
pub mod enroll;
pub mod notification;
pub mod policy;
pub mod stack;
pub mod workflow;

pub use credentials::{AssumeRoleRequest, EncryptedCredentials};
pub use enroll::{EnrollAccountRequest, EnrollmentRecord};
pub use notification::{NotificationReceipt, SnsMessage, SnsMessageType};
pub use policy::{OneOrMany, POLICY_VERSION, PolicyDocument, PolicyStatement, Principal};
pub use stack::{
    DeleteStackRequest, DeleteStackResponse, DescribeStackRequest, StackDescription, StackOutput,
    StackParameter, StackRef, StackTag, UpdateStackRequest, UpdateStackResponse, UpdateWarning,
};
pub use workflow::{
    AggregateStatus, DeploymentWorkflow, ExecutionStatus, ParallelExecutionInput,
    StartedExecution, TrackedWorkflow, WorkflowStatusReport,
};
