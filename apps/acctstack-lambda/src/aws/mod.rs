//! AWS SDK implementations of the collaborator traits.

pub mod cloudformation;
pub mod cloudtrail;
pub mod dynamodb;
pub mod ec2;
pub mod kms;
pub mod s3;
pub mod sfn;
pub mod sts;

use aws_sdk_sts::error::ProvideErrorMetadata;

use acctstack_deploy_core::ServiceError;

/// Keep the service's code and message, falling back to the full error
/// context for transport failures.
pub(crate) fn service_error<E>(err: &E) -> ServiceError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let message = err.message().map_or_else(
        || aws_sdk_sts::error::DisplayErrorContext(err).to_string(),
        str::to_owned,
    );
    ServiceError {
        code: err.code().map(str::to_owned),
        message,
    }
}

/// Convert an SDK timestamp.
pub(crate) fn to_chrono(
    timestamp: &aws_sdk_sfn::primitives::DateTime,
) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}
