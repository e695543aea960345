use aws_sdk_sts::{Client as StsClient, types::Credentials as StsCredentials};
use aws_smithy_types::{DateTime as SmithyDateTime, error::display::DisplayErrorContext};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{
    AssumeRoleRequest, BackendFailure, CallerIdentity, FailureShape, ResolvedCredential,
    SessionTokenRequest, credentials::load_sdk_config,
};

async fn client_for(identity: &CallerIdentity) -> StsClient {
    let config = load_sdk_config(identity).await;
    StsClient::new(&config)
}

/// Call STS AssumeRole, signing with `identity`.
pub async fn assume_role(
    identity: &CallerIdentity,
    request: &AssumeRoleRequest,
) -> Result<ResolvedCredential, BackendFailure> {
    info!("Calling AWS STS AssumeRole");
    debug!("Role ARN: {}", request.role_arn);
    debug!("Session name: {}", request.session_name);
    debug!("Caller identity: {:?}", identity);

    let client = client_for(identity).await;
    let mut call = client
        .assume_role()
        .role_arn(&request.role_arn)
        .role_session_name(&request.session_name)
        .duration_seconds(request.duration_seconds);

    if let Some(mfa) = &request.mfa {
        debug!("Using MFA device: {}", mfa.serial_number);
        call = call
            .serial_number(&mfa.serial_number)
            .token_code(&mfa.token_code);
    }

    let response = call
        .send()
        .await
        .map_err(|e| BackendFailure::from_message(DisplayErrorContext(&e).to_string()))?;

    let credentials = response.credentials().ok_or_else(no_credentials)?;
    info!("Successfully assumed role {}", request.role_arn);
    Ok(from_sts_credentials(credentials))
}

/// Call STS GetSessionToken, signing with `identity`.
pub async fn get_session_token(
    identity: &CallerIdentity,
    request: &SessionTokenRequest,
) -> Result<ResolvedCredential, BackendFailure> {
    info!("Calling AWS STS GetSessionToken");
    debug!("Caller identity: {:?}", identity);

    let client = client_for(identity).await;
    let mut call = client
        .get_session_token()
        .duration_seconds(request.duration_seconds);

    if let Some(mfa) = &request.mfa {
        debug!("Using MFA device: {}", mfa.serial_number);
        call = call
            .serial_number(&mfa.serial_number)
            .token_code(&mfa.token_code);
    }

    let response = call
        .send()
        .await
        .map_err(|e| BackendFailure::from_message(DisplayErrorContext(&e).to_string()))?;

    let credentials = response.credentials().ok_or_else(no_credentials)?;
    info!("Successfully obtained session token");
    Ok(from_sts_credentials(credentials))
}

fn no_credentials() -> BackendFailure {
    BackendFailure {
        shape: FailureShape::Other,
        message: "AWS STS returned no credentials".to_string(),
    }
}

fn from_sts_credentials(credentials: &StsCredentials) -> ResolvedCredential {
    ResolvedCredential {
        access_key_id: credentials.access_key_id().to_string(),
        secret_access_key: credentials.secret_access_key().to_string(),
        session_token: credentials.session_token().to_string(),
        expires_at: to_chrono(credentials.expiration()),
    }
}

fn to_chrono(expiration: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(expiration.secs(), expiration.subsec_nanos())
}
