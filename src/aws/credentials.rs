use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::{
    Credentials,
    provider::{ProvideCredentials, error::CredentialsError},
};
use aws_smithy_types::error::display::DisplayErrorContext;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{BackendFailure, CallerIdentity, FailureShape, ResolvedCredential};
use crate::constants::DEFAULT_AWS_REGION;

/// Load SDK config for an identity.
/// Priority: ENV vars -> Config file -> DEFAULT_AWS_REGION
pub async fn load_sdk_config(identity: &CallerIdentity) -> SdkConfig {
    let loader = || {
        let loader = aws_config::defaults(BehaviorVersion::latest());
        match identity.profile_name() {
            Some(profile) => loader.profile_name(profile),
            None => loader,
        }
    };

    let loaded = loader().load().await;
    match loaded.region() {
        Some(region) => {
            debug!("Using region: {}", region);
            loaded
        }
        None => {
            info!(
                "No region configured, using default {} for STS",
                DEFAULT_AWS_REGION
            );
            loader()
                .region(Region::new(DEFAULT_AWS_REGION))
                .load()
                .await
        }
    }
}

/// Retrieve a profile's current credentials through the standard chain.
/// SSO token refresh and upstream role assumption happen inside the SDK.
pub async fn provide_credentials(profile: &str) -> Result<ResolvedCredential, BackendFailure> {
    debug!("Retrieving credentials for profile: {}", profile);

    let config = load_sdk_config(&CallerIdentity::Profile(profile.to_string())).await;
    let provider = config.credentials_provider().ok_or_else(|| BackendFailure {
        shape: FailureShape::Other,
        message: format!("no credential provider available for profile '{profile}'"),
    })?;

    let credentials = provider
        .provide_credentials()
        .await
        .map_err(into_backend_failure)?;

    Ok(from_sdk_credentials(&credentials))
}

fn into_backend_failure(err: CredentialsError) -> BackendFailure {
    let message = DisplayErrorContext(&err).to_string();
    match err {
        CredentialsError::CredentialsNotLoaded(_) => BackendFailure {
            shape: FailureShape::Other,
            message,
        },
        _ => BackendFailure::from_message(message),
    }
}

pub(crate) fn from_sdk_credentials(credentials: &Credentials) -> ResolvedCredential {
    ResolvedCredential {
        access_key_id: credentials.access_key_id().to_string(),
        secret_access_key: credentials.secret_access_key().to_string(),
        session_token: credentials.session_token().unwrap_or_default().to_string(),
        expires_at: credentials.expiry().map(DateTime::<Utc>::from),
    }
}
