use chrono::{DateTime, Utc};

pub mod credentials;
pub mod sts;

/// Temporary or static credentials produced by a single resolution.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Empty for long-lived keys
    pub session_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ResolvedCredential {
    pub fn session_token(&self) -> Option<&str> {
        Some(self.session_token.as_str()).filter(|t| !t.is_empty())
    }
}

impl std::fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("access_key_id", &self.access_key_id)
            .field("has_session_token", &!self.session_token.is_empty())
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Identity the STS client signs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerIdentity {
    /// Credentials of a named profile, resolved by the SDK chain
    Profile(String),
    /// The SDK default chain (environment, default profile, instance role)
    DefaultChain,
}

impl CallerIdentity {
    pub fn profile_name(&self) -> Option<&str> {
        match self {
            CallerIdentity::Profile(name) => Some(name),
            CallerIdentity::DefaultChain => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaToken {
    pub serial_number: String,
    pub token_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleRequest {
    pub role_arn: String,
    pub session_name: String,
    pub duration_seconds: i32,
    pub mfa: Option<MfaToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokenRequest {
    pub duration_seconds: i32,
    pub mfa: Option<MfaToken>,
}

/// Rough category of an SDK failure, read off its message chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureShape {
    /// Token or session expired / invalid
    Expired,
    /// TLS, certificate, DNS or connection trouble
    Network,
    /// No credentials configured, or anything else
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    pub shape: FailureShape,
    pub message: String,
}

impl BackendFailure {
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            shape: classify_failure(&message),
            message,
        }
    }
}

impl std::fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

const NETWORK_MARKERS: &[&str] = &[
    "certificate",
    "x509",
    "tls",
    "ssl",
    "handshake",
    "dns error",
    "connection refused",
    "connection reset",
    "timed out",
    "dispatch failure",
    "io error",
];

const EXPIRED_MARKERS: &[&str] = &[
    "expired",
    "expiredtoken",
    "invalidgrant",
    "unauthorizedexception",
    "session token not found or invalid",
    "token has expired",
    "refresh failed",
    "the sso session associated with this profile",
    "failed to load token",
    "no token",
];

/// Classify an SDK error chain. Network shapes are checked first so that a
/// certificate problem is never reported as an expired session.
pub fn classify_failure(message: &str) -> FailureShape {
    let lower = message.to_ascii_lowercase();

    if NETWORK_MARKERS.iter().any(|m| lower.contains(m)) {
        FailureShape::Network
    } else if EXPIRED_MARKERS.iter().any(|m| lower.contains(m)) {
        FailureShape::Expired
    } else {
        FailureShape::Other
    }
}

/// Network-facing operations the engine needs from AWS.
///
/// The SDK-backed implementation is [`SdkBackend`]; tests substitute a fake.
#[allow(async_fn_in_trait)]
pub trait AwsBackend {
    /// Retrieve a profile's current credentials through the standard chain.
    async fn provide_credentials(
        &self,
        profile: &str,
    ) -> Result<ResolvedCredential, BackendFailure>;

    async fn assume_role(
        &self,
        identity: &CallerIdentity,
        request: &AssumeRoleRequest,
    ) -> Result<ResolvedCredential, BackendFailure>;

    async fn get_session_token(
        &self,
        identity: &CallerIdentity,
        request: &SessionTokenRequest,
    ) -> Result<ResolvedCredential, BackendFailure>;
}

/// [`AwsBackend`] over `aws-config` and `aws-sdk-sts`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdkBackend;

impl AwsBackend for SdkBackend {
    async fn provide_credentials(
        &self,
        profile: &str,
    ) -> Result<ResolvedCredential, BackendFailure> {
        credentials::provide_credentials(profile).await
    }

    async fn assume_role(
        &self,
        identity: &CallerIdentity,
        request: &AssumeRoleRequest,
    ) -> Result<ResolvedCredential, BackendFailure> {
        sts::assume_role(identity, request).await
    }

    async fn get_session_token(
        &self,
        identity: &CallerIdentity,
        request: &SessionTokenRequest,
    ) -> Result<ResolvedCredential, BackendFailure> {
        sts::get_session_token(identity, request).await
    }
}
