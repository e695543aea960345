use std::{io, path::PathBuf};

use thiserror::Error;

use crate::constants::SSO_EXPIRED_EXIT_CODE;

/// Failures raised while resolving, refreshing or persisting credentials.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Profile '{0}' not found in config or credentials file")]
    ProfileNotFound(String),

    #[error(
        "Profile '{0}' has no recognizable credential settings (expected role_arn, mfa_serial, sso_session or static keys)"
    )]
    ProfileTypeUnknown(String),

    /// Callers match on this variant to offer a re-login or exit with code 10.
    #[error(
        "SSO session '{session}' for profile '{profile}' has expired. Run `aws sso login --sso-session {session}`"
    )]
    SsoSessionExpired { profile: String, session: String },

    #[error("SSO session '{0}' is not defined in the config file")]
    SsoSessionNotFound(String),

    #[error("Role chain cycle detected: {}", .chain.join(" -> "))]
    RoleChainCycle { chain: Vec<String> },

    #[error("Failed to read MFA token code for {mfa_serial}")]
    MfaInputFailure {
        mfa_serial: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to obtain credentials for {target}: {message}")]
    RoleAssumptionFailure { target: String, message: String },

    #[error(
        "Source profile '{source_profile}' has an invalid SSO session. Run `aws sso login --sso-session {session}` and retry"
    )]
    UpstreamSessionInvalid {
        source_profile: String,
        session: String,
    },

    #[error(
        "Network or TLS failure while contacting AWS for profile '{profile}': {message}. Check connectivity, proxy and certificate settings"
    )]
    TlsOrNetworkFailure { profile: String, message: String },

    #[error("Profile '{0}' has no aws_access_key_id / aws_secret_access_key")]
    StaticKeysMissing(String),

    #[error("Cannot refresh profile '{profile}' automatically: {reason}")]
    RefreshUnsupported { profile: String, reason: String },

    #[error("SSO login for session '{session}' failed: {message}")]
    SsoLoginFailed { session: String, message: String },

    #[error("Cannot locate AWS files: home directory is unknown and {0} is not set")]
    StoreLocationUnknown(&'static str),

    #[error("Failed to access {}", .path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {}", .path.display())]
    MalformedStore {
        path: PathBuf,
        #[source]
        source: ini::ParseError,
    },
}

impl ResolveError {
    pub fn file_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }

    /// Process exit code the shell wrapper expects for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::SsoSessionExpired { .. } => SSO_EXPIRED_EXIT_CODE,
            _ => 1,
        }
    }

    pub fn is_sso_expired(&self) -> bool {
        matches!(self, Self::SsoSessionExpired { .. })
    }
}

pub type Result<T, E = ResolveError> = std::result::Result<T, E>;
