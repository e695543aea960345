use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    aws::{AwsBackend, FailureShape},
    config::ConfigStore,
    constants::EXPIRY_WARNING_WINDOW,
    error::{ResolveError, Result},
    login::LoginService,
    profile::ProfileType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialStatus {
    Valid,
    ExpiringSoon,
    Expired,
    Missing,
}

impl CredentialStatus {
    pub fn needs_refresh(&self) -> bool {
        !matches!(self, CredentialStatus::Valid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialStatus::Valid => "valid",
            CredentialStatus::ExpiringSoon => "expiring-soon",
            CredentialStatus::Expired => "expired",
            CredentialStatus::Missing => "missing",
        }
    }
}

/// Status of retrieved credentials at `now`. Credentials without an expiry
/// never go stale.
pub fn status_at(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> CredentialStatus {
    let Some(expires_at) = expires_at else {
        return CredentialStatus::Valid;
    };

    let window = TimeDelta::from_std(EXPIRY_WARNING_WINDOW).unwrap_or(TimeDelta::minutes(5));
    if expires_at <= now {
        CredentialStatus::Expired
    } else if expires_at <= now + window {
        CredentialStatus::ExpiringSoon
    } else {
        CredentialStatus::Valid
    }
}

/// Checks credential freshness and drives best-effort refresh.
pub struct ExpirationMonitor<'a, B, L> {
    store: &'a ConfigStore,
    backend: &'a B,
    login: &'a L,
}

impl<'a, B: AwsBackend, L: LoginService> ExpirationMonitor<'a, B, L> {
    pub fn new(store: &'a ConfigStore, backend: &'a B, login: &'a L) -> Self {
        Self {
            store,
            backend,
            login,
        }
    }

    /// Retrieve the profile's current credentials and classify them.
    ///
    /// TLS and connection failures are returned as errors instead of a
    /// status, since no refresh can fix them.
    pub async fn check_status(&self, profile: &str) -> Result<CredentialStatus> {
        self.check_status_at(profile, Utc::now()).await
    }

    pub async fn check_status_at(
        &self,
        profile: &str,
        now: DateTime<Utc>,
    ) -> Result<CredentialStatus> {
        let status = match self.backend.provide_credentials(profile).await {
            Ok(credential) => status_at(credential.expires_at, now),
            Err(failure) => match failure.shape {
                FailureShape::Expired => CredentialStatus::Expired,
                FailureShape::Network => {
                    return Err(ResolveError::TlsOrNetworkFailure {
                        profile: profile.to_string(),
                        message: failure.message,
                    });
                }
                FailureShape::Other => {
                    debug!("No credentials for '{}': {}", profile, failure.message);
                    CredentialStatus::Missing
                }
            },
        };

        debug!("Credential status for '{}': {}", profile, status.as_str());
        Ok(status)
    }

    /// Refresh a profile's credentials. Only SSO profiles can be refreshed
    /// without user input beyond the login flow.
    pub fn auto_refresh(&self, profile: &str) -> Result<()> {
        let profile = self.store.profile(profile)?;

        match profile.kind() {
            ProfileType::Sso => {
                let Some(session) = profile.sso_session.as_deref() else {
                    return Err(ResolveError::ProfileTypeUnknown(profile.name));
                };
                self.store.sso_session(session)?;

                info!(
                    "Refreshing SSO session '{}' for profile '{}'",
                    session, profile.name
                );
                self.login
                    .login(session)
                    .map_err(|e| ResolveError::SsoLoginFailed {
                        session: session.to_string(),
                        message: format!("{e:#}"),
                    })
            }
            ProfileType::IamRole => Err(ResolveError::RefreshUnsupported {
                reason: format!(
                    "role credentials need a fresh MFA code or source session; run `awsctx use {}` again",
                    profile.name
                ),
                profile: profile.name,
            }),
            ProfileType::Static => Err(ResolveError::RefreshUnsupported {
                reason: "static keys do not expire".to_string(),
                profile: profile.name,
            }),
            ProfileType::Unknown => Err(ResolveError::ProfileTypeUnknown(profile.name)),
        }
    }

    /// Check a profile and refresh it when stale. Refresh failures are only
    /// logged; the caller's own resolution decides the outcome.
    pub async fn ensure_fresh(&self, profile: &str) -> Result<CredentialStatus> {
        let status = self.check_status(profile).await?;

        if status.needs_refresh() {
            info!(
                "Credentials for '{}' are {}, attempting refresh",
                profile,
                status.as_str()
            );
            if let Err(e) = self.auto_refresh(profile) {
                warn!("Auto-refresh of '{}' failed: {}", profile, e);
            }
        }

        Ok(status)
    }
}
