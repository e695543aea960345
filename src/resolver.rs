use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    aws::{
        AssumeRoleRequest, AwsBackend, BackendFailure, CallerIdentity, FailureShape, MfaToken,
        ResolvedCredential, SessionTokenRequest,
    },
    chain::RoleChain,
    config::ConfigStore,
    constants::{MAX_ROLE_SESSION_NAME_LEN, SESSION_DURATION_SECONDS},
    error::{ResolveError, Result},
    login::LoginService,
    mfa::MfaPrompt,
    monitor::ExpirationMonitor,
    profile::{Profile, ProfileType},
};

/// Outcome of resolving a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Long-lived keys already stored for the profile; the caller copies them.
    Static,
    Temporary(ResolvedCredential),
}

/// Turns a profile name into credentials, dispatching on profile type.
pub struct CredentialResolver<'a, B, M, L> {
    store: &'a ConfigStore,
    backend: &'a B,
    mfa: &'a M,
    login: &'a L,
}

impl<'a, B, M, L> CredentialResolver<'a, B, M, L>
where
    B: AwsBackend,
    M: MfaPrompt,
    L: LoginService,
{
    pub fn new(store: &'a ConfigStore, backend: &'a B, mfa: &'a M, login: &'a L) -> Self {
        Self {
            store,
            backend,
            mfa,
            login,
        }
    }

    pub fn monitor(&self) -> ExpirationMonitor<'a, B, L> {
        ExpirationMonitor::new(self.store, self.backend, self.login)
    }

    pub async fn resolve(&self, profile: &str) -> Result<Resolution> {
        let chain = RoleChain::walk(self.store, profile)?;
        self.resolve_chain(&chain).await
    }

    /// Resolve an already-walked chain.
    pub async fn resolve_chain(&self, chain: &RoleChain) -> Result<Resolution> {
        let target = chain.target();
        info!(
            "Resolving profile '{}' ({})",
            target.name,
            target.kind().as_str()
        );

        match target.kind() {
            ProfileType::Static => Ok(Resolution::Static),
            ProfileType::Sso => self.resolve_sso(target).await.map(Resolution::Temporary),
            ProfileType::IamRole => self.resolve_role(chain).await.map(Resolution::Temporary),
            ProfileType::Unknown => Err(ResolveError::ProfileTypeUnknown(target.name.clone())),
        }
    }

    /// Never starts a login itself; an expired session is reported so the
    /// caller can decide.
    async fn resolve_sso(&self, profile: &Profile) -> Result<ResolvedCredential> {
        let session = profile.sso_session.clone().unwrap_or_default();

        match self.backend.provide_credentials(&profile.name).await {
            Ok(credential) => Ok(credential),
            Err(failure) if failure.shape == FailureShape::Network => {
                Err(ResolveError::TlsOrNetworkFailure {
                    profile: profile.name.clone(),
                    message: failure.message,
                })
            }
            Err(failure) => {
                debug!("SSO credentials unavailable: {}", failure.message);
                Err(ResolveError::SsoSessionExpired {
                    profile: profile.name.clone(),
                    session,
                })
            }
        }
    }

    async fn resolve_role(&self, chain: &RoleChain) -> Result<ResolvedCredential> {
        let target = chain.target();

        if chain.source().is_some() {
            self.refresh_upstream(chain).await?;
        }

        let identity = caller_identity(target);
        debug!("STS caller identity for '{}': {:?}", target.name, identity);

        let mfa = match &target.mfa_serial {
            Some(serial) => Some(self.prompt_mfa(serial)?),
            None => None,
        };

        match &target.role_arn {
            Some(role_arn) => {
                let request = AssumeRoleRequest {
                    role_arn: role_arn.clone(),
                    session_name: session_name(&target.name, Utc::now().timestamp()),
                    duration_seconds: SESSION_DURATION_SECONDS,
                    mfa,
                };
                self.backend
                    .assume_role(&identity, &request)
                    .await
                    .map_err(|failure| sts_failure(chain, role_arn, failure))
            }
            None => {
                let request = SessionTokenRequest {
                    duration_seconds: SESSION_DURATION_SECONDS,
                    mfa,
                };
                self.backend
                    .get_session_token(&identity, &request)
                    .await
                    .map_err(|failure| {
                        sts_failure(chain, &format!("profile '{}'", target.name), failure)
                    })
            }
        }
    }

    /// Make sure an SSO origin has a live session before the role call.
    /// Only network failures abort; refresh trouble is left for the STS call
    /// to surface.
    async fn refresh_upstream(&self, chain: &RoleChain) -> Result<()> {
        let origin = chain.origin();
        if origin.kind() != ProfileType::Sso {
            return Ok(());
        }

        match self.monitor().ensure_fresh(&origin.name).await {
            Ok(status) => {
                debug!("Upstream '{}' status: {}", origin.name, status.as_str());
                Ok(())
            }
            Err(e @ ResolveError::TlsOrNetworkFailure { .. }) => Err(e),
            Err(e) => {
                warn!("Could not check upstream '{}': {}", origin.name, e);
                Ok(())
            }
        }
    }

    fn prompt_mfa(&self, serial: &str) -> Result<MfaToken> {
        let token_code =
            self.mfa
                .token_code(serial)
                .map_err(|source| ResolveError::MfaInputFailure {
                    mfa_serial: serial.to_string(),
                    source,
                })?;

        Ok(MfaToken {
            serial_number: serial.to_string(),
            token_code,
        })
    }
}

/// `source_profile` always signs the STS call when present. Otherwise the
/// profile's own keys are used, falling back to the default chain.
fn caller_identity(target: &Profile) -> CallerIdentity {
    match (&target.source_profile, target.has_static_keys) {
        (Some(source), _) => CallerIdentity::Profile(source.clone()),
        (None, true) => CallerIdentity::Profile(target.name.clone()),
        (None, false) => CallerIdentity::DefaultChain,
    }
}

fn sts_failure(chain: &RoleChain, target: &str, failure: BackendFailure) -> ResolveError {
    let origin = chain.origin();
    match failure.shape {
        FailureShape::Network => ResolveError::TlsOrNetworkFailure {
            profile: chain.target().name.clone(),
            message: failure.message,
        },
        FailureShape::Expired if origin.kind() == ProfileType::Sso && chain.depth() > 0 => {
            ResolveError::UpstreamSessionInvalid {
                source_profile: origin.name.clone(),
                session: origin.sso_session.clone().unwrap_or_default(),
            }
        }
        _ => ResolveError::RoleAssumptionFailure {
            target: target.to_string(),
            message: failure.message,
        },
    }
}

/// `<profile>-<unix seconds>`, restricted to the characters and length STS
/// accepts for a role session name.
pub fn session_name(profile: &str, unix_seconds: i64) -> String {
    let raw = format!("{profile}-{unix_seconds}");
    let sanitized: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || "+=,.@-".contains(c) {
                c
            } else {
                '-'
            }
        })
        .collect();

    if sanitized.len() <= MAX_ROLE_SESSION_NAME_LEN {
        return sanitized;
    }

    // Keep the timestamp suffix so names stay unique per invocation
    let suffix = format!("-{unix_seconds}");
    let keep = MAX_ROLE_SESSION_NAME_LEN.saturating_sub(suffix.len());
    format!("{}{suffix}", &sanitized[..keep])
}
