//! Fakes for the injected capabilities, used by unit tests.

use std::{collections::HashMap, fs, io};

use anyhow::bail;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tempfile::TempDir;

use crate::{
    aws::{
        AssumeRoleRequest, AwsBackend, BackendFailure, CallerIdentity, FailureShape,
        ResolvedCredential, SessionTokenRequest,
    },
    config::ConfigStore,
    login::LoginService,
    mfa::MfaPrompt,
};

pub const FIXTURE_CONFIG: &str = r#"
[default]
region = us-east-1

[profile dev]
sso_session = companysso
sso_account_id = 111111111111
sso_role_name = Developer
region = eu-west-1

[sso-session companysso]
sso_start_url = https://example.awsapps.com/start
sso_region = us-east-1
sso_registration_scopes = sso:account:access

[profile prod-admin]
role_arn = arn:aws:iam::111111111111:role/Admin
source_profile = dev
mfa_serial = arn:aws:iam::111111111111:mfa/alice

[profile deploy]
role_arn = arn:aws:iam::222222222222:role/Deploy
source_profile = legacy
region = us-west-2

[profile mfa-only]
mfa_serial = arn:aws:iam::333333333333:mfa/bob

[profile orphan-sso]
sso_session = ghostsso

[profile regional]
region = sa-east-1
"#;

pub const FIXTURE_CREDENTIALS: &str = r#"
[default]
# source_profile = previous
aws_access_key_id = AKIAOLD
aws_secret_access_key = old-secret
aws_session_token = old-token
region = ap-southeast-2

[legacy]
aws_access_key_id = AKIALEGACY
aws_secret_access_key = legacy-secret

[mfa-only]
aws_access_key_id = AKIAMFA
aws_secret_access_key = mfa-secret

[regional]
aws_access_key_id = AKIAREGIONAL
aws_secret_access_key = regional-secret
"#;

pub fn store_with(config: &str, credentials: &str) -> (TempDir, ConfigStore) {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config");
    let credentials_path = dir.path().join("credentials");
    fs::write(&config_path, config).unwrap();
    fs::write(&credentials_path, credentials).unwrap();
    (dir, ConfigStore::new(config_path, credentials_path))
}

pub fn fixture_store() -> (TempDir, ConfigStore) {
    store_with(FIXTURE_CONFIG, FIXTURE_CREDENTIALS)
}

pub fn temporary_credential(expires_at: Option<DateTime<Utc>>) -> ResolvedCredential {
    ResolvedCredential {
        access_key_id: "ASIATEMP".to_string(),
        secret_access_key: "temp-secret".to_string(),
        session_token: "temp-token".to_string(),
        expires_at,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Provide(String),
    AssumeRole(CallerIdentity, AssumeRoleRequest),
    SessionToken(CallerIdentity, SessionTokenRequest),
}

/// Scripted [`AwsBackend`] that records every call.
pub struct FakeBackend {
    credentials: HashMap<String, Result<ResolvedCredential, BackendFailure>>,
    sts_response: Result<ResolvedCredential, BackendFailure>,
    calls: Mutex<Vec<BackendCall>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            credentials: HashMap::new(),
            sts_response: Ok(temporary_credential(None)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_credentials(
        mut self,
        profile: &str,
        response: Result<ResolvedCredential, BackendFailure>,
    ) -> Self {
        self.credentials.insert(profile.to_string(), response);
        self
    }

    pub fn with_sts_response(mut self, response: Result<ResolvedCredential, BackendFailure>) -> Self {
        self.sts_response = response;
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    pub fn sts_calls(&self) -> Vec<BackendCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, BackendCall::Provide(_)))
            .collect()
    }
}

impl AwsBackend for FakeBackend {
    async fn provide_credentials(
        &self,
        profile: &str,
    ) -> Result<ResolvedCredential, BackendFailure> {
        self.calls
            .lock()
            .push(BackendCall::Provide(profile.to_string()));
        self.credentials
            .get(profile)
            .cloned()
            .unwrap_or_else(|| {
                Err(BackendFailure {
                    shape: FailureShape::Other,
                    message: format!("no credentials configured for {profile}"),
                })
            })
    }

    async fn assume_role(
        &self,
        identity: &CallerIdentity,
        request: &AssumeRoleRequest,
    ) -> Result<ResolvedCredential, BackendFailure> {
        self.calls
            .lock()
            .push(BackendCall::AssumeRole(identity.clone(), request.clone()));
        self.sts_response.clone()
    }

    async fn get_session_token(
        &self,
        identity: &CallerIdentity,
        request: &SessionTokenRequest,
    ) -> Result<ResolvedCredential, BackendFailure> {
        self.calls
            .lock()
            .push(BackendCall::SessionToken(identity.clone(), request.clone()));
        self.sts_response.clone()
    }
}

pub struct FakeMfa {
    code: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeMfa {
    pub fn answering(code: &str) -> Self {
        Self {
            code: Some(code.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn broken() -> Self {
        Self {
            code: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl MfaPrompt for FakeMfa {
    fn token_code(&self, mfa_serial: &str) -> io::Result<String> {
        self.prompts.lock().push(mfa_serial.to_string());
        self.code
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"))
    }
}

pub struct FakeLogin {
    fail: bool,
    sessions: Mutex<Vec<String>>,
}

impl FakeLogin {
    pub fn succeeding() -> Self {
        Self {
            fail: false,
            sessions: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            sessions: Mutex::new(Vec::new()),
        }
    }

    pub fn sessions(&self) -> Vec<String> {
        self.sessions.lock().clone()
    }
}

impl LoginService for FakeLogin {
    fn login(&self, sso_session: &str) -> anyhow::Result<()> {
        self.sessions.lock().push(sso_session.to_string());
        if self.fail {
            bail!("login window closed");
        }
        Ok(())
    }
}
