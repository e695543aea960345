use std::{env, path::PathBuf, time::Duration};

use dirs;

/// AWS configuration directory name
pub const AWS_CONFIG_DIR_NAME: &str = ".aws";

/// AWS configuration file name
pub const AWS_CONFIG_FILE_NAME: &str = "config";

/// AWS shared credentials file name
pub const AWS_CREDENTIALS_FILE_NAME: &str = "credentials";

/// Default AWS region for STS operations when no region is configured
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Credentials-file section that holds the active session
pub const ACTIVE_SLOT: &str = "default";

/// Comment-style key recording which profile produced the active session
pub const PROVENANCE_MARKER: &str = "# source_profile";

/// Lifetime requested for AssumeRole / GetSessionToken
pub const SESSION_DURATION_SECONDS: i32 = 3600;

/// Credentials expiring within this window are refreshed ahead of time
pub const EXPIRY_WARNING_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Maximum length STS accepts for a role session name
pub const MAX_ROLE_SESSION_NAME_LEN: usize = 64;

/// Exit code telling the shell wrapper to prompt for an SSO re-login
pub const SSO_EXPIRED_EXIT_CODE: u8 = 10;

/// External program providing `sso login`
pub const AWS_CLI_PROGRAM: &str = "aws";

pub const ENV_CONFIG_FILE: &str = "AWS_CONFIG_FILE";
pub const ENV_CREDENTIALS_FILE: &str = "AWS_SHARED_CREDENTIALS_FILE";
pub const ENV_PROFILE: &str = "AWS_PROFILE";
pub const ENV_REGION: &str = "AWS_REGION";

/// Get the AWS config file path
/// Respects AWS_CONFIG_FILE environment variable if set
pub fn get_aws_config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(ENV_CONFIG_FILE) {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| home.join(AWS_CONFIG_DIR_NAME).join(AWS_CONFIG_FILE_NAME))
}

/// Get the AWS credentials file path
/// Respects AWS_SHARED_CREDENTIALS_FILE environment variable if set
pub fn get_aws_credentials_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(ENV_CREDENTIALS_FILE) {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| {
        home.join(AWS_CONFIG_DIR_NAME)
            .join(AWS_CREDENTIALS_FILE_NAME)
    })
}

/// Profile named by `AWS_PROFILE`, ignoring an empty value
pub fn env_profile() -> Option<String> {
    env::var(ENV_PROFILE).ok().filter(|p| !p.is_empty())
}

/// Region named by `AWS_REGION`, ignoring an empty value
pub fn env_region() -> Option<String> {
    env::var(ENV_REGION).ok().filter(|r| !r.is_empty())
}
