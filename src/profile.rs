use ini::Properties;

/// How a profile obtains its credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileType {
    Static,
    IamRole,
    Sso,
    Unknown,
}

impl ProfileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileType::Static => "static",
            ProfileType::IamRole => "iam-role",
            ProfileType::Sso => "sso",
            ProfileType::Unknown => "unknown",
        }
    }
}

/// A named profile merged from the config and credentials files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub region: Option<String>,
    pub role_arn: Option<String>,
    pub source_profile: Option<String>,
    pub mfa_serial: Option<String>,
    pub sso_session: Option<String>,
    pub sso_account_id: Option<String>,
    pub sso_role_name: Option<String>,
    /// `aws_access_key_id` present in either file
    pub has_static_keys: bool,
}

impl Profile {
    /// Build a profile from its config section and credentials section.
    /// Config values win; the credentials file only contributes keys and a
    /// fallback region.
    pub fn from_sections(
        name: &str,
        config: Option<&Properties>,
        credentials: Option<&Properties>,
    ) -> Self {
        let get = |key: &str| {
            config
                .and_then(|section| section.get(key))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(String::from)
        };

        let has_key = |section: Option<&Properties>| {
            section
                .and_then(|s| s.get("aws_access_key_id"))
                .is_some_and(|v| !v.trim().is_empty())
        };

        let region = get("region").or_else(|| {
            credentials
                .and_then(|section| section.get("region"))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(String::from)
        });

        Self {
            name: name.to_string(),
            region,
            role_arn: get("role_arn"),
            source_profile: get("source_profile"),
            mfa_serial: get("mfa_serial"),
            sso_session: get("sso_session"),
            sso_account_id: get("sso_account_id"),
            sso_role_name: get("sso_role_name"),
            has_static_keys: has_key(config) || has_key(credentials),
        }
    }

    pub fn kind(&self) -> ProfileType {
        classify(self)
    }
}

/// Decide a profile's type. First match wins: a profile carrying `role_arn`
/// stays a role even when its source profile is SSO-backed.
pub fn classify(profile: &Profile) -> ProfileType {
    if profile.role_arn.is_some() || profile.mfa_serial.is_some() {
        ProfileType::IamRole
    } else if profile.sso_session.is_some() {
        ProfileType::Sso
    } else if profile.has_static_keys {
        ProfileType::Static
    } else {
        ProfileType::Unknown
    }
}

/// An `[sso-session <name>]` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoSession {
    pub name: String,
    pub start_url: Option<String>,
    pub region: Option<String>,
    pub registration_scopes: Vec<String>,
}

impl SsoSession {
    pub fn from_section(name: &str, section: &Properties) -> Self {
        let registration_scopes = section
            .get("sso_registration_scopes")
            .map(|scopes| {
                scopes
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: name.to_string(),
            start_url: section.get("sso_start_url").map(String::from),
            region: section.get("sso_region").map(String::from),
            registration_scopes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> Properties {
        let mut props = Properties::new();
        for (k, v) in pairs {
            props.insert(k.to_string(), v.to_string());
        }
        props
    }

    #[test]
    fn test_role_arn_wins_over_sso() {
        let config = props(&[
            ("role_arn", "arn:aws:iam::111111111111:role/Admin"),
            ("sso_session", "companysso"),
        ]);
        let profile = Profile::from_sections("admin", Some(&config), None);
        assert_eq!(classify(&profile), ProfileType::IamRole);
    }

    #[test]
    fn test_mfa_serial_alone_is_role() {
        let config = props(&[("mfa_serial", "arn:aws:iam::111111111111:mfa/alice")]);
        let creds = props(&[("aws_access_key_id", "AKIA"), ("aws_secret_access_key", "s")]);
        let profile = Profile::from_sections("mfa", Some(&config), Some(&creds));
        assert_eq!(profile.kind(), ProfileType::IamRole);
        assert!(profile.has_static_keys);
    }

    #[test]
    fn test_sso_session_classifies_sso() {
        let config = props(&[
            ("sso_session", "companysso"),
            ("sso_account_id", "111111111111"),
            ("sso_role_name", "Developer"),
        ]);
        let profile = Profile::from_sections("dev", Some(&config), None);
        assert_eq!(profile.kind(), ProfileType::Sso);
        assert_eq!(profile.sso_account_id.as_deref(), Some("111111111111"));
    }

    #[test]
    fn test_static_keys_in_either_file() {
        let creds = props(&[("aws_access_key_id", "AKIA")]);
        let from_creds = Profile::from_sections("legacy", None, Some(&creds));
        assert_eq!(from_creds.kind(), ProfileType::Static);

        let from_config = Profile::from_sections("legacy", Some(&creds), None);
        assert_eq!(from_config.kind(), ProfileType::Static);
    }

    #[test]
    fn test_empty_profile_is_unknown() {
        let config = props(&[("region", "eu-west-1"), ("aws_access_key_id", "  ")]);
        let profile = Profile::from_sections("empty", Some(&config), None);
        assert_eq!(profile.kind(), ProfileType::Unknown);
        assert_eq!(profile.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_config_region_wins_over_credentials_region() {
        let config = props(&[("region", "eu-west-1")]);
        let creds = props(&[("region", "us-west-2"), ("aws_access_key_id", "AKIA")]);
        let profile = Profile::from_sections("p", Some(&config), Some(&creds));
        assert_eq!(profile.region.as_deref(), Some("eu-west-1"));

        let only_creds = Profile::from_sections("p", None, Some(&creds));
        assert_eq!(only_creds.region.as_deref(), Some("us-west-2"));
    }

    #[test]
    fn test_sso_session_scopes() {
        let section = props(&[
            ("sso_start_url", "https://example.awsapps.com/start"),
            ("sso_region", "us-east-1"),
            ("sso_registration_scopes", "sso:account:access, codewhisperer:completions"),
        ]);
        let session = SsoSession::from_section("companysso", &section);
        assert_eq!(session.region.as_deref(), Some("us-east-1"));
        assert_eq!(
            session.registration_scopes,
            vec!["sso:account:access", "codewhisperer:completions"]
        );
    }
}
