use std::fs;

use tracing::{debug, info, warn};

use crate::{
    aws::ResolvedCredential,
    config::{ConfigStore, config_section_name, parse_ini},
    constants::{ACTIVE_SLOT, PROVENANCE_MARKER},
    error::{ResolveError, Result},
};

const ACCESS_KEY_ID: &str = "aws_access_key_id";
const SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
const SESSION_TOKEN: &str = "aws_session_token";
const REGION: &str = "region";

/// Long-lived keys read from a static profile.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticKeys {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: Option<String>,
}

impl std::fmt::Debug for StaticKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticKeys")
            .field("access_key_id", &self.access_key_id)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// Reads and writes the `[default]` slot of the credentials file.
pub struct ActiveSessionWriter<'a> {
    store: &'a ConfigStore,
}

impl<'a> ActiveSessionWriter<'a> {
    pub fn new(store: &'a ConfigStore) -> Self {
        Self { store }
    }

    /// Overwrite the active slot with temporary credentials. The region is
    /// only replaced when a non-empty one is given.
    pub fn write_active(
        &self,
        credential: &ResolvedCredential,
        region: Option<&str>,
        source_profile: &str,
    ) -> Result<()> {
        let mut ini = self.store.load_credentials()?;

        ini.with_section(Some(ACTIVE_SLOT))
            .set(ACCESS_KEY_ID, &credential.access_key_id)
            .set(SECRET_ACCESS_KEY, &credential.secret_access_key);

        match credential.session_token() {
            Some(token) => {
                ini.with_section(Some(ACTIVE_SLOT))
                    .set(SESSION_TOKEN, token);
            }
            None => {
                ini.delete_from(Some(ACTIVE_SLOT), SESSION_TOKEN);
            }
        }

        if let Some(region) = region.map(str::trim).filter(|r| !r.is_empty()) {
            ini.with_section(Some(ACTIVE_SLOT)).set(REGION, region);
        }

        self.store.save_credentials(&ini, Some(source_profile))?;
        info!("Active session set from profile: {}", source_profile);
        Ok(())
    }

    /// Copy a static profile's keys into the active slot. Any temporary token
    /// left in the slot is removed.
    pub fn write_active_static(&self, source_profile: &str) -> Result<()> {
        let keys = self.static_keys(source_profile)?;
        let credential = ResolvedCredential {
            access_key_id: keys.access_key_id,
            secret_access_key: keys.secret_access_key,
            session_token: String::new(),
            expires_at: None,
        };
        self.write_active(&credential, keys.region.as_deref(), source_profile)
    }

    /// Keys for a static profile, from the credentials file first and then
    /// the config file.
    pub fn static_keys(&self, profile: &str) -> Result<StaticKeys> {
        let credentials = self.store.load_credentials()?;
        let config = self.store.load_config()?;

        let config_section = config.section(Some(config_section_name(profile)));
        let sections = [credentials.section(Some(profile)), config_section];

        let keys = sections.iter().flatten().find_map(|section| {
            let access_key_id = section.get(ACCESS_KEY_ID)?.trim();
            let secret_access_key = section.get(SECRET_ACCESS_KEY)?.trim();
            (!access_key_id.is_empty() && !secret_access_key.is_empty())
                .then(|| (access_key_id.to_string(), secret_access_key.to_string()))
        });

        let Some((access_key_id, secret_access_key)) = keys else {
            return Err(ResolveError::StaticKeysMissing(profile.to_string()));
        };

        let region = config_section
            .and_then(|s| s.get(REGION))
            .or_else(|| credentials.section(Some(profile)).and_then(|s| s.get(REGION)))
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from);

        Ok(StaticKeys {
            access_key_id,
            secret_access_key,
            region,
        })
    }

    /// Name of the profile that produced the active session, or an empty
    /// string when none is recorded.
    pub fn active_profile_name(&self) -> String {
        let path = self.store.credentials_path();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!("Cannot read {}: {}", path.display(), e);
                return String::new();
            }
        };

        match parse_ini(&contents) {
            Ok(ini) if ini.section(Some(ACTIVE_SLOT)).is_none() => String::new(),
            Ok(_) => marker_in_active_slot(&contents).unwrap_or_default(),
            Err(e) => {
                warn!(
                    "Credentials file {} is damaged ({}), scanning for provenance marker",
                    path.display(),
                    e
                );
                scan_for_marker(&contents).unwrap_or_default()
            }
        }
    }

    /// Remove the active session. Missing slot or file is not an error.
    pub fn clear_active(&self) -> Result<()> {
        let mut ini = self.store.load_credentials()?;

        let Some(section) = ini.section_mut(Some(ACTIVE_SLOT)) else {
            debug!("No active session to clear");
            return Ok(());
        };

        for key in [ACCESS_KEY_ID, SECRET_ACCESS_KEY, SESSION_TOKEN, REGION] {
            section.remove(key);
        }
        if section.is_empty() {
            ini.delete(Some(ACTIVE_SLOT));
        }

        self.store.save_credentials(&ini, None)?;
        info!("Active session cleared");
        Ok(())
    }
}

/// Marker value inside the `[default]` section only.
fn marker_in_active_slot(contents: &str) -> Option<String> {
    let header = format!("[{ACTIVE_SLOT}]");
    let mut in_slot = false;

    for line in contents.lines().map(str::trim) {
        if line.starts_with('[') {
            in_slot = line == header;
            continue;
        }
        if in_slot {
            if let Some(value) = parse_marker(line) {
                return Some(value);
            }
        }
    }
    None
}

/// Marker value anywhere in the file, for files that do not parse.
fn scan_for_marker(contents: &str) -> Option<String> {
    contents.lines().map(str::trim).find_map(parse_marker)
}

fn parse_marker(line: &str) -> Option<String> {
    let rest = line.strip_prefix(PROVENANCE_MARKER)?;
    let value = rest.trim_start().strip_prefix('=')?.trim();
    (!value.is_empty()).then(|| value.to_string())
}
