use std::{
    collections::BTreeSet,
    fs, io,
    path::{Path, PathBuf},
};

use ini::Ini;
use tracing::debug;

use crate::{
    cache::ProfileCache,
    constants::{self, ACTIVE_SLOT, PROVENANCE_MARKER},
    error::{ResolveError, Result},
    profile::{Profile, SsoSession},
};

const PROFILE_PREFIX: &str = "profile ";
const SSO_SESSION_PREFIX: &str = "sso-session ";

/// Access to the AWS config and shared credentials files.
#[derive(Debug)]
pub struct ConfigStore {
    config_path: PathBuf,
    credentials_path: PathBuf,
    names: ProfileCache,
}

impl ConfigStore {
    pub fn new(config_path: impl Into<PathBuf>, credentials_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            credentials_path: credentials_path.into(),
            names: ProfileCache::new(),
        }
    }

    /// Locate both files from `AWS_CONFIG_FILE` / `AWS_SHARED_CREDENTIALS_FILE`
    /// or the defaults under `~/.aws`.
    pub fn from_env() -> Result<Self> {
        let config_path = constants::get_aws_config_path()
            .ok_or(ResolveError::StoreLocationUnknown(constants::ENV_CONFIG_FILE))?;
        let credentials_path = constants::get_aws_credentials_path()
            .ok_or(ResolveError::StoreLocationUnknown(constants::ENV_CREDENTIALS_FILE))?;
        Ok(Self::new(config_path, credentials_path))
    }

    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    pub fn load_config(&self) -> Result<Ini> {
        load_ini(&self.config_path)
    }

    pub fn load_credentials(&self) -> Result<Ini> {
        load_ini(&self.credentials_path)
    }

    /// Load a profile by name, merging both files.
    pub fn profile(&self, name: &str) -> Result<Profile> {
        let config = self.load_config()?;
        let credentials = self.load_credentials()?;

        let config_section = config.section(Some(config_section_name(name)));
        let credentials_section = credentials.section(Some(name));

        if config_section.is_none() && credentials_section.is_none() {
            return Err(ResolveError::ProfileNotFound(name.to_string()));
        }

        Ok(Profile::from_sections(
            name,
            config_section,
            credentials_section,
        ))
    }

    /// Sorted profile names from both files, excluding the active slot in the
    /// credentials file. Served from the name cache when warm.
    pub fn profile_names(&self) -> Result<Vec<String>> {
        self.names.get_or_load(|| {
            let config = self.load_config()?;
            let credentials = self.load_credentials()?;

            let mut names = BTreeSet::new();
            for section in config.sections().flatten() {
                if let Some(name) = section.strip_prefix(PROFILE_PREFIX) {
                    names.insert(name.trim().to_string());
                } else if section == ACTIVE_SLOT {
                    names.insert(section.to_string());
                }
            }
            names.extend(
                credentials
                    .sections()
                    .flatten()
                    .filter(|section| *section != ACTIVE_SLOT)
                    .map(String::from),
            );

            Ok(names.into_iter().collect())
        })
    }

    pub fn sso_session(&self, name: &str) -> Result<SsoSession> {
        let config = self.load_config()?;
        config
            .section(Some(format!("{SSO_SESSION_PREFIX}{name}")))
            .map(|section| SsoSession::from_section(name, section))
            .ok_or_else(|| ResolveError::SsoSessionNotFound(name.to_string()))
    }

    /// Write the credentials file, placing `marker` as a provenance comment
    /// directly under the active slot header.
    pub fn save_credentials(&self, ini: &Ini, marker: Option<&str>) -> Result<()> {
        let contents = render_with_marker(ini, marker)
            .map_err(|e| ResolveError::file_io(&self.credentials_path, e))?;

        write_private(&self.credentials_path, &contents)
            .map_err(|e| ResolveError::file_io(&self.credentials_path, e))?;

        self.names.invalidate();
        debug!(
            "Wrote credentials file: {}",
            self.credentials_path.display()
        );
        Ok(())
    }

    pub fn name_cache(&self) -> &ProfileCache {
        &self.names
    }
}

/// Section name of a profile in the config file.
pub fn config_section_name(profile: &str) -> String {
    if profile == ACTIVE_SLOT {
        profile.to_string()
    } else {
        format!("{PROFILE_PREFIX}{profile}")
    }
}

/// A missing file reads as an empty document; an unparseable one is an error
/// rather than being silently replaced.
fn load_ini(path: &Path) -> Result<Ini> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("{} does not exist, treating as empty", path.display());
            return Ok(Ini::new());
        }
        Err(e) => return Err(ResolveError::file_io(path, e)),
    };

    parse_ini(&contents).map_err(|source| ResolveError::MalformedStore {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse INI text, treating indented `#` / `;` lines as comments the way the
/// AWS CLI does. rust-ini only recognizes comments at column zero and would
/// otherwise fold the line into the next key's name.
pub(crate) fn parse_ini(contents: &str) -> std::result::Result<Ini, ini::ParseError> {
    let cleaned: String = contents
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !(trimmed.starts_with('#') || trimmed.starts_with(';'))
        })
        .flat_map(|line| [line, "\n"])
        .collect();

    Ini::load_from_str(&cleaned)
}

fn render_with_marker(ini: &Ini, marker: Option<&str>) -> io::Result<String> {
    let mut buf = Vec::new();
    ini.write_to(&mut buf)?;
    let rendered = String::from_utf8(buf).map_err(io::Error::other)?;

    let Some(marker) = marker else {
        return Ok(rendered);
    };

    let header = format!("[{ACTIVE_SLOT}]");
    let mut out = String::with_capacity(rendered.len() + marker.len() + 32);
    for line in rendered.lines() {
        out.push_str(line);
        out.push('\n');
        if line.trim() == header {
            out.push_str(&format!("{PROVENANCE_MARKER} = {marker}\n"));
        }
    }
    Ok(out)
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn write_private(path: &Path, contents: &str) -> io::Result<()> {
    ensure_parent(path)?;
    fs::write(path, contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut permissions = fs::metadata(path)?.permissions();
        permissions.set_mode(0o600);
        fs::set_permissions(path, permissions)?;
    }

    Ok(())
}
