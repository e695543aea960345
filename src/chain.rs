use std::collections::HashSet;

use tracing::debug;

use crate::{
    config::ConfigStore,
    error::{ResolveError, Result},
    profile::{Profile, ProfileType},
};

/// The `source_profile` chain starting at a target profile.
///
/// `links[0]` is the target; each following link is the previous link's
/// source profile. The last link (the origin) has no source profile to follow.
#[derive(Debug, Clone)]
pub struct RoleChain {
    links: Vec<Profile>,
}

impl RoleChain {
    /// Walk the chain, loading and classifying each profile exactly once.
    ///
    /// Only IAM role profiles are followed through `source_profile`. Revisiting
    /// a profile already in the chain fails with [`ResolveError::RoleChainCycle`].
    pub fn walk(store: &ConfigStore, target: &str) -> Result<Self> {
        let mut visited = HashSet::new();
        let mut links: Vec<Profile> = Vec::new();
        let mut current = target.to_string();

        loop {
            let profile = store.profile(&current)?;
            visited.insert(profile.name.clone());

            let next = match profile.kind() {
                ProfileType::IamRole => profile.source_profile.clone(),
                _ => None,
            };
            debug!(
                "Role chain depth {}: '{}' ({})",
                links.len(),
                profile.name,
                profile.kind().as_str()
            );
            links.push(profile);

            let Some(next) = next else {
                break;
            };

            if visited.contains(&next) {
                let mut chain: Vec<String> = links.iter().map(|p| p.name.clone()).collect();
                chain.push(next);
                return Err(ResolveError::RoleChainCycle { chain });
            }
            current = next;
        }

        let origin = links.last().map(|p| (p.name.clone(), p.kind()));
        if let Some((name, ProfileType::Unknown)) = origin {
            return Err(ResolveError::ProfileTypeUnknown(name));
        }

        Ok(Self { links })
    }

    pub fn target(&self) -> &Profile {
        &self.links[0]
    }

    /// The profile the chain bottoms out at.
    pub fn origin(&self) -> &Profile {
        &self.links[self.links.len() - 1]
    }

    /// The target's direct source profile, if any.
    pub fn source(&self) -> Option<&Profile> {
        self.links.get(1)
    }

    /// Number of `source_profile` hops.
    pub fn depth(&self) -> usize {
        self.links.len() - 1
    }

    pub fn links(&self) -> &[Profile] {
        &self.links
    }

    /// First region declared along the chain, starting at the target.
    pub fn region(&self) -> Option<&str> {
        self.links.iter().find_map(|p| p.region.as_deref())
    }
}
