//! Registry of height platforms and their aliases.

use super::HeightPlatform;
use crate::error::SkyApiError;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Registered height platforms, kept in registration order.
pub struct PlatformRegistry {
    platforms: Vec<Arc<dyn HeightPlatform>>,
    /// Lowercased alias to canonical platform name.
    aliases: Vec<(String, String)>,
    enabled: HashSet<String>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self {
            platforms: Vec::new(),
            aliases: Vec::new(),
            enabled: HashSet::new(),
        }
    }

    /// Register a platform (enabled by default) along with its built-in aliases.
    pub fn register(&mut self, platform: Arc<dyn HeightPlatform>) -> Result<(), SkyApiError> {
        let name = platform.name().to_string();
        if self.get(&name).is_some() {
            return Err(SkyApiError::DuplicatePlatform(name));
        }

        self.aliases.push((name.to_lowercase(), name.clone()));
        for alias in platform.aliases() {
            self.insert_alias(&name, alias);
        }
        self.enabled.insert(name);
        self.platforms.push(platform);
        Ok(())
    }

    /// Map an extra alias to a registered platform. Returns false if the
    /// platform is unknown or the alias already points elsewhere.
    pub fn add_alias(&mut self, name: &str, alias: &str) -> bool {
        if !self.platforms.iter().any(|p| p.name() == name) {
            return false;
        }
        self.insert_alias(name, alias)
    }

    fn insert_alias(&mut self, name: &str, alias: &str) -> bool {
        let alias = alias.trim().to_lowercase();
        if alias.is_empty() {
            return false;
        }
        match self.aliases.iter().find(|(a, _)| *a == alias) {
            Some((_, owner)) if owner == name => true,
            Some((_, owner)) => {
                warn!("Alias {} already maps to {}", alias, owner);
                false
            }
            None => {
                debug!("Alias {} -> {}", alias, name);
                self.aliases.push((alias, name.to_string()));
                true
            }
        }
    }

    pub fn enable(&mut self, name: &str) {
        if let Some(name) = self.canonical_name(name).map(str::to_string) {
            self.enabled.insert(name);
        }
    }

    pub fn disable(&mut self, name: &str) {
        if let Some(name) = self.canonical_name(name).map(str::to_string) {
            self.enabled.remove(&name);
        }
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.canonical_name(name)
            .is_some_and(|name| self.enabled.contains(name))
    }

    /// Enabled platform names in registration order.
    pub fn enabled_names(&self) -> Vec<&str> {
        self.platforms
            .iter()
            .map(|p| p.name())
            .filter(|name| self.enabled.contains(*name))
            .collect()
    }

    /// Look up a platform by name or alias, enabled or not.
    pub fn get(&self, name_or_alias: &str) -> Option<Arc<dyn HeightPlatform>> {
        let name = self.canonical_name(name_or_alias)?;
        self.platforms.iter().find(|p| p.name() == name).cloned()
    }

    /// Resolve a name or alias (case-insensitive) to its canonical name.
    pub fn canonical_name(&self, name_or_alias: &str) -> Option<&str> {
        let key = name_or_alias.trim().to_lowercase();
        self.aliases
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, name)| name.as_str())
    }

    /// Aliases of a platform, excluding its own name.
    pub fn aliases_of(&self, name: &str) -> Vec<&str> {
        self.aliases
            .iter()
            .filter(|(alias, owner)| owner == name && alias != &name.to_lowercase())
            .map(|(alias, _)| alias.as_str())
            .collect()
    }

    /// Pick the platform for a command. Without an explicit choice the
    /// default is used, or the first enabled platform when the default is off.
    pub fn resolve(&self, input: Option<&str>, default: &str) -> Option<Arc<dyn HeightPlatform>> {
        match input {
            Some(input) => self.get(input).filter(|p| self.enabled.contains(p.name())),
            None => self
                .get(default)
                .filter(|p| self.enabled.contains(p.name()))
                .or_else(|| {
                    self.enabled_names()
                        .first()
                        .and_then(|name| self.get(name))
                }),
        }
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an alias config entry of the form `platform:alias1,alias2`.
pub fn parse_alias_spec(spec: &str) -> Option<(String, Vec<String>)> {
    let (name, aliases) = spec.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let aliases: Vec<String> = aliases
        .split(',')
        .map(str::trim)
        .filter(|alias| !alias.is_empty())
        .map(str::to_string)
        .collect();
    if aliases.is_empty() {
        return None;
    }
    Some((name.to_lowercase(), aliases))
}
