//! Desired state and runtime configuration

use crate::models::Distribution;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// What the user wants for one distribution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DistroSettings {
    /// Proxy whatever is listening instead of `ports`
    pub auto_map: bool,
    pub ports: Vec<u16>,
    /// Services that must be running
    pub services: Vec<String>,
}

impl DistroSettings {
    pub fn builder() -> DistroSettingsBuilder {
        DistroSettingsBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        match self.problem() {
            Some(problem) => Err(Error::Config(problem.to_string())),
            None => Ok(()),
        }
    }

    fn problem(&self) -> Option<&'static str> {
        if self.ports.contains(&0) {
            return Some("port 0 cannot be proxied");
        }
        if self.services.iter().any(|s| s.trim().is_empty()) {
            return Some("service names cannot be empty");
        }
        None
    }
}

#[derive(Default)]
pub struct DistroSettingsBuilder {
    settings: DistroSettings,
}

impl DistroSettingsBuilder {
    pub fn auto_map(mut self, enabled: bool) -> Self {
        self.settings.auto_map = enabled;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.settings.ports.push(port);
        self
    }

    pub fn ports(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.settings.ports.extend(ports);
        self
    }

    pub fn service(mut self, name: impl Into<String>) -> Self {
        self.settings.services.push(name.into());
        self
    }

    pub fn build(self) -> DistroSettings {
        self.settings
    }
}

/// Desired settings keyed by distribution name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesiredConfiguration(BTreeMap<String, DistroSettings>);

impl DesiredConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, settings: DistroSettings) -> Self {
        self.insert(name, settings);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, settings: DistroSettings) {
        self.0.insert(name.into(), settings);
    }

    pub fn get(&self, name: &str) -> Option<&DistroSettings> {
        self.0.get(name)
    }

    /// Settings for `name`, failing if the distribution is not configured
    pub fn require(&self, name: &str) -> Result<&DistroSettings> {
        self.get(name)
            .ok_or_else(|| Error::Config(format!("no settings for distribution {}", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<DistroSettings> {
        self.0.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DistroSettings)> {
        self.0.iter().map(|(name, settings)| (name.as_str(), settings))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        for (name, settings) in self.iter() {
            if name.trim().is_empty() {
                return Err(Error::Config("distribution name cannot be empty".into()));
            }
            if let Some(problem) = settings.problem() {
                return Err(Error::Config(format!("{}: {}", name, problem)));
            }
        }
        Ok(())
    }
}

/// The persisted settings document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[serde(rename = "hideWSL1")]
    pub hide_wsl1: bool,
    pub start_on_boot: bool,
    pub distros: DesiredConfiguration,
}

impl Settings {
    /// Load from a JSON file; a missing file means defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&text)?;
        settings.distros.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Give new distributions default settings and forget vanished ones
    ///
    /// Returns true when anything changed.
    pub fn sync_with(&mut self, distros: &[Distribution]) -> bool {
        let mut changed = false;

        for distro in distros {
            if !self.distros.contains(&distro.name) {
                tracing::info!(distro = %distro.name, "Adding default settings");
                self.distros.insert(distro.name.clone(), DistroSettings::default());
                changed = true;
            }
        }

        let vanished: Vec<String> = self
            .distros
            .names()
            .filter(|name| !distros.iter().any(|d| d.name == *name))
            .map(str::to_string)
            .collect();
        for name in vanished {
            tracing::info!(distro = %name, "Dropping settings for removed distribution");
            self.distros.remove(&name);
            changed = true;
        }

        changed
    }

    /// The distributions a listing should show
    pub fn visible<'a>(&self, distros: &'a [Distribution]) -> Vec<&'a Distribution> {
        distros
            .iter()
            .filter(|d| !(self.hide_wsl1 && !d.has_own_network()))
            .collect()
    }
}

/// How portos reaches the host tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortosConfig {
    pub wsl_path: String,
    pub netsh_path: String,
    /// User commands inside a distribution run as
    pub exec_user: String,
    /// Interface whose address proxy rules forward to
    pub interface: String,
    /// Host address proxy rules listen on
    pub listen_address: String,
    pub command_timeout: Duration,
}

impl Default for PortosConfig {
    fn default() -> Self {
        Self {
            wsl_path: "wsl.exe".to_string(),
            netsh_path: "netsh.exe".to_string(),
            exec_user: "root".to_string(),
            interface: "eth0".to_string(),
            listen_address: "0.0.0.0".to_string(),
            command_timeout: Duration::from_secs(30),
        }
    }
}

impl PortosConfig {
    pub fn builder() -> PortosConfigBuilder {
        PortosConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.wsl_path.is_empty() || self.netsh_path.is_empty() {
            return Err(Error::Config("tool paths cannot be empty".into()));
        }
        if self.exec_user.is_empty() {
            return Err(Error::Config("exec_user cannot be empty".into()));
        }
        if self.command_timeout.is_zero() {
            return Err(Error::Config("command_timeout must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct PortosConfigBuilder {
    config: PortosConfig,
}

impl PortosConfigBuilder {
    pub fn wsl_path(mut self, path: impl Into<String>) -> Self {
        self.config.wsl_path = path.into();
        self
    }

    pub fn netsh_path(mut self, path: impl Into<String>) -> Self {
        self.config.netsh_path = path.into();
        self
    }

    pub fn exec_user(mut self, user: impl Into<String>) -> Self {
        self.config.exec_user = user.into();
        self
    }

    pub fn interface(mut self, interface: impl Into<String>) -> Self {
        self.config.interface = interface.into();
        self
    }

    pub fn listen_address(mut self, address: impl Into<String>) -> Self {
        self.config.listen_address = address.into();
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    pub fn build(self) -> PortosConfig {
        self.config
    }

    pub fn build_validated(self) -> Result<PortosConfig> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
