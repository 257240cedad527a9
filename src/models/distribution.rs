//! Distribution model

use super::{ActivePort, Service};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Run state reported by `wsl --list -v`
///
/// Only `Running` distributions are queried. The transitional states show
/// up while wsl.exe installs, converts or removes a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistroState {
    Running,
    Stopped,
    Installing,
    Converting,
    Uninstalling,
    /// A state this version of portos does not know
    Unknown,
}

impl DistroState {
    /// Map the STATE column; unrecognised labels become `Unknown`
    pub fn from_label(label: &str) -> Self {
        match label {
            "Running" => DistroState::Running,
            "Stopped" => DistroState::Stopped,
            "Installing" => DistroState::Installing,
            "Converting" => DistroState::Converting,
            "Uninstalling" => DistroState::Uninstalling,
            _ => DistroState::Unknown,
        }
    }
}

impl std::fmt::Display for DistroState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistroState::Running => write!(f, "Running"),
            DistroState::Stopped => write!(f, "Stopped"),
            DistroState::Installing => write!(f, "Installing"),
            DistroState::Converting => write!(f, "Converting"),
            DistroState::Uninstalling => write!(f, "Uninstalling"),
            DistroState::Unknown => write!(f, "Unknown"),
        }
    }
}

/// OS family recognised from `/etc/issue`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsFamily {
    Arch,
    Alpine,
    #[serde(rename = "CentOS")]
    CentOs,
    #[serde(rename = "RHEL")]
    Rhel,
    Ubuntu,
    Kali,
    Unknown,
}

impl std::fmt::Display for OsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OsFamily::Arch => write!(f, "Arch"),
            OsFamily::Alpine => write!(f, "Alpine"),
            OsFamily::CentOs => write!(f, "CentOS"),
            OsFamily::Rhel => write!(f, "RHEL"),
            OsFamily::Ubuntu => write!(f, "Ubuntu"),
            OsFamily::Kali => write!(f, "Kali"),
            OsFamily::Unknown => write!(f, "Unknown"),
        }
    }
}

/// One row of `wsl --list -v`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistroEntry {
    pub name: String,
    pub state: DistroState,
    pub wsl_version: u8,
}

/// Which per-distribution query failed while building a [`Distribution`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Query {
    OsDetails,
    KernelVersion,
    Ip,
    Ports,
    Services,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFailure {
    pub query: Query,
    pub error: String,
    /// The query ran but its output did not parse
    pub malformed_output: bool,
}

impl QueryFailure {
    pub fn new(query: Query, error: &crate::Error) -> Self {
        Self {
            query,
            error: error.to_string(),
            malformed_output: error.is_malformed_output(),
        }
    }
}

/// A WSL distribution with whatever detail could be queried from inside it
///
/// Distributions that are not running are never entered, so they only carry the list
/// entry and `distribution == Unknown`. WSL1 distributions share the host
/// network stack and carry no ip/ports/services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub name: String,
    pub state: DistroState,
    pub wsl_version: u8,
    pub distribution: OsFamily,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<Ipv4Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<ActivePort>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<Service>>,
    /// Queries that failed; their fields are left empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<QueryFailure>,
}

impl Distribution {
    /// A distribution nothing has been queried from yet
    pub fn from_entry(entry: DistroEntry) -> Self {
        Self {
            name: entry.name,
            state: entry.state,
            wsl_version: entry.wsl_version,
            distribution: OsFamily::Unknown,
            kernel_version: None,
            ip: None,
            ports: None,
            services: None,
            failures: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == DistroState::Running
    }

    /// WSL2 and later give each distribution its own network interface
    pub fn has_own_network(&self) -> bool {
        self.wsl_version > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_entry_is_bare() {
        let distro = Distribution::from_entry(DistroEntry {
            name: "Ubuntu".into(),
            state: DistroState::Stopped,
            wsl_version: 2,
        });

        assert_eq!(distro.distribution, OsFamily::Unknown);
        assert!(distro.ip.is_none() && distro.ports.is_none() && distro.services.is_none());
        assert!(!distro.is_running());
        assert!(distro.has_own_network());
    }

    #[test]
    fn test_serialization_skips_absent_fields() {
        let distro = Distribution::from_entry(DistroEntry {
            name: "Legacy".into(),
            state: DistroState::Running,
            wsl_version: 1,
        });

        let json = serde_json::to_value(&distro).unwrap();
        assert_eq!(json["wslVersion"], 1);
        assert_eq!(json["distribution"], "Unknown");
        assert!(json.get("ip").is_none());
        assert!(json.get("failures").is_none());
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(DistroState::from_label("Running"), DistroState::Running);
        assert_eq!(DistroState::from_label("Converting"), DistroState::Converting);
        assert_eq!(DistroState::from_label("Exporting"), DistroState::Unknown);
        assert_eq!(DistroState::Uninstalling.to_string(), "Uninstalling");
    }

    #[test]
    fn test_os_family_names() {
        assert_eq!(serde_json::to_string(&OsFamily::Rhel).unwrap(), "\"RHEL\"");
        assert_eq!(OsFamily::CentOs.to_string(), "CentOS");
    }
}
