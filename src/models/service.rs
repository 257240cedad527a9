//! Init service model

use serde::{Deserialize, Serialize};

/// Status marker printed by `service --status-all`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceStatus {
    Unknown,
    Running,
    Stopped,
}

impl ServiceStatus {
    /// Map a `[ ? ]` / `[ + ]` / `[ - ]` marker
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "?" => Some(ServiceStatus::Unknown),
            "+" => Some(ServiceStatus::Running),
            "-" => Some(ServiceStatus::Stopped),
            _ => None,
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            ServiceStatus::Unknown => "?",
            ServiceStatus::Running => "+",
            ServiceStatus::Stopped => "-",
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceStatus::Unknown => write!(f, "Unknown"),
            ServiceStatus::Running => write!(f, "Running"),
            ServiceStatus::Stopped => write!(f, "Stopped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub status: ServiceStatus,
}

impl Service {
    pub fn is_running(&self) -> bool {
        self.status == ServiceStatus::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers() {
        for status in [ServiceStatus::Unknown, ServiceStatus::Running, ServiceStatus::Stopped] {
            assert_eq!(ServiceStatus::from_marker(status.marker()), Some(status));
        }
        assert_eq!(ServiceStatus::from_marker("*"), None);
    }
}
