//! Listening socket model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transport {
    Tcp4,
    Tcp6,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Tcp4 => write!(f, "tcp4"),
            Transport::Tcp6 => write!(f, "tcp6"),
        }
    }
}

/// A port something inside a distribution is listening on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePort {
    pub transport: Transport,
    pub port: u16,
    pub program: String,
    pub active: bool,
}
