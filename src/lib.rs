//! portos
//!
//! Keeps Windows host port proxies and in-distribution services in line
//! with what the user configured for each WSL distribution.
//!
//! # Key Features
//!
//! - **Distribution listing** - state, WSL version, OS family, kernel, address,
//!   listening ports and services, read fresh from the running system
//! - **Port proxying** - diffs desired ports against `netsh portproxy` rules
//!   and adds/removes only what differs
//! - **Service auto-start** - starts configured services that are not running
//! - **Failure isolation** - one unreachable distribution or failed rule does
//!   not hide the others
//!
//! # Example
//!
//! ```no_run
//! use portos::{DesiredConfiguration, DistroSettings, Portos, PortosConfig};
//!
//! # async fn run() -> portos::Result<()> {
//! let portos = Portos::new(PortosConfig::default())?;
//!
//! let desired = DesiredConfiguration::new().with(
//!     "Ubuntu",
//!     DistroSettings::builder().ports([22, 80]).service("ssh").build(),
//! );
//!
//! let ports = portos.map_ports(&desired).await?;
//! let services = portos.auto_start_services(&desired).await?;
//! println!("{} rules changed, {} services started", ports.applied.len(), services.applied.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod parsers;
pub mod portos;
pub mod proxy;
pub mod reconcile;
pub mod runner;
pub mod wsl;

pub use config::{DesiredConfiguration, DistroSettings, PortosConfig, Settings};
pub use error::{Error, Result};
pub use models::{Distribution, ProxyTable, Service};
pub use portos::{Portos, Refresh};
