//! Host port proxying through `netsh interface portproxy`

use crate::config::PortosConfig;
use crate::models::ProxyTable;
use crate::parsers;
use crate::runner::CommandRunner;
use crate::Result;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Adds, removes and lists v4-to-v4 proxy rules on the host
///
/// netsh treats adding an existing rule or deleting a missing one as
/// success, so none of these calls check first.
#[derive(Clone)]
pub struct PortProxy {
    runner: Arc<dyn CommandRunner>,
    netsh_path: String,
    listen_address: String,
}

impl PortProxy {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &PortosConfig) -> Self {
        Self {
            runner,
            netsh_path: config.netsh_path.clone(),
            listen_address: config.listen_address.clone(),
        }
    }

    async fn portproxy(&self, args: &[String]) -> Result<String> {
        let mut full = vec!["interface".to_string(), "portproxy".to_string()];
        full.extend_from_slice(args);
        self.runner.run(&self.netsh_path, &full).await
    }

    /// Current rules
    pub async fn list(&self) -> Result<ProxyTable> {
        let output = self
            .portproxy(&["show".to_string(), "all".to_string()])
            .await?;
        parsers::parse_proxy_table(&output)
    }

    /// Forward `port` on the host listen address to the same port on `target`
    pub async fn add(&self, target: Ipv4Addr, port: u16) -> Result<()> {
        self.portproxy(&[
            "add".to_string(),
            "v4tov4".to_string(),
            format!("listenport={}", port),
            format!("listenaddress={}", self.listen_address),
            format!("connectport={}", port),
            format!("connectaddress={}", target),
        ])
        .await?;
        tracing::info!(ip = %target, port, "Proxy rule added");
        Ok(())
    }

    /// Drop the rule listening on `port`
    pub async fn remove(&self, port: u16) -> Result<()> {
        self.portproxy(&[
            "delete".to_string(),
            "v4tov4".to_string(),
            format!("listenport={}", port),
            format!("listenaddress={}", self.listen_address),
        ])
        .await?;
        tracing::info!(port, "Proxy rule removed");
        Ok(())
    }
}
