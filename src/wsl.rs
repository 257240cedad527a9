//! wsl.exe wrappers
//!
//! Per-distribution queries run a tool inside the distribution as the
//! configured user and feed stdout to the matching parser. Nothing is cached:
//! every call reflects the system as it is right now.

use crate::config::PortosConfig;
use crate::models::{
    ActivePort, DistroEntry, Distribution, OsFamily, Query, QueryFailure, Service,
};
use crate::parsers;
use crate::runner::CommandRunner;
use crate::{Error, Result};
use std::net::Ipv4Addr;
use std::sync::Arc;

const SERVICE_TOOL: &str = "/usr/sbin/service";

/// Distribution lifecycle and queries
#[derive(Clone)]
pub struct Wsl {
    runner: Arc<dyn CommandRunner>,
    config: PortosConfig,
}

impl Wsl {
    pub fn new(runner: Arc<dyn CommandRunner>, config: PortosConfig) -> Self {
        Self { runner, config }
    }

    async fn wsl(&self, args: Vec<String>) -> Result<String> {
        self.runner.run(&self.config.wsl_path, &args).await
    }

    /// Boot a distribution by running `/bin/true` in it
    pub async fn start_distribution(&self, name: &str) -> Result<()> {
        self.wsl(args(&["-d", name, "-e", "/bin/true"]))
            .await
            .map_err(|e| e.for_distribution(name))?;
        tracing::info!(distro = %name, "Distribution started");
        Ok(())
    }

    pub async fn terminate_distribution(&self, name: &str) -> Result<()> {
        self.wsl(args(&["-t", name]))
            .await
            .map_err(|e| e.for_distribution(name))?;
        tracing::info!(distro = %name, "Distribution terminated");
        Ok(())
    }

    /// Installed distributions as listed by `wsl --list -v`
    pub async fn list_entries(&self) -> Result<Vec<DistroEntry>> {
        let output = self.wsl(args(&["--list", "-v"])).await?;
        parsers::parse_distro_list(&output)
    }

    /// Run a command inside `name` as the configured user
    pub async fn exec(&self, name: &str, command: &[&str]) -> Result<String> {
        let mut full = args(&["-u", self.config.exec_user.as_str(), "-d", name, "-e"]);
        full.extend(command.iter().map(|s| s.to_string()));
        self.wsl(full).await.map_err(|e| e.for_distribution(name))
    }

    pub async fn os_details(&self, name: &str) -> Result<OsFamily> {
        let output = self.exec(name, &["cat", "/etc/issue"]).await?;
        Ok(parsers::parse_issue_file(&output))
    }

    pub async fn kernel_version(&self, name: &str) -> Result<String> {
        let output = self.exec(name, &["uname", "-r"]).await?;
        parsers::parse_kernel_version(&output)
    }

    pub async fn ip_address(&self, name: &str) -> Result<Ipv4Addr> {
        let output = self
            .exec(name, &["ip", "addr", "show", self.config.interface.as_str()])
            .await?;
        parsers::parse_ip_address(&output)
    }

    pub async fn active_ports(&self, name: &str) -> Result<Vec<ActivePort>> {
        let output = self.exec(name, &["netstat", "-lpnt"]).await?;
        parsers::parse_netstat(&output)
    }

    pub async fn services(&self, name: &str) -> Result<Vec<Service>> {
        let output = self.exec(name, &[SERVICE_TOOL, "--status-all"]).await?;
        parsers::parse_service_list(&output)
    }

    /// Start a service and return the service table afterwards
    pub async fn start_service(&self, name: &str, service: &str) -> Result<Vec<Service>> {
        self.control_service(name, service, "start").await
    }

    /// Stop a service and return the service table afterwards
    pub async fn stop_service(&self, name: &str, service: &str) -> Result<Vec<Service>> {
        self.control_service(name, service, "stop").await
    }

    async fn control_service(&self, name: &str, service: &str, verb: &str) -> Result<Vec<Service>> {
        if service.trim().is_empty() {
            return Err(Error::Config("service name cannot be empty".into()));
        }

        self.exec(name, &[SERVICE_TOOL, service, verb]).await?;
        tracing::info!(distro = %name, service = %service, action = %verb, "Service control issued");

        // init scripts print free-form text; re-read the table for the outcome
        self.services(name).await
    }

    /// Fill in everything that can be queried for one listed distribution
    ///
    /// A failing query leaves its field empty and is recorded in
    /// `failures`; the remaining queries still run.
    pub async fn describe(&self, entry: DistroEntry) -> Distribution {
        let mut distro = Distribution::from_entry(entry);
        if !distro.is_running() {
            return distro;
        }

        let name = distro.name.clone();
        if distro.has_own_network() {
            let (os, kernel, ip, ports, services) = tokio::join!(
                self.os_details(&name),
                self.kernel_version(&name),
                self.ip_address(&name),
                self.active_ports(&name),
                self.services(&name),
            );
            distro.distribution = record(&mut distro, Query::OsDetails, os).unwrap_or(OsFamily::Unknown);
            distro.kernel_version = record(&mut distro, Query::KernelVersion, kernel);
            distro.ip = record(&mut distro, Query::Ip, ip);
            distro.ports = record(&mut distro, Query::Ports, ports);
            distro.services = record(&mut distro, Query::Services, services);
        } else {
            let (os, kernel) = tokio::join!(self.os_details(&name), self.kernel_version(&name));
            distro.distribution = record(&mut distro, Query::OsDetails, os).unwrap_or(OsFamily::Unknown);
            distro.kernel_version = record(&mut distro, Query::KernelVersion, kernel);
        }

        distro
    }

    /// Every distribution with its details
    ///
    /// Distributions are described one after another, in list order, so
    /// wsl.exe is never asked about several of them at once.
    pub async fn list_distributions(&self) -> Result<Vec<Distribution>> {
        let entries = self.list_entries().await?;

        let mut distros = Vec::with_capacity(entries.len());
        for entry in entries {
            distros.push(self.describe(entry).await);
        }
        Ok(distros)
    }
}

fn record<T>(distro: &mut Distribution, query: Query, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(distro = %distro.name, query = ?query, error = %e, "Distribution query failed");
            distro.failures.push(QueryFailure::new(query, &e));
            None
        }
    }
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
