//! Entry point tying the queries, proxy control and reconcilers together

use crate::config::{DesiredConfiguration, PortosConfig, Settings};
use crate::models::{Distribution, ProxyTable, Service};
use crate::proxy::PortProxy;
use crate::reconcile::{self, ProxyAction, ReconcileReport, StartService};
use crate::runner::{CommandRunner, ProcessRunner};
use crate::wsl::Wsl;
use crate::Result;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The operations a tray UI needs
///
/// Reconciliation passes of the same kind issued through one `Portos` are
/// serialised; two handles (or two processes) racing on the same proxy
/// table are not guarded against.
pub struct Portos {
    wsl: Wsl,
    proxy: PortProxy,
    ports_pass: Mutex<()>,
    services_pass: Mutex<()>,
}

impl Portos {
    /// Run real host tools
    pub fn new(config: PortosConfig) -> Result<Self> {
        config.validate()?;
        let runner = Arc::new(ProcessRunner::new(config.command_timeout));
        Ok(Self::with_runner(runner, config))
    }

    /// Run commands through a custom runner
    pub fn with_runner(runner: Arc<dyn CommandRunner>, config: PortosConfig) -> Self {
        Self {
            proxy: PortProxy::new(runner.clone(), &config),
            wsl: Wsl::new(runner, config),
            ports_pass: Mutex::new(()),
            services_pass: Mutex::new(()),
        }
    }

    pub async fn start_distribution(&self, name: &str) -> Result<()> {
        self.wsl.start_distribution(name).await
    }

    pub async fn terminate_distribution(&self, name: &str) -> Result<()> {
        self.wsl.terminate_distribution(name).await
    }

    pub async fn list_distributions(&self) -> Result<Vec<Distribution>> {
        self.wsl.list_distributions().await
    }

    /// Current host proxy rules
    pub async fn proxies(&self) -> Result<ProxyTable> {
        self.proxy.list().await
    }

    /// Make the host proxy table match the desired ports
    ///
    /// Fails only when the proxy table or the distribution list cannot be
    /// read at all; per-distribution and per-rule problems end up in the
    /// report.
    pub async fn map_ports(&self, desired: &DesiredConfiguration) -> Result<ReconcileReport<ProxyAction>> {
        desired.validate()?;
        let _pass = self.ports_pass.lock().await;

        let (table, distros) = tokio::try_join!(self.proxy.list(), self.wsl.list_distributions())?;
        let plan = reconcile::plan_port_mappings(desired, &distros, &table);
        tracing::debug!(actions = plan.actions.len(), skipped = plan.skipped.len(), "Port mapping planned");

        Ok(reconcile::apply_proxy_actions(&self.proxy, plan).await)
    }

    /// Start every configured service that is not running
    pub async fn auto_start_services(&self, desired: &DesiredConfiguration) -> Result<ReconcileReport<StartService>> {
        desired.validate()?;
        let _pass = self.services_pass.lock().await;

        Ok(reconcile::auto_start_services(&self.wsl, desired).await)
    }

    pub async fn start_service(&self, name: &str, service: &str) -> Result<Vec<Service>> {
        self.wsl.start_service(name, service).await
    }

    pub async fn stop_service(&self, name: &str, service: &str) -> Result<Vec<Service>> {
        self.wsl.stop_service(name, service).await
    }

    /// Start or stop a service, returning the service table afterwards
    pub async fn set_service_state(&self, name: &str, service: &str, running: bool) -> Result<Vec<Service>> {
        if running {
            self.start_service(name, service).await
        } else {
            self.stop_service(name, service).await
        }
    }

    /// One full update cycle
    ///
    /// Maps ports and starts services concurrently, then lists distributions
    /// and brings `settings` up to date with what is installed.
    pub async fn refresh(&self, settings: &mut Settings) -> Result<Refresh> {
        let (ports, services) = tokio::join!(
            self.map_ports(&settings.distros),
            self.auto_start_services(&settings.distros),
        );
        if let Err(e) = &ports {
            tracing::warn!(error = %e, "Port mapping pass failed");
        }
        if let Err(e) = &services {
            tracing::warn!(error = %e, "Service auto-start pass failed");
        }

        let distributions = self.list_distributions().await?;
        let settings_changed = settings.sync_with(&distributions);

        Ok(Refresh {
            ports,
            services,
            distributions,
            settings_changed,
        })
    }
}

/// Result of [`Portos::refresh`]
#[derive(Debug)]
pub struct Refresh {
    pub ports: Result<ReconcileReport<ProxyAction>>,
    pub services: Result<ReconcileReport<StartService>>,
    pub distributions: Vec<Distribution>,
    /// Settings gained or lost distributions and should be saved
    pub settings_changed: bool,
}
