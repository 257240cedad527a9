use super::{execute, Plan, ReconcileReport, Skipped};
use crate::config::DesiredConfiguration;
use crate::models::Service;
use crate::wsl::Wsl;
use futures::future::join_all;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartService {
    pub distro: String,
    pub service: String,
}

impl std::fmt::Display for StartService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "start {} on {}", self.service, self.distro)
    }
}

/// Every desired service that is not currently running
///
/// `observed` holds the service table of each distribution that could be
/// queried; configured distributions missing from it are skipped.
pub fn plan_service_starts(
    desired: &DesiredConfiguration,
    observed: &BTreeMap<String, Vec<Service>>,
) -> Plan<StartService> {
    let mut plan = Plan::default();

    for (name, settings) in desired.iter() {
        if settings.services.is_empty() {
            continue;
        }
        let Some(services) = observed.get(name) else {
            plan.skipped.push(Skipped {
                distro: name.to_string(),
                reason: "service table unavailable".into(),
            });
            continue;
        };

        let running: BTreeSet<&str> = services
            .iter()
            .filter(|s| s.is_running())
            .map(|s| s.name.as_str())
            .collect();

        let mut planned = BTreeSet::new();
        for service in &settings.services {
            if !running.contains(service.as_str()) && planned.insert(service.as_str()) {
                plan.actions.push(StartService {
                    distro: name.to_string(),
                    service: service.clone(),
                });
            }
        }
    }

    plan
}

/// Start every configured service that is not running
///
/// Service tables of all configured distributions are read concurrently,
/// then all starts are issued together.
pub async fn auto_start_services(
    wsl: &Wsl,
    desired: &DesiredConfiguration,
) -> ReconcileReport<StartService> {
    let names: Vec<&str> = desired
        .iter()
        .filter(|(_, settings)| !settings.services.is_empty())
        .map(|(name, _)| name)
        .collect();

    let tables = join_all(
        names
            .into_iter()
            .map(|name| async move { (name, wsl.services(name).await) }),
    )
    .await;

    let mut observed = BTreeMap::new();
    let mut unreadable = Vec::new();
    for (name, result) in tables {
        match result {
            Ok(services) => {
                observed.insert(name.to_string(), services);
            }
            Err(e) => {
                tracing::warn!(distro = %name, error = %e, "Could not read service table");
                unreadable.push(Skipped {
                    distro: name.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let mut plan = plan_service_starts(desired, &observed);
    plan.skipped = unreadable;

    execute(plan, |action| async move {
        let services = wsl.start_service(&action.distro, &action.service).await?;
        if !services
            .iter()
            .any(|s| s.name == action.service && s.is_running())
        {
            tracing::warn!(distro = %action.distro, service = %action.service, "Service not reported running after start");
        }
        Ok::<_, crate::Error>(())
    })
    .await
}
