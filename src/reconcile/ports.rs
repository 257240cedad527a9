use super::{execute, Plan, ReconcileReport, Skipped};
use crate::config::DesiredConfiguration;
use crate::models::{Distribution, ProxyTable};
use crate::proxy::PortProxy;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyAction {
    /// Forward host `port` to the same port on `ip`
    Add { ip: Ipv4Addr, port: u16 },
    /// Drop the host rule listening on `port`
    Remove { port: u16 },
}

impl std::fmt::Display for ProxyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyAction::Add { ip, port } => write!(f, "add proxy {} -> {}:{}", port, ip, port),
            ProxyAction::Remove { port } => write!(f, "remove proxy {}", port),
        }
    }
}

/// Diff desired ports against the host proxy table
///
/// Only distributions that are configured and have an observed address take
/// part. An auto-mapped distribution whose listening ports could not be read
/// is skipped rather than treated as having none, which would tear down its
/// rules.
pub fn plan_port_mappings(
    desired: &DesiredConfiguration,
    distros: &[Distribution],
    table: &ProxyTable,
) -> Plan<ProxyAction> {
    let mut plan = Plan::default();

    for distro in distros {
        let Some(settings) = desired.get(&distro.name) else {
            continue;
        };
        let Some(ip) = distro.ip else {
            if distro.is_running() && distro.has_own_network() {
                plan.skipped.push(Skipped {
                    distro: distro.name.clone(),
                    reason: "address unavailable".into(),
                });
            }
            continue;
        };

        let wanted: BTreeSet<u16> = if settings.auto_map {
            match &distro.ports {
                Some(ports) => ports.iter().map(|p| p.port).collect(),
                None => {
                    plan.skipped.push(Skipped {
                        distro: distro.name.clone(),
                        reason: "listening ports unavailable".into(),
                    });
                    continue;
                }
            }
        } else {
            settings.ports.iter().copied().collect()
        };

        let key = ip.to_string();
        let proxied = table.ports(&key);

        for &port in &wanted {
            if !proxied.is_some_and(|rules| rules.contains_key(&port)) {
                plan.actions.push(ProxyAction::Add { ip, port });
            }
        }

        for (dest_port, source) in proxied.into_iter().flatten() {
            if !wanted.contains(dest_port) {
                plan.actions.push(ProxyAction::Remove { port: source.port });
            }
        }
    }

    // An add replaces whatever rule listens on its port; a delete of the same
    // listen port would race it
    let added: BTreeSet<u16> = plan
        .actions
        .iter()
        .filter_map(|action| match *action {
            ProxyAction::Add { port, .. } => Some(port),
            ProxyAction::Remove { .. } => None,
        })
        .collect();
    plan.actions
        .retain(|action| !matches!(action, ProxyAction::Remove { port } if added.contains(port)));

    plan
}

/// Apply planned proxy changes concurrently
pub async fn apply_proxy_actions(
    proxy: &PortProxy,
    plan: Plan<ProxyAction>,
) -> ReconcileReport<ProxyAction> {
    execute(plan, |action| async move {
        match action {
            ProxyAction::Add { ip, port } => proxy.add(ip, port).await,
            ProxyAction::Remove { port } => proxy.remove(port).await,
        }
    })
    .await
}
