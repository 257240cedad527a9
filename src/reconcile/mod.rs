//! Bring the host and distributions in line with the desired configuration
//!
//! Each reconciler is split into a pure planning step that diffs desired
//! against observed state, and an apply step that runs every planned action
//! concurrently. One failing action never stops its siblings; failures are
//! collected in the [`ReconcileReport`].

mod ports;
mod services;

pub use ports::{apply_proxy_actions, plan_port_mappings, ProxyAction};
pub use services::{auto_start_services, plan_service_starts, StartService};

use crate::Error;
use futures::future::join_all;
use std::fmt::Display;
use std::future::Future;

/// A distribution reconciliation left alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub distro: String,
    pub reason: String,
}

/// Actions to take, plus the distributions that could not be planned for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan<A> {
    pub actions: Vec<A>,
    pub skipped: Vec<Skipped>,
}

impl<A> Default for Plan<A> {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct Failed<A> {
    pub action: A,
    pub error: Error,
}

/// Outcome of one reconciliation pass
#[derive(Debug)]
pub struct ReconcileReport<A> {
    pub applied: Vec<A>,
    pub failed: Vec<Failed<A>>,
    pub skipped: Vec<Skipped>,
}

impl<A> Default for ReconcileReport<A> {
    fn default() -> Self {
        Self {
            applied: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<A> ReconcileReport<A> {
    /// Nothing failed and nothing was skipped
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Run all actions at once and sort the outcomes
async fn execute<A, F, Fut>(plan: Plan<A>, run: F) -> ReconcileReport<A>
where
    A: Clone + Display,
    F: Fn(A) -> Fut,
    Fut: Future<Output = crate::Result<()>>,
{
    let outcomes = join_all(plan.actions.into_iter().map(|action| {
        let pending = run(action.clone());
        async move { (action, pending.await) }
    }))
    .await;

    let mut report = ReconcileReport {
        skipped: plan.skipped,
        ..Default::default()
    };
    for (action, outcome) in outcomes {
        match outcome {
            Ok(()) => report.applied.push(action),
            Err(error) => {
                tracing::warn!(action = %action, error = %error, "Reconcile action failed");
                report.failed.push(Failed { action, error });
            }
        }
    }
    report
}
