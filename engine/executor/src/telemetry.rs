//! Metrics for the cluster action executor, following the per-component
//! `prometheus::Registry` registration convention used across the engine's backends.
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::CounterVec;
use prometheus::Opts;

/// Total number of top-level cluster actions that reached [`crate::ClusterActionExecutor::execute`],
/// labelled by action kind.
pub static ACTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "fleetcore_executor_actions_total",
            "Total number of top-level cluster actions executed, by kind",
        ),
        &["kind"],
    )
    .expect("failed to initialise ACTIONS_TOTAL counter")
});

/// Number of top-level cluster actions that ended in a non-OK result, by kind and code.
pub static ACTIONS_ERROR: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "fleetcore_executor_actions_error",
            "Number of top-level cluster actions that did not end in OK, by kind and result code",
        ),
        &["kind", "code"],
    )
    .expect("failed to initialise ACTIONS_ERROR counter")
});

static METRICS_REGISTERED: AtomicBool = AtomicBool::new(false);

/// Register the executor's metrics with `reg`. Safe to call more than once: only the
/// first call actually registers anything.
pub fn register_metrics(reg: &prometheus::Registry) -> Result<()> {
    if METRICS_REGISTERED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }

    let collectors: [Box<dyn prometheus::core::Collector>; 2] =
        [Box::new(ACTIONS_TOTAL.clone()), Box::new(ACTIONS_ERROR.clone())];
    for collector in collectors {
        reg.register(collector)?;
    }
    Ok(())
}
