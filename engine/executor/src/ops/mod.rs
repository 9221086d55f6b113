//! Operation contracts from spec §4.1.2, one file per cluster action kind plus the
//! shared helpers they're all built from.
use serde_json::Value as Json;
use uuid::Uuid;

use fleetcore_models::Action;
use fleetcore_models::Cluster;
use fleetcore_models::ClusterStatus;

mod create;
mod delete;
mod membership;
mod node_action;
mod policy;
mod resize;
mod update;

pub use node_action::InlineDispatcherBackend;
pub use node_action::NodeActionExecutor;

/// Parse `action.inputs[key]` as a list of node ids, skipping anything malformed.
pub(crate) fn parse_uuid_list(action: &Action, key: &str) -> Vec<Uuid> {
    action
        .inputs
        .get(key)
        .and_then(Json::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|v| v.as_str().and_then(|s| Uuid::parse_str(s).ok()))
                .collect()
        })
        .unwrap_or_default()
}

/// Sentinel unbounded `max_size`, matching `fleetcore_models::cluster::UNBOUNDED`.
const UNBOUNDED: i64 = fleetcore_models::UNBOUNDED;

/// A cluster size bound a computed `desired_capacity` falls outside of.
pub(crate) enum SizeViolation {
    BelowMin(i64),
    AboveMax(i64),
}

/// Check `desired` against `[min, max]` (`max == UNBOUNDED` meaning no upper bound).
pub(crate) fn check_size_violation(desired: i64, min: i64, max: i64) -> Option<SizeViolation> {
    if desired < min {
        return Some(SizeViolation::BelowMin(min));
    }
    if max != UNBOUNDED && desired > max {
        return Some(SizeViolation::AboveMax(max));
    }
    None
}

/// Format a size violation the way `do_resize` reports it: against the *requested*
/// bound (the resize's own `min_size`/`max_size` inputs, defaulting to the cluster's
/// current ones).
pub(crate) fn specified_bound_message(desired: i64, violation: SizeViolation) -> String {
    match violation {
        SizeViolation::BelowMin(min) => format!(
            "The target capacity ({}) is less than the specified min_size ({}).",
            desired, min
        ),
        SizeViolation::AboveMax(max) => format!(
            "The target capacity ({}) is greater than the specified max_size ({}).",
            desired, max
        ),
    }
}

/// Format a size violation the way `do_scale_in`/`do_scale_out` report it: against the
/// cluster's own current bound, since scale operations don't carry a `min_size`/
/// `max_size` override.
pub(crate) fn cluster_bound_message(desired: i64, violation: SizeViolation) -> String {
    match violation {
        SizeViolation::BelowMin(min) => format!(
            "The target capacity ({}) is less than the cluster's min_size ({}).",
            desired, min
        ),
        SizeViolation::AboveMax(max) => format!(
            "The target capacity ({}) is greater than the cluster's max_size ({}).",
            desired, max
        ),
    }
}

/// Read the adjustment count for scale-in/out: `action.data[data_key]['count']` if a
/// policy already stashed one (from a prior BEFORE check), else `inputs['count']`,
/// else `1` (spec §4.1.2).
pub(crate) fn scale_count(action: &Action, data_key: &str) -> i64 {
    if let Some(count) = action
        .data_object(data_key)
        .and_then(|m| m.get("count"))
        .and_then(Json::as_i64)
    {
        return count;
    }
    action.inputs.get("count").and_then(Json::as_i64).unwrap_or(1)
}

/// `calculate_desired`: apply a resize adjustment against `current`.
///
/// `CHANGE_IN_PERCENTAGE` rounds to the nearest whole node, but never computes a
/// zero-sized change from a non-zero percentage (so a 1% adjustment on a 3-node
/// cluster still moves the cluster by at least one node, matching the "min step"
/// behaviour of the source system this spec distills).
pub(crate) fn calculate_desired(current: i64, adjustment_type: &str, number: i64) -> i64 {
    match adjustment_type {
        "EXACT_CAPACITY" => number,
        "CHANGE_IN_CAPACITY" => current + number,
        "CHANGE_IN_PERCENTAGE" => {
            let raw = current as f64 * (number as f64 / 100.0);
            let mut delta = raw.round() as i64;
            if delta == 0 && number != 0 {
                delta = if number > 0 { 1 } else { -1 };
            }
            current + delta
        }
        _ => current + number,
    }
}

/// `truncate_desired`: clamp a computed `desired` into the cluster's *current* bounds,
/// unless `strict` is set — in which case the raw value passes through so a subsequent
/// `check_size_violation` against the *requested* bounds can still report a violation
/// (spec §8's strict boundary scenario depends on this).
pub(crate) fn truncate_desired(cluster: &Cluster, desired: i64, strict: bool) -> i64 {
    if strict {
        return desired;
    }
    let mut value = desired;
    if value < cluster.min_size {
        value = cluster.min_size;
    }
    if cluster.max_size != UNBOUNDED && value > cluster.max_size {
        value = cluster.max_size;
    }
    value
}
