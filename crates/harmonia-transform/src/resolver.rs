//! Evaluation order of calculated variables.

use std::collections::HashSet;

use harmonia_model::CalculatedVariables;
use tracing::{debug, warn};

/// Upper bound on resolution passes.
pub const MAX_RESOLUTION_ITERATIONS: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Names in evaluation order.
    pub order: Vec<String>,
    /// Names still waiting on a dependency when the pass limit was reached.
    pub unresolved: Vec<String>,
}

/// Orders calculated variables so every variable follows its calculated
/// dependencies. Variables that cannot be ordered within
/// [`MAX_RESOLUTION_ITERATIONS`] passes are left out.
pub fn resolve(calculated: &CalculatedVariables) -> Vec<String> {
    resolve_with_limit(calculated, MAX_RESOLUTION_ITERATIONS).order
}

/// Fixed-point ordering with an explicit pass limit.
///
/// Each pass tests every pending variable against the pending set as it was
/// at the start of the pass; a variable is ready once none of its
/// dependencies are pending. Dependencies that are not calculated variables
/// never block.
pub fn resolve_with_limit(calculated: &CalculatedVariables, max_iterations: usize) -> Resolution {
    let mut pending: Vec<&str> = calculated.names();
    let mut order = Vec::with_capacity(pending.len());
    let mut iterations = 0;

    while !pending.is_empty() && iterations < max_iterations {
        iterations += 1;
        let blocked: HashSet<&str> = pending.iter().copied().collect();
        let (ready, waiting): (Vec<&str>, Vec<&str>) = pending.into_iter().partition(|name| {
            calculated.get(name).is_none_or(|variable| {
                variable
                    .dependencies
                    .iter()
                    .all(|dependency| !blocked.contains(dependency.as_str()))
            })
        });
        order.extend(ready.into_iter().map(str::to_string));
        pending = waiting;
    }

    if !pending.is_empty() {
        warn!(
            unresolved = ?pending,
            iterations,
            "calculated variables left unresolved and dropped"
        );
    }
    debug!(order = ?order, "resolved calculated variables");

    Resolution {
        order,
        unresolved: pending.into_iter().map(str::to_string).collect(),
    }
}
