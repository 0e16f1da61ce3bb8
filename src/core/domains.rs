//! Domain reconciliation policy.
//!
//! Deletions are scoped by a single `canonical` flag: when set, every
//! existing domain not declared is pruned; when unset nothing is ever
//! deleted. A freshly added domain starts from the API's permissive
//! defaults, so a follow-up settings update is only planned when the
//! declared settings actually differ from those defaults.

use serde::Serialize;

use crate::core::diff::{diff_sets, diff_updates};
use crate::domain::model::{Domain, DomainSpec};
use crate::utils::error::Result;
use crate::utils::validation::Validate;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainCreate {
    pub spec: DomainSpec,
    /// Whether an immediate settings update must follow the add call.
    /// `recheck_dns` alone does not trigger one: adding the domain already
    /// causes a fresh DNS evaluation remotely.
    pub follow_up_update: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainPlan {
    /// Names to delete, in existing order.
    pub deletes: Vec<String>,
    /// Settings patches for domains present remotely, in desired order.
    pub updates: Vec<DomainSpec>,
    /// Domains to add, in desired order.
    pub creates: Vec<DomainCreate>,
    /// Predicted state once the plan has been applied.
    pub after: Vec<Domain>,
    pub changed: bool,
}

pub fn plan_domains(
    desired: &[DomainSpec],
    existing: &[Domain],
    canonical: bool,
) -> Result<DomainPlan> {
    for (index, spec) in desired.iter().enumerate() {
        spec.validate().map_err(|e| e.at_index("domains", index))?;
    }

    let delta = diff_sets(desired, existing, |d, e| d.name == e.name, |_| canonical);
    let updates = diff_updates(
        desired,
        existing,
        |d, e| d.name == e.name,
        |d, e| d.updates(e),
    );

    let mut after: Vec<Domain> = existing
        .iter()
        .filter(|e| !delta.extras.iter().any(|extra| extra.name == e.name))
        .map(|e| match updates.iter().find(|(ex, _)| ex.name == e.name) {
            Some((_, patch)) => patch.apply_to(e),
            None => e.clone(),
        })
        .collect();
    after.extend(
        delta
            .missing
            .iter()
            .map(|spec| spec.apply_to(&Domain::with_defaults(&spec.name))),
    );

    let creates = delta
        .missing
        .iter()
        .map(|spec| DomainCreate {
            follow_up_update: spec.settings_differ(&Domain::with_defaults(&spec.name)),
            spec: spec.clone(),
        })
        .collect::<Vec<_>>();

    let changed = !delta.extras.is_empty() || !updates.is_empty() || !creates.is_empty();

    Ok(DomainPlan {
        deletes: delta.extras.into_iter().map(|d| d.name).collect(),
        updates: updates.into_iter().map(|(_, patch)| patch).collect(),
        creates,
        after,
        changed,
    })
}
