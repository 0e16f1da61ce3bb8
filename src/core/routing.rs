//! Routing-rule reconciliation policy.
//!
//! Rules are immutable once matched structurally; a "change" is always
//! delete-old + create-new. Pruning is scoped by an allow-list of domain
//! names with a smart default: when the caller gives no scope, every
//! domain touched by either side is in scope; an explicit empty scope
//! disables pruning entirely.

use std::collections::HashSet;

use serde::Serialize;

use crate::core::diff::diff_sets;
use crate::domain::model::{Preset, RoutingRule, RuleSpec};
use crate::utils::error::{Result, SyncError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingPlan {
    /// Ids of rules to delete, in existing order.
    pub deletes: Vec<u64>,
    /// Rules to create, in desired order.
    pub creates: Vec<RoutingRule>,
    /// Predicted state: (existing - extras) ++ missing, in that order.
    pub after: Vec<RoutingRule>,
    pub changed: bool,
}

pub fn plan_routing(
    desired: &[RuleSpec],
    existing: &[RoutingRule],
    canonical: Option<&[String]>,
    inferred_safety: bool,
) -> Result<RoutingPlan> {
    let resolved = desired
        .iter()
        .enumerate()
        .map(|(index, spec)| spec.resolve(index))
        .collect::<Result<Vec<_>>>()?;

    let scope: HashSet<&str> = match canonical {
        Some(names) => names.iter().map(String::as_str).collect(),
        None => resolved
            .iter()
            .map(|r| r.domain_name.as_str())
            .chain(existing.iter().map(|r| r.domain_name.as_str()))
            .collect(),
    };

    if inferred_safety {
        check_inferred_safety(&resolved, existing, &scope)?;
    }

    let delta = diff_sets(
        &resolved,
        existing,
        |d, e| d == e,
        |e| scope.contains(e.domain_name.as_str()),
    );

    let mut deletes = Vec::with_capacity(delta.extras.len());
    for extra in &delta.extras {
        let id = extra.id.ok_or_else(|| SyncError::InconsistentResponse {
            message: format!("listed routing rule on `{}` has no id", extra.domain_name),
        })?;
        deletes.push(id);
    }

    let after: Vec<RoutingRule> = existing
        .iter()
        .filter(|e| !(scope.contains(e.domain_name.as_str()) && !resolved.iter().any(|d| d == *e)))
        .cloned()
        .chain(delta.missing.iter().cloned())
        .collect();

    let changed = !deletes.is_empty() || !delta.missing.is_empty();

    Ok(RoutingPlan {
        deletes,
        creates: delta.missing,
        after,
        changed,
    })
}

/// Pre-flight checks for configurations the remote API would accept but
/// silently reinterpret (it defaults unrecognized patterns to the
/// `any_address` behavior).
fn check_inferred_safety(
    resolved: &[RoutingRule],
    existing: &[RoutingRule],
    scope: &HashSet<&str>,
) -> Result<()> {
    for (index, rule) in resolved.iter().enumerate() {
        let preset = rule
            .preset()
            .ok_or(SyncError::UnrecognizedPatternError { index })?;

        if preset == Preset::ExactMatch && rule.match_user.is_empty() {
            return Err(SyncError::InvalidExactMatchError { index });
        }

        if !preset.is_catchall_class() {
            continue;
        }

        let conflicting_desired = resolved
            .iter()
            .enumerate()
            .any(|(other, r)| {
                other != index
                    && r.domain_name == rule.domain_name
                    && r.preset().is_some_and(Preset::is_catchall_class)
            });
        // An existing rule structurally equal to this one is this rule,
        // not a conflict; anything else catchall-class on the same
        // in-scope domain is.
        let conflicting_existing = scope.contains(rule.domain_name.as_str())
            && existing.iter().any(|r| {
                r.domain_name == rule.domain_name
                    && r != rule
                    && r.preset().is_some_and(Preset::is_catchall_class)
            });

        if conflicting_desired || conflicting_existing {
            return Err(SyncError::DuplicateCatchAllError {
                index,
                domain: rule.domain_name.clone(),
            });
        }
    }
    Ok(())
}
