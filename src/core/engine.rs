//! Reconciliation engine: fetch observed state, plan, then apply.
//!
//! The plan is fully computed before the first mutation goes out. Under
//! dry-run the execution phase is skipped entirely, so planning stays free
//! of observable side effects. Reported resources always reflect the state
//! the plan targets, computed from the diff rather than re-fetched, which
//! keeps reports correct under dry-run at the cost of being a prediction.

use serde::{Deserialize, Serialize};

use crate::core::domains::plan_domains;
use crate::core::routing::plan_routing;
use crate::core::users::plan_users;
use crate::domain::model::{Domain, DomainSpec, RoutingRule, RuleSpec, UserSpec};
use crate::domain::ports::MailApi;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::Validate;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Compute and report the full plan without issuing any mutation.
    pub dry_run: bool,
    /// Include a before/after representation in each outcome.
    pub want_diff: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateDiff<R> {
    pub before: Vec<R>,
    pub after: Vec<R>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<R> {
    pub changed: bool,
    /// Predicted final state for the resource kind.
    pub resources: Vec<R>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<StateDiff<R>>,
}

/// Declared state for the domain kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainsDecl {
    /// When true, existing domains not declared here are deleted.
    #[serde(default = "default_true")]
    pub canonical: bool,
    #[serde(default)]
    pub entries: Vec<DomainSpec>,
}

/// Declared state for the routing-rule kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecl {
    /// Domains whose existing rules may be pruned. Absent: every domain
    /// referenced by desired or existing rules. Empty: prune nothing.
    #[serde(default)]
    pub canonical: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub inferred_safety: bool,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

/// Declared state for the user kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsersDecl {
    #[serde(default = "default_true")]
    pub canonical: bool,
    #[serde(default)]
    pub entries: Vec<UserSpec>,
}

/// The full declared state of a run. Each kind is reconciled independently
/// and only when declared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesiredResources {
    #[serde(default)]
    pub domains: Option<DomainsDecl>,
    #[serde(default)]
    pub routing: Option<RoutingDecl>,
    #[serde(default)]
    pub users: Option<UsersDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domains: Option<Outcome<Domain>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_rules: Option<Outcome<RoutingRule>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Outcome<String>>,
}

impl RunReport {
    pub fn changed(&self) -> bool {
        self.domains.as_ref().is_some_and(|o| o.changed)
            || self.routing_rules.as_ref().is_some_and(|o| o.changed)
            || self.users.as_ref().is_some_and(|o| o.changed)
    }
}

fn default_true() -> bool {
    true
}

impl Default for DomainsDecl {
    fn default() -> Self {
        Self {
            canonical: true,
            entries: Vec::new(),
        }
    }
}

impl Default for RoutingDecl {
    fn default() -> Self {
        Self {
            canonical: None,
            inferred_safety: true,
            rules: Vec::new(),
        }
    }
}

impl Default for UsersDecl {
    fn default() -> Self {
        Self {
            canonical: true,
            entries: Vec::new(),
        }
    }
}

pub struct Reconciler<A> {
    api: A,
    opts: RunOptions,
}

impl<A: MailApi> Reconciler<A> {
    pub fn new(api: A, opts: RunOptions) -> Self {
        Self { api, opts }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Reconcile every declared resource kind. A failure in one kind aborts
    /// the whole run; mutations already issued are not rolled back.
    pub async fn run(&self, desired: &DesiredResources) -> Result<RunReport> {
        let domains = match &desired.domains {
            Some(decl) => Some(self.reconcile_domains(&decl.entries, decl.canonical).await?),
            None => None,
        };
        let routing_rules = match &desired.routing {
            Some(decl) => Some(
                self.reconcile_routing(&decl.rules, decl.canonical.as_deref(), decl.inferred_safety)
                    .await?,
            ),
            None => None,
        };
        let users = match &desired.users {
            Some(decl) => Some(self.reconcile_users(&decl.entries, decl.canonical).await?),
            None => None,
        };
        Ok(RunReport {
            domains,
            routing_rules,
            users,
        })
    }

    pub async fn reconcile_domains(
        &self,
        desired: &[DomainSpec],
        canonical: bool,
    ) -> Result<Outcome<Domain>> {
        let existing = self.api.list_domains(false).await?;
        let plan = plan_domains(desired, &existing, canonical)?;
        tracing::info!(
            deletes = plan.deletes.len(),
            updates = plan.updates.len(),
            creates = plan.creates.len(),
            changed = plan.changed,
            "domain plan computed"
        );

        if !self.opts.dry_run {
            for name in &plan.deletes {
                self.api.delete_domain(name).await?;
            }
            for patch in &plan.updates {
                self.api.update_domain_settings(patch).await?;
            }
            for create in &plan.creates {
                self.api.add_domain(&create.spec.name).await?;
                if create.follow_up_update {
                    self.api.update_domain_settings(&create.spec).await?;
                }
            }
        }

        Ok(self.outcome(plan.changed, existing, plan.after))
    }

    pub async fn reconcile_routing(
        &self,
        desired: &[RuleSpec],
        canonical: Option<&[String]>,
        inferred_safety: bool,
    ) -> Result<Outcome<RoutingRule>> {
        let existing = self.api.list_routing_rules().await?;
        let plan = plan_routing(desired, &existing, canonical, inferred_safety)?;
        tracing::info!(
            deletes = plan.deletes.len(),
            creates = plan.creates.len(),
            changed = plan.changed,
            "routing plan computed"
        );

        if !self.opts.dry_run {
            for id in &plan.deletes {
                self.api.delete_routing_rule(*id).await?;
            }
            for rule in &plan.creates {
                self.api.create_routing_rule(rule).await?;
            }
        }

        Ok(self.outcome(plan.changed, existing, plan.after))
    }

    pub async fn reconcile_users(
        &self,
        desired: &[UserSpec],
        canonical: bool,
    ) -> Result<Outcome<String>> {
        let existing = self.api.list_users().await?;
        let plan = plan_users(desired, &existing, canonical)?;
        tracing::info!(
            deletes = plan.deletes.len(),
            creates = plan.creates.len(),
            changed = plan.changed,
            "user plan computed"
        );

        if !self.opts.dry_run {
            for email in &plan.deletes {
                self.api.delete_user(email).await?;
            }
            for spec in &plan.creates {
                self.api.create_user(spec).await?;
            }
        }

        Ok(self.outcome(plan.changed, existing, plan.after))
    }

    /// Single-domain settings update. Unlike full reconciliation this
    /// refuses to touch a domain the account does not have.
    pub async fn update_domain(&self, patch: &DomainSpec) -> Result<Outcome<Domain>> {
        patch.validate()?;
        let existing = self.api.list_domains(false).await?;
        let current = existing
            .iter()
            .find(|d| d.name == patch.name)
            .ok_or_else(|| SyncError::DoesNotExist {
                kind: "domain",
                name: patch.name.clone(),
            })?;

        let changed = patch.updates(current);
        let after = patch.apply_to(current);

        if !self.opts.dry_run {
            self.api.update_domain_settings(patch).await?;
        }

        Ok(self.outcome(changed, vec![current.clone()], vec![after]))
    }

    fn outcome<R: Clone>(&self, changed: bool, before: Vec<R>, after: Vec<R>) -> Outcome<R> {
        let diff = self.opts.want_diff.then(|| StateDiff {
            before,
            after: after.clone(),
        });
        Outcome {
            changed,
            resources: after,
            diff,
        }
    }
}
