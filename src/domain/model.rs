use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{
    validate_email, validate_non_empty_string, validate_positive_id, Validate,
};

/// The four rule shapes the Purelymail WebUI exposes. Arbitrary
/// (match_user, prefix, catchall) combinations are accepted by the API but
/// silently reinterpreted; everything we plan against maps to one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    AnyAddress,
    CatchallExceptValid,
    PrefixMatch,
    ExactMatch,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::AnyAddress,
        Preset::CatchallExceptValid,
        Preset::PrefixMatch,
        Preset::ExactMatch,
    ];

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "any_address" => Ok(Preset::AnyAddress),
            "catchall_except_valid" => Ok(Preset::CatchallExceptValid),
            "prefix_match" => Ok(Preset::PrefixMatch),
            "exact_match" => Ok(Preset::ExactMatch),
            other => Err(SyncError::UnknownPresetError {
                name: other.to_string(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Preset::AnyAddress => "any_address",
            Preset::CatchallExceptValid => "catchall_except_valid",
            Preset::PrefixMatch => "prefix_match",
            Preset::ExactMatch => "exact_match",
        }
    }

    /// `any_address` and `catchall_except_valid` both claim a domain's
    /// whole unmatched address space; only one of them may exist per domain.
    pub fn is_catchall_class(self) -> bool {
        matches!(self, Preset::AnyAddress | Preset::CatchallExceptValid)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a raw field combination back to its WebUI preset, if any.
/// (prefix=false, catchall=true) has no UI equivalent and stays `None`.
pub fn classify_preset(match_user: &str, prefix: bool, catchall: bool) -> Option<Preset> {
    match (match_user.is_empty(), prefix, catchall) {
        (true, true, false) => Some(Preset::AnyAddress),
        (true, true, true) => Some(Preset::CatchallExceptValid),
        (false, true, false) => Some(Preset::PrefixMatch),
        (_, false, false) => Some(Preset::ExactMatch),
        _ => None,
    }
}

/// A mail-delivery routing directive.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingRule {
    pub prefix: bool,
    pub catchall: bool,
    pub domain_name: String,
    pub match_user: String,
    pub target_addresses: Vec<String>,
    /// Remote-assigned; `None` until the rule has been created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

/// Structural equality: `id` never participates. Two rules differing only
/// in their remote id are the same logical rule.
impl PartialEq for RoutingRule {
    fn eq(&self, other: &Self) -> bool {
        self.prefix == other.prefix
            && self.catchall == other.catchall
            && self.domain_name == other.domain_name
            && self.match_user == other.match_user
            && self.target_addresses == other.target_addresses
    }
}

impl RoutingRule {
    pub fn preset(&self) -> Option<Preset> {
        classify_preset(&self.match_user, self.prefix, self.catchall)
    }
}

impl Validate for RoutingRule {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("domain_name", &self.domain_name)?;
        if self.target_addresses.is_empty() {
            return Err(SyncError::ValidationError {
                field: "target_addresses".to_string(),
                reason: "at least one target address is required".to_string(),
            });
        }
        for address in &self.target_addresses {
            validate_email("target_addresses", address)?;
        }
        if let Some(id) = self.id {
            validate_positive_id("id", id)?;
        }
        Ok(())
    }
}

/// Caller-declared routing rule: either a preset or all three raw fields.
/// Resolution to a canonical `RoutingRule` happens exactly once, here; a
/// resolved rule never carries a preset alongside contradicting raw fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub domain_name: String,
    pub target_addresses: Vec<String>,
    #[serde(default)]
    pub preset: Option<Preset>,
    #[serde(default)]
    pub match_user: Option<String>,
    #[serde(default)]
    pub prefix: Option<bool>,
    #[serde(default)]
    pub catchall: Option<bool>,
}

impl RuleSpec {
    /// Resolve to the canonical record shape. With a preset, the preset's
    /// values win over whatever the caller put in the raw fields
    /// (match_user is kept for `prefix_match`/`exact_match`, where it is
    /// required). Without one, all three raw fields must be present.
    pub fn resolve(&self, index: usize) -> Result<RoutingRule> {
        let (match_user, prefix, catchall) = match self.preset {
            Some(Preset::AnyAddress) => (String::new(), true, false),
            Some(Preset::CatchallExceptValid) => (String::new(), true, true),
            Some(Preset::PrefixMatch) => (self.required_match_user(index)?, true, false),
            Some(Preset::ExactMatch) => (self.required_match_user(index)?, false, false),
            None => match (&self.match_user, self.prefix, self.catchall) {
                (Some(user), Some(prefix), Some(catchall)) => (user.clone(), prefix, catchall),
                _ => return Err(SyncError::IncompleteRuleError { index }),
            },
        };

        let rule = RoutingRule {
            prefix,
            catchall,
            domain_name: self.domain_name.clone(),
            match_user,
            target_addresses: self.target_addresses.clone(),
            id: None,
        };
        rule.validate()?;
        Ok(rule)
    }

    fn required_match_user(&self, index: usize) -> Result<String> {
        self.match_user
            .clone()
            .ok_or_else(|| SyncError::ValidationError {
                field: format!("rules[{}].match_user", index),
                reason: "required for the `prefix_match` and `exact_match` presets".to_string(),
            })
    }
}

/// Remote-computed DNS verification summary. Never client-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsSummary {
    pub passes_mx: bool,
    pub passes_spf: bool,
    pub passes_dkim: bool,
    pub passes_dmarc: bool,
}

impl DnsSummary {
    pub const fn all_passing() -> Self {
        Self {
            passes_mx: true,
            passes_spf: true,
            passes_dkim: true,
            passes_dmarc: true,
        }
    }
}

/// An owned/verified sending domain as the API reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub name: String,
    pub allow_account_reset: bool,
    pub symbolic_subaddressing: bool,
    /// Provider-owned shared domain; read-only, excluded from listings
    /// unless explicitly requested.
    pub is_shared: bool,
    pub dns_summary: DnsSummary,
}

impl Domain {
    /// State the API gives a freshly added domain: permissive settings,
    /// DNS assumed passing until the remote reports otherwise.
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allow_account_reset: true,
            symbolic_subaddressing: true,
            is_shared: false,
            dns_summary: DnsSummary::all_passing(),
        }
    }
}

impl Validate for Domain {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("name", &self.name)
    }
}

/// Caller-declared domain: a name plus the mutable settings to enforce.
/// Unset settings are left as the remote has them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSpec {
    pub name: String,
    #[serde(default)]
    pub allow_account_reset: Option<bool>,
    #[serde(default)]
    pub symbolic_subaddressing: Option<bool>,
    #[serde(default)]
    pub recheck_dns: bool,
}

impl DomainSpec {
    /// Whether applying this spec to `existing` would issue an update.
    /// `recheck_dns` always counts: DNS state is remote-authoritative and
    /// cannot be diffed client-side.
    pub fn updates(&self, existing: &Domain) -> bool {
        self.recheck_dns || self.settings_differ(existing)
    }

    /// Settings-only comparison, ignoring `recheck_dns`. Used to decide
    /// whether a just-created domain needs an immediate settings update.
    pub fn settings_differ(&self, existing: &Domain) -> bool {
        self.allow_account_reset
            .is_some_and(|v| v != existing.allow_account_reset)
            || self
                .symbolic_subaddressing
                .is_some_and(|v| v != existing.symbolic_subaddressing)
    }

    /// Predicted result of applying this spec. DNS summary carries over
    /// unchanged even under `recheck_dns`; only the remote can move it.
    pub fn apply_to(&self, existing: &Domain) -> Domain {
        Domain {
            name: existing.name.clone(),
            allow_account_reset: self
                .allow_account_reset
                .unwrap_or(existing.allow_account_reset),
            symbolic_subaddressing: self
                .symbolic_subaddressing
                .unwrap_or(existing.symbolic_subaddressing),
            is_shared: existing.is_shared,
            dns_summary: existing.dns_summary,
        }
    }
}

impl Validate for DomainSpec {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("name", &self.name)
    }
}

/// Caller-declared mailbox user. Identity is the full email address; the
/// remaining fields only matter when the user has to be created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSpec {
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub enable_password_reset: bool,
    #[serde(default)]
    pub recovery_email: String,
    #[serde(default)]
    pub recovery_email_description: String,
    #[serde(default)]
    pub recovery_phone: String,
    #[serde(default)]
    pub recovery_phone_description: String,
    #[serde(default)]
    pub enable_search_indexing: bool,
    #[serde(default)]
    pub send_welcome_email: bool,
}

impl UserSpec {
    /// `(local_part, domain_name)` of the address.
    pub fn address_parts(&self) -> Result<(&str, &str)> {
        self.email
            .split_once('@')
            .ok_or_else(|| SyncError::ValidationError {
                field: "email".to_string(),
                reason: format!("`{}` is not a valid email address", self.email),
            })
    }
}

impl Validate for UserSpec {
    fn validate(&self) -> Result<()> {
        validate_email("email", &self.email)
    }
}
