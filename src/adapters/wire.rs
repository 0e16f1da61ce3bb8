//! Request/response shapes for the Purelymail REST API (v0).
//!
//! Every endpoint is a POST returning a JSON envelope discriminated on
//! `type`: `{"type": "success", "result": ...}` or
//! `{"type": "error", "code": ..., "message": ...}`.

use serde::{Deserialize, Serialize};

use crate::domain::model::{Domain, RoutingRule};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ApiResponse<T> {
    Success { result: T },
    Error { code: String, message: String },
}

#[derive(Debug, Serialize)]
pub struct EmptyRequest {}

#[derive(Debug, Deserialize)]
pub struct EmptyResponse {}

// Domains

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDomainsRequest {
    pub include_shared: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListDomainsResponse {
    pub domains: Vec<Domain>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDomainRequest<'a> {
    pub domain_name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDomainSettingsRequest<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_account_reset: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbolic_subaddressing: Option<bool>,
    pub recheck_dns: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteDomainRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct GetOwnershipCodeResponse {
    pub code: String,
}

// Routing

#[derive(Debug, Deserialize)]
pub struct ListRoutingRulesResponse {
    pub rules: Vec<RoutingRule>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoutingRuleRequest<'a> {
    pub domain_name: &'a str,
    pub match_user: &'a str,
    pub prefix: bool,
    pub catchall: bool,
    pub target_addresses: &'a [String],
}

impl<'a> From<&'a RoutingRule> for CreateRoutingRuleRequest<'a> {
    fn from(rule: &'a RoutingRule) -> Self {
        Self {
            domain_name: &rule.domain_name,
            match_user: &rule.match_user,
            prefix: rule.prefix,
            catchall: rule.catchall,
            target_addresses: &rule.target_addresses,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRoutingRuleRequest {
    pub routing_rule_id: u64,
}

// Users

#[derive(Debug, Deserialize)]
pub struct ListUsersResponse {
    pub users: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest<'a> {
    pub user_name: &'a str,
    pub domain_name: &'a str,
    pub password: &'a str,
    pub enable_password_reset: bool,
    pub recovery_email: &'a str,
    pub recovery_email_description: &'a str,
    pub recovery_phone: &'a str,
    pub recovery_phone_description: &'a str,
    pub enable_search_indexing: bool,
    pub send_welcome_email: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserRequest<'a> {
    pub user_name: &'a str,
}

// Billing

#[derive(Debug, Deserialize)]
pub struct CheckCreditResponse {
    /// A JSON-encoded number inside a string field, as the API sends it.
    pub credit: String,
}
