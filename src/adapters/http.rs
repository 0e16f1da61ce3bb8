//! Reqwest-backed implementation of the remote client facade.

use async_trait::async_trait;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::OnceLock;

use crate::adapters::wire::{
    AddDomainRequest, ApiResponse, CheckCreditResponse, CreateRoutingRuleRequest,
    CreateUserRequest, DeleteDomainRequest, DeleteRoutingRuleRequest, DeleteUserRequest,
    EmptyRequest, EmptyResponse, GetOwnershipCodeResponse, ListDomainsRequest,
    ListDomainsResponse, ListRoutingRulesResponse, ListUsersResponse,
    UpdateDomainSettingsRequest,
};
use crate::domain::model::{Domain, DomainSpec, RoutingRule, UserSpec};
use crate::domain::ports::MailApi;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};

pub const TOKEN_HEADER: &str = "Purelymail-Api-Token";
pub const DEFAULT_BASE_URL: &str = "https://purelymail.com/api";
pub const DEFAULT_API_VERSION: &str = "v0";

/// Immutable transport configuration, fixed at construction. Request logic
/// never reads ambient process state.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_token: String,
    pub base_url: String,
    pub api_version: String,
    /// Skip TLS certificate verification. Intended for test endpoints.
    pub insecure: bool,
}

impl ApiConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            insecure: false,
        }
    }
}

impl Validate for ApiConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("api_token", &self.api_token)?;
        validate_url("base_url", &self.base_url)?;
        validate_non_empty_string("api_version", &self.api_version)
    }
}

pub struct RestClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl RestClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .build()?;
        Ok(Self { http, config })
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version,
            endpoint.trim_start_matches('/'),
        )
    }

    async fn post<Req, Rep>(&self, endpoint: &str, payload: &Req) -> Result<Rep>
    where
        Req: Serialize + Sync,
        Rep: DeserializeOwned,
    {
        let url = self.url(endpoint);
        tracing::debug!(%url, "calling Purelymail API");

        let response = self
            .http
            .post(&url)
            .header(TOKEN_HEADER, &self.config.api_token)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;

        match response.json::<ApiResponse<Rep>>().await? {
            ApiResponse::Success { result } => Ok(result),
            ApiResponse::Error { code, message } => {
                tracing::debug!(%code, "API returned an error envelope");
                Err(SyncError::ApiError { code, message })
            }
        }
    }
}

fn ownership_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^purelymail_ownership_proof=[A-Za-z0-9]+$").unwrap())
}

#[async_trait]
impl MailApi for RestClient {
    async fn list_domains(&self, include_shared: bool) -> Result<Vec<Domain>> {
        let response: ListDomainsResponse = self
            .post("/listDomains", &ListDomainsRequest { include_shared })
            .await?;
        if !include_shared {
            if let Some(shared) = response.domains.iter().find(|d| d.is_shared) {
                return Err(SyncError::InconsistentResponse {
                    message: format!(
                        "API returned shared domain `{}` despite includeShared=false",
                        shared.name
                    ),
                });
            }
        }
        Ok(response.domains)
    }

    async fn add_domain(&self, name: &str) -> Result<()> {
        let _: EmptyResponse = self
            .post("/addDomain", &AddDomainRequest { domain_name: name })
            .await?;
        Ok(())
    }

    async fn update_domain_settings(&self, patch: &DomainSpec) -> Result<()> {
        let _: EmptyResponse = self
            .post(
                "/updateDomainSettings",
                &UpdateDomainSettingsRequest {
                    name: &patch.name,
                    allow_account_reset: patch.allow_account_reset,
                    symbolic_subaddressing: patch.symbolic_subaddressing,
                    recheck_dns: patch.recheck_dns,
                },
            )
            .await?;
        Ok(())
    }

    async fn delete_domain(&self, name: &str) -> Result<()> {
        let _: EmptyResponse = self
            .post("/deleteDomain", &DeleteDomainRequest { name })
            .await?;
        Ok(())
    }

    async fn list_routing_rules(&self) -> Result<Vec<RoutingRule>> {
        let response: ListRoutingRulesResponse =
            self.post("/listRoutingRules", &EmptyRequest {}).await?;
        Ok(response.rules)
    }

    async fn create_routing_rule(&self, rule: &RoutingRule) -> Result<()> {
        let _: EmptyResponse = self
            .post("/createRoutingRule", &CreateRoutingRuleRequest::from(rule))
            .await?;
        Ok(())
    }

    async fn delete_routing_rule(&self, id: u64) -> Result<()> {
        let _: EmptyResponse = self
            .post(
                "/deleteRoutingRule",
                &DeleteRoutingRuleRequest { routing_rule_id: id },
            )
            .await?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<String>> {
        let response: ListUsersResponse = self.post("/listUser", &EmptyRequest {}).await?;
        Ok(response.users)
    }

    async fn create_user(&self, spec: &UserSpec) -> Result<()> {
        let (user_name, domain_name) = spec.address_parts()?;
        let password = spec
            .password
            .as_deref()
            .ok_or_else(|| SyncError::ValidationError {
                field: "password".to_string(),
                reason: format!("user `{}` cannot be created without a password", spec.email),
            })?;
        let _: EmptyResponse = self
            .post(
                "/createUser",
                &CreateUserRequest {
                    user_name,
                    domain_name,
                    password,
                    enable_password_reset: spec.enable_password_reset,
                    recovery_email: &spec.recovery_email,
                    recovery_email_description: &spec.recovery_email_description,
                    recovery_phone: &spec.recovery_phone,
                    recovery_phone_description: &spec.recovery_phone_description,
                    enable_search_indexing: spec.enable_search_indexing,
                    send_welcome_email: spec.send_welcome_email,
                },
            )
            .await?;
        Ok(())
    }

    async fn delete_user(&self, email: &str) -> Result<()> {
        let _: EmptyResponse = self
            .post("/deleteUser", &DeleteUserRequest { user_name: email })
            .await?;
        Ok(())
    }

    async fn check_account_credit(&self) -> Result<f64> {
        let response: CheckCreditResponse =
            self.post("/checkAccountCredit", &EmptyRequest {}).await?;
        let credit: f64 = serde_json::from_str(&response.credit)?;
        Ok(credit)
    }

    async fn get_ownership_code(&self) -> Result<String> {
        let response: GetOwnershipCodeResponse =
            self.post("/getOwnershipCode", &EmptyRequest {}).await?;
        if !ownership_code_regex().is_match(&response.code) {
            return Err(SyncError::InconsistentResponse {
                message: format!("unexpected ownership code shape: `{}`", response.code),
            });
        }
        Ok(response.code)
    }
}
