use async_trait::async_trait;

use crate::domain::model::{Domain, DomainSpec, RoutingRule, UserSpec};
use crate::utils::error::Result;

/// Remote client facade over the Purelymail REST API. One method per API
/// operation; every call either returns a typed result or a typed error.
/// Transport, auth and TLS are entirely the implementor's concern.
#[async_trait]
pub trait MailApi: Send + Sync {
    async fn list_domains(&self, include_shared: bool) -> Result<Vec<Domain>>;
    async fn add_domain(&self, name: &str) -> Result<()>;
    async fn update_domain_settings(&self, patch: &DomainSpec) -> Result<()>;
    async fn delete_domain(&self, name: &str) -> Result<()>;

    async fn list_routing_rules(&self) -> Result<Vec<RoutingRule>>;
    async fn create_routing_rule(&self, rule: &RoutingRule) -> Result<()>;
    async fn delete_routing_rule(&self, id: u64) -> Result<()>;

    async fn list_users(&self) -> Result<Vec<String>>;
    async fn create_user(&self, spec: &UserSpec) -> Result<()>;
    async fn delete_user(&self, email: &str) -> Result<()>;

    async fn check_account_credit(&self) -> Result<f64>;
    async fn get_ownership_code(&self) -> Result<String>;
}
