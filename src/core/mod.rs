pub mod diff;
pub mod domains;
pub mod engine;
pub mod routing;
pub mod users;

pub use crate::domain::model::{
    classify_preset, DnsSummary, Domain, DomainSpec, Preset, RoutingRule, RuleSpec, UserSpec,
};
pub use crate::domain::ports::MailApi;
pub use crate::utils::error::Result;
