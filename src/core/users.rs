//! Mailbox-user reconciliation policy.
//!
//! The identity key is the full email address and the only operations are
//! create and delete; the modify/reset surface of the API gets no policy
//! layered on it.

use serde::Serialize;

use crate::core::diff::diff_sets;
use crate::domain::model::UserSpec;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::Validate;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPlan {
    /// Emails to delete, in existing order.
    pub deletes: Vec<String>,
    /// Users to create, in desired order.
    pub creates: Vec<UserSpec>,
    /// Predicted list of account emails once the plan has been applied.
    pub after: Vec<String>,
    pub changed: bool,
}

pub fn plan_users(desired: &[UserSpec], existing: &[String], canonical: bool) -> Result<UserPlan> {
    for (index, spec) in desired.iter().enumerate() {
        spec.validate().map_err(|e| e.at_index("users", index))?;
    }

    let delta = diff_sets(desired, existing, |d, e| d.email == **e, |_| canonical);

    for spec in &delta.missing {
        if spec.password.is_none() {
            return Err(SyncError::ValidationError {
                field: "password".to_string(),
                reason: format!("user `{}` must be created but has no password", spec.email),
            });
        }
    }

    let after: Vec<String> = existing
        .iter()
        .filter(|e| !delta.extras.contains(*e))
        .cloned()
        .chain(delta.missing.iter().map(|spec| spec.email.clone()))
        .collect();

    let changed = !delta.is_empty();

    Ok(UserPlan {
        deletes: delta.extras,
        creates: delta.missing,
        after,
        changed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> UserSpec {
        UserSpec {
            email: email.to_string(),
            password: Some("hunter2hunter2".to_string()),
            ..Default::default()
        }
    }

    fn remote() -> Vec<String> {
        vec![
            "admin@example.com".to_string(),
            "admin@example2.com".to_string(),
        ]
    }

    #[test]
    fn missing_user_is_created() {
        let desired = vec![user("admin@example.com"), user("toto@newuser.com")];

        let plan = plan_users(&desired, &remote(), false).unwrap();

        assert!(plan.changed);
        assert!(plan.deletes.is_empty());
        assert_eq!(plan.creates, vec![user("toto@newuser.com")]);
        assert_eq!(
            plan.after,
            vec![
                "admin@example.com".to_string(),
                "admin@example2.com".to_string(),
                "toto@newuser.com".to_string(),
            ]
        );
    }

    #[test]
    fn undeclared_user_is_pruned_only_when_canonical() {
        let desired = vec![user("admin@example.com")];

        let canonical = plan_users(&desired, &remote(), true).unwrap();
        assert_eq!(canonical.deletes, vec!["admin@example2.com".to_string()]);
        assert!(canonical.changed);

        let keep = plan_users(&desired, &remote(), false).unwrap();
        assert!(keep.deletes.is_empty());
        assert!(!keep.changed);
        assert_eq!(keep.after, remote());
    }

    #[test]
    fn existing_user_needs_no_password() {
        let desired = vec![UserSpec {
            email: "admin@example.com".to_string(),
            ..Default::default()
        }];

        let plan = plan_users(&desired, &remote(), false).unwrap();
        assert!(!plan.changed);
    }

    #[test]
    fn created_user_requires_a_password() {
        let desired = vec![UserSpec {
            email: "toto@newuser.com".to_string(),
            ..Default::default()
        }];

        let err = plan_users(&desired, &remote(), false).unwrap_err();
        assert!(matches!(
            err,
            SyncError::ValidationError { field, .. } if field == "password"
        ));
    }

    #[test]
    fn invalid_email_names_the_entry() {
        let desired = vec![user("admin@example.com"), user("not-an-email")];

        let err = plan_users(&desired, &remote(), false).unwrap_err();
        assert!(matches!(
            err,
            SyncError::ValidationError { field, .. } if field == "users[1].email"
        ));
    }
}
