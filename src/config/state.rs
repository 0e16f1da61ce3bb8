//! Desired-state file loading.
//!
//! The file is a TOML document with one optional table per resource kind:
//!
//! ```toml
//! [domains]
//! canonical = true
//! [[domains.entries]]
//! name = "example.com"
//! symbolic_subaddressing = false
//!
//! [routing]
//! canonical = ["example.com"]
//! [[routing.rules]]
//! domain_name = "example.com"
//! preset = "exact_match"
//! match_user = "admin"
//! target_addresses = ["ops@example.com"]
//!
//! [users]
//! canonical = false
//! [[users.entries]]
//! email = "admin@example.com"
//! password = "..."
//! ```

use std::path::Path;

use crate::core::engine::DesiredResources;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::Validate;

impl Validate for DesiredResources {
    fn validate(&self) -> Result<()> {
        if self.domains.is_none() && self.routing.is_none() && self.users.is_none() {
            return Err(SyncError::ConfigError {
                message: "state file declares no resources (expected at least one of \
                          [domains], [routing], [users])"
                    .to_string(),
            });
        }
        Ok(())
    }
}

pub fn load_state(path: &Path) -> Result<DesiredResources> {
    let raw = std::fs::read_to_string(path)?;
    let state: DesiredResources = toml::from_str(&raw)?;
    state.validate()?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_state(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn full_state_file_round_trips() {
        let file = write_state(
            r#"
            [domains]
            canonical = false
            [[domains.entries]]
            name = "example.com"
            symbolic_subaddressing = true
            recheck_dns = true

            [routing]
            canonical = ["example.com"]
            [[routing.rules]]
            domain_name = "example.com"
            preset = "prefix_match"
            match_user = "sales"
            target_addresses = ["ops@example.com"]

            [users]
            [[users.entries]]
            email = "admin@example.com"
            password = "dQw4w9WgXcQ"
            "#,
        );

        let state = load_state(file.path()).unwrap();

        let domains = state.domains.unwrap();
        assert!(!domains.canonical);
        assert_eq!(domains.entries[0].name, "example.com");
        assert_eq!(domains.entries[0].symbolic_subaddressing, Some(true));
        assert!(domains.entries[0].recheck_dns);
        assert_eq!(domains.entries[0].allow_account_reset, None);

        let routing = state.routing.unwrap();
        assert_eq!(routing.canonical.as_deref(), Some(&["example.com".to_string()][..]));
        assert!(routing.inferred_safety);
        assert_eq!(
            routing.rules[0].preset,
            Some(crate::domain::model::Preset::PrefixMatch)
        );

        let users = state.users.unwrap();
        assert!(users.canonical);
        assert_eq!(users.entries[0].email, "admin@example.com");
    }

    #[test]
    fn omitted_scope_differs_from_empty_scope() {
        let file = write_state(
            r#"
            [routing]
            rules = []
            "#,
        );
        assert_eq!(load_state(file.path()).unwrap().routing.unwrap().canonical, None);

        let file = write_state(
            r#"
            [routing]
            canonical = []
            rules = []
            "#,
        );
        assert_eq!(
            load_state(file.path()).unwrap().routing.unwrap().canonical,
            Some(vec![])
        );
    }

    #[test]
    fn canonical_defaults_to_true_for_domains_and_users() {
        let file = write_state(
            r#"
            [domains]
            entries = []

            [users]
            entries = []
            "#,
        );
        let state = load_state(file.path()).unwrap();
        assert!(state.domains.unwrap().canonical);
        assert!(state.users.unwrap().canonical);
    }

    #[test]
    fn unknown_preset_literal_fails_to_parse() {
        let file = write_state(
            r#"
            [routing]
            [[routing.rules]]
            domain_name = "example.com"
            preset = "catch_everything"
            target_addresses = ["a@example.com"]
            "#,
        );
        assert!(matches!(
            load_state(file.path()),
            Err(SyncError::StateFileError(_))
        ));
    }

    #[test]
    fn empty_state_file_is_a_config_error() {
        let file = write_state("");
        assert!(matches!(
            load_state(file.path()),
            Err(SyncError::ConfigError { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            load_state(Path::new("/nonexistent/purelymail.toml")),
            Err(SyncError::IoError(_))
        ));
    }
}
