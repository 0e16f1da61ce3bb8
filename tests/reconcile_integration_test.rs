//! End-to-end reconciliation against a mocked Purelymail API.

use httpmock::prelude::*;
use serde_json::json;

use purelymail_sync::config::state;
use purelymail_sync::core::engine::{DesiredResources, RoutingDecl};
use purelymail_sync::domain::model::{DomainSpec, Preset, RuleSpec, UserSpec};
use purelymail_sync::{ApiConfig, Reconciler, RestClient, RunOptions, SyncError};

fn client_for(server: &MockServer) -> RestClient {
    RestClient::new(ApiConfig {
        api_token: "test-token".to_string(),
        base_url: server.url(""),
        api_version: "v0".to_string(),
        insecure: false,
    })
    .unwrap()
}

fn engine_for(server: &MockServer, opts: RunOptions) -> Reconciler<RestClient> {
    Reconciler::new(client_for(server), opts)
}

fn success(result: serde_json::Value) -> serde_json::Value {
    json!({"type": "success", "result": result})
}

fn toto_rule() -> serde_json::Value {
    json!({
        "id": 1,
        "prefix": true,
        "catchall": false,
        "domainName": "example.com",
        "matchUser": "toto",
        "targetAddresses": ["admin@example.com"],
    })
}

#[tokio::test]
async fn scenario_undeclared_rule_in_scope_is_deleted() {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(POST).path("/v0/listRoutingRules");
        then.status(200).json_body(success(json!({"rules": [toto_rule()]})));
    });
    let delete = server.mock(|when, then| {
        when.method(POST)
            .path("/v0/deleteRoutingRule")
            .json_body(json!({"routingRuleId": 1}));
        then.status(200).json_body(success(json!({})));
    });

    let scope = vec!["example.com".to_string()];
    let outcome = engine_for(&server, RunOptions::default())
        .reconcile_routing(&[], Some(&scope), true)
        .await
        .unwrap();

    list.assert();
    delete.assert();
    assert!(outcome.changed);
    assert!(outcome.resources.is_empty());
}

#[tokio::test]
async fn scenario_settings_update_patches_only_declared_fields() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v0/listDomains");
        then.status(200).json_body(success(json!({"domains": [{
            "name": "example.com",
            "allowAccountReset": true,
            "symbolicSubaddressing": false,
            "isShared": false,
            "dnsSummary": {
                "passesMx": true, "passesSpf": true,
                "passesDkim": true, "passesDmarc": true
            }
        }]})));
    });
    // allowAccountReset stays undeclared and must not appear in the patch.
    let update = server.mock(|when, then| {
        when.method(POST)
            .path("/v0/updateDomainSettings")
            .json_body(json!({
                "name": "example.com",
                "symbolicSubaddressing": true,
                "recheckDns": false,
            }));
        then.status(200).json_body(success(json!({})));
    });

    let desired = vec![DomainSpec {
        name: "example.com".to_string(),
        symbolic_subaddressing: Some(true),
        ..Default::default()
    }];
    let outcome = engine_for(&server, RunOptions::default())
        .reconcile_domains(&desired, true)
        .await
        .unwrap();

    update.assert();
    assert!(outcome.changed);
    assert!(outcome.resources[0].symbolic_subaddressing);
    assert!(outcome.resources[0].allow_account_reset);
}

#[tokio::test]
async fn scenario_empty_exact_match_fails_before_any_mutation() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v0/listRoutingRules");
        then.status(200).json_body(success(json!({"rules": []})));
    });
    let create = server.mock(|when, then| {
        when.method(POST).path("/v0/createRoutingRule");
        then.status(200).json_body(success(json!({})));
    });
    let delete = server.mock(|when, then| {
        when.method(POST).path("/v0/deleteRoutingRule");
        then.status(200).json_body(success(json!({})));
    });

    let desired = vec![RuleSpec {
        domain_name: "example.com".to_string(),
        target_addresses: vec!["a@example.com".to_string()],
        preset: Some(Preset::ExactMatch),
        match_user: Some(String::new()),
        ..Default::default()
    }];
    let err = engine_for(&server, RunOptions::default())
        .reconcile_routing(&desired, None, true)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::InvalidExactMatchError { index: 0 }));
    create.assert_hits(0);
    delete.assert_hits(0);
}

#[tokio::test]
async fn dry_run_reports_like_a_real_run_without_mutating() {
    let desired = vec![RuleSpec {
        domain_name: "example.com".to_string(),
        target_addresses: vec!["helpdesk@example.com".to_string()],
        preset: Some(Preset::ExactMatch),
        match_user: Some("newuser".to_string()),
        ..Default::default()
    }];
    let scope = vec!["example.com".to_string()];

    let run = |dry_run: bool| {
        let desired = desired.clone();
        let scope = scope.clone();
        async move {
            let server = MockServer::start();
            server.mock(|when, then| {
                when.method(POST).path("/v0/listRoutingRules");
                then.status(200)
                    .json_body(success(json!({"rules": [toto_rule()]})));
            });
            let delete = server.mock(|when, then| {
                when.method(POST).path("/v0/deleteRoutingRule");
                then.status(200).json_body(success(json!({})));
            });
            let create = server.mock(|when, then| {
                when.method(POST).path("/v0/createRoutingRule");
                then.status(200).json_body(success(json!({})));
            });

            let outcome = engine_for(
                &server,
                RunOptions {
                    dry_run,
                    want_diff: true,
                },
            )
            .reconcile_routing(&desired, Some(&scope), true)
            .await
            .unwrap();

            let mutations = delete.hits() + create.hits();
            (outcome, mutations)
        }
    };

    let (dry_outcome, dry_mutations) = run(true).await;
    let (wet_outcome, wet_mutations) = run(false).await;

    assert_eq!(dry_mutations, 0);
    assert_eq!(wet_mutations, 2);
    assert_eq!(dry_outcome, wet_outcome);
    assert!(dry_outcome.changed);
    let diff = dry_outcome.diff.unwrap();
    assert_eq!(diff.before.len(), 1);
    assert_eq!(diff.after.len(), 1);
    assert_eq!(diff.after[0].match_user, "newuser");
}

#[tokio::test]
async fn full_run_from_a_state_file() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v0/listDomains");
        then.status(200).json_body(success(json!({"domains": []})));
    });
    server.mock(|when, then| {
        when.method(POST).path("/v0/listRoutingRules");
        then.status(200).json_body(success(json!({"rules": []})));
    });
    server.mock(|when, then| {
        when.method(POST).path("/v0/listUser");
        then.status(200)
            .json_body(success(json!({"users": ["old@example.com"]})));
    });
    let add_domain = server.mock(|when, then| {
        when.method(POST)
            .path("/v0/addDomain")
            .json_body(json!({"domainName": "example.com"}));
        then.status(200).json_body(success(json!({})));
    });
    let create_rule = server.mock(|when, then| {
        when.method(POST).path("/v0/createRoutingRule").json_body(json!({
            "domainName": "example.com",
            "matchUser": "",
            "prefix": true,
            "catchall": false,
            "targetAddresses": ["admin@example.com"],
        }));
        then.status(200).json_body(success(json!({})));
    });
    let create_user = server.mock(|when, then| {
        when.method(POST).path("/v0/createUser").json_body(json!({
            "userName": "admin",
            "domainName": "example.com",
            "password": "dQw4w9WgXcQ",
            "enablePasswordReset": false,
            "recoveryEmail": "",
            "recoveryEmailDescription": "",
            "recoveryPhone": "",
            "recoveryPhoneDescription": "",
            "enableSearchIndexing": false,
            "sendWelcomeEmail": false,
        }));
        then.status(200).json_body(success(json!({})));
    });
    let delete_user = server.mock(|when, then| {
        when.method(POST)
            .path("/v0/deleteUser")
            .json_body(json!({"userName": "old@example.com"}));
        then.status(200).json_body(success(json!({})));
    });

    let state_file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(
        state_file.path(),
        r#"
        [domains]
        [[domains.entries]]
        name = "example.com"

        [routing]
        [[routing.rules]]
        domain_name = "example.com"
        preset = "any_address"
        target_addresses = ["admin@example.com"]

        [users]
        [[users.entries]]
        email = "admin@example.com"
        password = "dQw4w9WgXcQ"
        "#,
    )
    .unwrap();

    let desired = state::load_state(state_file.path()).unwrap();
    let report = engine_for(&server, RunOptions::default())
        .run(&desired)
        .await
        .unwrap();

    add_domain.assert();
    create_rule.assert();
    create_user.assert();
    delete_user.assert();
    assert!(report.changed());
    assert_eq!(report.domains.unwrap().resources[0].name, "example.com");
    assert_eq!(
        report.users.unwrap().resources,
        vec!["admin@example.com".to_string()]
    );
}

#[tokio::test]
async fn second_run_against_converged_state_changes_nothing() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v0/listRoutingRules");
        then.status(200)
            .json_body(success(json!({"rules": [toto_rule()]})));
    });
    let delete = server.mock(|when, then| {
        when.method(POST).path("/v0/deleteRoutingRule");
        then.status(200).json_body(success(json!({})));
    });
    let create = server.mock(|when, then| {
        when.method(POST).path("/v0/createRoutingRule");
        then.status(200).json_body(success(json!({})));
    });

    // Declares exactly what exists remotely (modulo the remote-assigned id).
    let desired = DesiredResources {
        routing: Some(RoutingDecl {
            rules: vec![RuleSpec {
                domain_name: "example.com".to_string(),
                target_addresses: vec!["admin@example.com".to_string()],
                match_user: Some("toto".to_string()),
                prefix: Some(true),
                catchall: Some(false),
                ..Default::default()
            }],
            ..Default::default()
        }),
        ..Default::default()
    };

    let report = engine_for(&server, RunOptions::default())
        .run(&desired)
        .await
        .unwrap();

    assert!(!report.changed());
    delete.assert_hits(0);
    create.assert_hits(0);
    let rules = report.routing_rules.unwrap().resources;
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].id, Some(1));
}

#[tokio::test]
async fn remote_error_envelope_aborts_the_run() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v0/listUser");
        then.status(200).json_body(success(json!({"users": []})));
    });
    server.mock(|when, then| {
        when.method(POST).path("/v0/createUser");
        then.status(200).json_body(json!({
            "type": "error",
            "code": "quota-exceeded",
            "message": "Account user limit reached"
        }));
    });

    let desired = vec![UserSpec {
        email: "toto@example.com".to_string(),
        password: Some("dQw4w9WgXcQ".to_string()),
        ..Default::default()
    }];
    let err = engine_for(&server, RunOptions::default())
        .reconcile_users(&desired, true)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SyncError::ApiError { code, .. } if code == "quota-exceeded"
    ));
}
