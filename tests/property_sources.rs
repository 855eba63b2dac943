//! End-to-end composition against a mock secret store.

mod common;

use serde_json::json;
use vault_config::auth::{AuthenticationMethod, SecretString};
use vault_config::backends::SecretBackendDescriptor;
use vault_config::session::LifecycleOptions;
use vault_config::{Error, VaultBootstrap, VaultConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{error_body, mount_login, mount_secret};

const TOKEN: &str = "s.static";

fn config(server: &MockServer) -> VaultConfig {
    let mut config = VaultConfig {
        address: server.uri(),
        authentication: AuthenticationMethod::Token,
        token: Some(SecretString::new(TOKEN)),
        lifecycle: LifecycleOptions { enabled: false, ..Default::default() },
        ..Default::default()
    };
    config.generic.application_name = "orders".to_string();
    config
}

fn profiles() -> Vec<String> {
    vec!["dev".to_string()]
}

#[tokio::test]
async fn test_missing_paths_contribute_empty_sources() {
    let server = MockServer::start().await;
    mount_secret(&server, "secret/orders", TOKEN, json!({ "db": { "pool": 8 }, "tags": ["a", "b"] }))
        .await;

    let bootstrap = VaultBootstrap::new(config(&server)).unwrap();
    let view = bootstrap.load(&profiles()).await.unwrap();

    let names: Vec<&str> = view.sources().iter().map(|s| s.name()).collect();
    assert_eq!(
        names,
        vec!["secret/orders/dev", "secret/orders", "secret/application/dev", "secret/application"]
    );
    assert!(view.source("secret/orders/dev").unwrap().is_empty());
    assert_eq!(view.get("db.pool"), Some("8"));
    assert_eq!(view.get("tags[1]"), Some("b"));
    assert_eq!(view.origin("db.pool"), Some("secret/orders"));
}

#[tokio::test]
async fn test_more_specific_context_wins() {
    let server = MockServer::start().await;
    mount_secret(&server, "secret/orders/dev", TOKEN, json!({ "log.level": "debug" })).await;
    mount_secret(&server, "secret/orders", TOKEN, json!({ "log.level": "info", "port": 8080 })).await;
    mount_secret(&server, "secret/application", TOKEN, json!({ "port": 80, "region": "eu" })).await;

    let bootstrap = VaultBootstrap::new(config(&server)).unwrap();
    let view = bootstrap.load(&profiles()).await.unwrap();

    assert_eq!(view.get("log.level"), Some("debug"));
    assert_eq!(view.get("port"), Some("8080"));
    assert_eq!(view.get("region"), Some("eu"));
    assert_eq!(view.merged().len(), 3);
}

#[tokio::test]
async fn test_backend_credentials_are_renamed_and_ordered_after_generic() {
    let server = MockServer::start().await;
    mount_secret(&server, "secret/orders", TOKEN, json!({ "datasource.username": "generic" })).await;
    Mock::given(method("GET"))
        .and(path("/v1/database/creds/readonly"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "username": "v-orders-1", "password": "hunter2" },
            "lease_id": "database/creds/readonly/abc",
            "lease_duration": 3600,
            "renewable": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_secret(&server, "rabbitmq/creds/publisher", TOKEN, json!({ "username": "mq", "password": "pw" }))
        .await;

    let mut config = config(&server);
    config.backends = vec![
        SecretBackendDescriptor::new("rabbitmq").with_role("publisher").with_order(10),
        SecretBackendDescriptor::new("database").with_role("readonly"),
        SecretBackendDescriptor::new("ldap").with_role("people"),
    ];

    let bootstrap = VaultBootstrap::new(config).unwrap();
    let (_, resolution) = bootstrap.plan(&profiles()).unwrap();
    assert_eq!(resolution.unsupported, vec!["ldap".to_string()]);

    let view = bootstrap.load(&profiles()).await.unwrap();
    let names: Vec<&str> = view.sources().iter().map(|s| s.name()).skip(4).collect();
    assert_eq!(names, vec!["database/creds/readonly", "rabbitmq/creds/publisher"]);

    // The generic source precedes the backend, so it shadows the credential.
    assert_eq!(view.get("datasource.username"), Some("generic"));
    assert_eq!(view.get("datasource.password"), Some("hunter2"));
    assert_eq!(view.get("rabbitmq.username"), Some("mq"));

    let lease = view.source("database/creds/readonly").unwrap().lease().unwrap();
    assert_eq!(lease.lease_id, "database/creds/readonly/abc");
    assert!(lease.renewable);
}

#[tokio::test]
async fn test_fail_soft_replaces_failed_reads_with_empty_sources() {
    let server = MockServer::start().await;
    mount_secret(&server, "secret/application", TOKEN, json!({ "region": "eu" })).await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/orders"))
        .respond_with(ResponseTemplate::new(500).set_body_json(error_body("internal error")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/orders/dev"))
        .respond_with(ResponseTemplate::new(403).set_body_json(error_body("permission denied")))
        .mount(&server)
        .await;

    let bootstrap = VaultBootstrap::new(config(&server)).unwrap();
    let view = bootstrap.load(&profiles()).await.unwrap();

    assert_eq!(view.len(), 4);
    assert!(view.source("secret/orders").unwrap().is_empty());
    assert!(view.source("secret/orders/dev").unwrap().is_empty());
    assert_eq!(view.get("region"), Some("eu"));
}

#[tokio::test]
async fn test_fail_fast_surfaces_the_first_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/orders"))
        .respond_with(ResponseTemplate::new(500).set_body_json(error_body("internal error")))
        .mount(&server)
        .await;

    let mut config = config(&server);
    config.fail_fast = true;

    let bootstrap = VaultBootstrap::new(config).unwrap();
    let err = bootstrap.load(&profiles()).await.unwrap_err();
    assert!(matches!(err, Error::Backend { status: 500, .. }));
}

#[tokio::test]
async fn test_approle_session_logs_in_once_for_all_reads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/approle/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::auth_body("s.approle", Some(true), Some(3600))),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_secret(&server, "secret/orders", "s.approle", json!({ "feature.x": true })).await;

    let mut config = config(&server);
    config.authentication = AuthenticationMethod::Approle;
    config.token = None;
    config.app_role.role_id = Some("orders-role".to_string());

    let bootstrap = VaultBootstrap::new(config).unwrap();
    let view = bootstrap.load(&profiles()).await.unwrap();
    assert_eq!(view.get("feature.x"), Some("true"));

    bootstrap.load(&profiles()).await.unwrap();
}

/// Number of requests the server received for `request_path`.
async fn requests_to(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == request_path)
        .count()
}

#[tokio::test]
async fn test_rejected_login_is_attempted_once_per_load() {
    for fail_fast in [false, true] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/approle/login"))
            .respond_with(ResponseTemplate::new(400).set_body_json(error_body("invalid role ID")))
            .mount(&server)
            .await;

        let mut config = config(&server);
        config.authentication = AuthenticationMethod::Approle;
        config.app_role.role_id = Some("wrong".to_string());
        config.fail_fast = fail_fast;

        let bootstrap = VaultBootstrap::new(config).unwrap();
        let result = bootstrap.load(&profiles()).await;
        if fail_fast {
            assert!(result.unwrap_err().is_authentication());
        } else {
            let view = result.unwrap();
            assert_eq!(view.len(), 4);
            assert!(view.merged().is_empty());
        }

        assert_eq!(requests_to(&server, "/v1/auth/approle/login").await, 1, "fail_fast={}", fail_fast);
        assert_eq!(requests_to(&server, "/v1/secret/orders").await, 0);

        // The next load is a new cycle and logs in again.
        let _ = bootstrap.load(&profiles()).await;
        assert_eq!(requests_to(&server, "/v1/auth/approle/login").await, 2);
    }
}

#[tokio::test]
async fn test_lifecycle_session_revokes_on_shutdown() {
    let server = MockServer::start().await;
    mount_login(&server, "auth/approle/login", "s.leased", Some(3600)).await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/token/revoke-self"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config(&server);
    config.authentication = AuthenticationMethod::Approle;
    config.app_role.role_id = Some("orders-role".to_string());
    config.lifecycle = LifecycleOptions::default();

    let bootstrap = VaultBootstrap::new(config).unwrap();
    bootstrap.load(&profiles()).await.unwrap();
    bootstrap.shutdown().await;
}

#[tokio::test]
async fn test_health_parses_sealed_standby_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/health"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "initialized": true,
            "sealed": true,
            "standby": false,
            "version": "1.15.2"
        })))
        .mount(&server)
        .await;

    let bootstrap = VaultBootstrap::new(config(&server)).unwrap();
    let health = bootstrap.health().await.unwrap();
    assert!(health.initialized);
    assert!(health.sealed);
    assert_eq!(health.version.as_deref(), Some("1.15.2"));
}
