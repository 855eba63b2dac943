//! Login flows of each authentication scheme against a mock secret store.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use vault_config::auth::{
    AppIdAuthentication, AppRoleAuthentication, AppRoleProperties, AwsEc2Authentication,
    AwsEc2Properties, CertProperties, ClientAuthentication, ClientCertificateAuthentication,
    CubbyholeAuthentication, KubernetesAuthentication, KubernetesJwtSupplier, SecretString,
};
use vault_config::auth::app_id::StaticUserId;
use vault_config::Error;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{auth_body, client, error_body};

#[tokio::test]
async fn test_approle_login_posts_role_and_secret_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/approle/login"))
        .and(body_json(json!({ "role_id": "role-1", "secret_id": "secret-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("s.approle", Some(true), Some(3600))))
        .expect(1)
        .mount(&server)
        .await;

    let properties = AppRoleProperties {
        role_id: Some("role-1".into()),
        secret_id: Some(SecretString::new("secret-1")),
        ..Default::default()
    };
    let token = AppRoleAuthentication::new(&properties, client(&server)).unwrap().login().await.unwrap();

    assert_eq!(token.token(), "s.approle");
    assert!(token.is_renewable());
    assert_eq!(token.lease_duration(), Duration::from_secs(3600));
}

#[tokio::test]
async fn test_rejected_login_is_an_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/approle/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_body("invalid role ID")))
        .mount(&server)
        .await;

    let properties = AppRoleProperties { role_id: Some("wrong".into()), ..Default::default() };
    let err = AppRoleAuthentication::new(&properties, client(&server)).unwrap().login().await.unwrap_err();

    assert!(err.is_authentication());
    assert!(err.to_string().contains("invalid role ID"));
}

#[tokio::test]
async fn test_app_id_login_uses_mechanism_user_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/app-id/login"))
        .and(body_json(json!({ "app_id": "orders", "user_id": "static-user" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("s.appid", None, Some(600))))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AppIdAuthentication::with_mechanism(
        "orders",
        "app-id",
        Arc::new(StaticUserId("static-user".into())),
        client(&server),
    );
    let token = auth.login().await.unwrap();

    assert!(!token.is_renewable());
    assert_eq!(token.lease_duration(), Duration::from_secs(600));
}

#[tokio::test]
async fn test_cert_login_has_no_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/cert/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("s.cert", None, None)))
        .expect(1)
        .mount(&server)
        .await;

    let token = ClientCertificateAuthentication::new(&CertProperties::default(), client(&server))
        .login()
        .await
        .unwrap();
    assert!(!token.expires());
    assert!(token.is_login_token());
}

#[tokio::test]
async fn test_aws_ec2_login_sends_identity_document_and_nonce() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest/dynamic/instance-identity/pkcs7"))
        .respond_with(ResponseTemplate::new(200).set_body_string("MIAGCSqG\nSIb3DQEH\n"))
        .mount(&server)
        .await;

    let properties = AwsEc2Properties {
        role: Some("web".into()),
        identity_document: format!("{}/latest/dynamic/instance-identity/pkcs7", server.uri()),
        ..Default::default()
    };
    let auth = AwsEc2Authentication::new(&properties, client(&server)).unwrap();

    Mock::given(method("POST"))
        .and(path("/v1/auth/aws-ec2/login"))
        .and(body_json(json!({ "role": "web", "pkcs7": "MIAGCSqGSIb3DQEH", "nonce": auth.nonce() })))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("s.ec2", Some(true), Some(60))))
        .expect(2)
        .mount(&server)
        .await;

    auth.login().await.unwrap();
    // Re-authentication presents the same nonce.
    auth.login().await.unwrap();
}

#[tokio::test]
async fn test_kubernetes_login_posts_role_and_jwt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/kubernetes/login"))
        .and(body_json(json!({ "role": "orders", "jwt": "header.payload.sig" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("s.k8s", Some(true), Some(900))))
        .expect(1)
        .mount(&server)
        .await;

    let supplier: Arc<dyn KubernetesJwtSupplier> =
        Arc::new(|| -> vault_config::Result<String> { Ok("header.payload.sig".to_string()) });
    let auth = KubernetesAuthentication::with_supplier("orders", "kubernetes", supplier, client(&server));
    assert_eq!(auth.login().await.unwrap().token(), "s.k8s");
}

#[tokio::test]
async fn test_kubernetes_validation_happens_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("s.k8s", None, None)))
        .expect(0)
        .mount(&server)
        .await;

    let supplier: Arc<dyn KubernetesJwtSupplier> =
        Arc::new(|| -> vault_config::Result<String> { Ok(String::new()) });
    let auth = KubernetesAuthentication::with_supplier("orders", "kubernetes", supplier, client(&server));
    assert!(matches!(auth.login().await, Err(Error::Validation { .. })));
}

#[tokio::test]
async fn test_cubbyhole_unwraps_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sys/wrapping/unwrap"))
        .and(header("X-Vault-Token", "s.wrapping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("s.unwrapped", Some(true), Some(120))))
        .expect(1)
        .mount(&server)
        .await;

    let auth = CubbyholeAuthentication::new("s.wrapping", client(&server)).unwrap();
    let token = auth.login().await.unwrap();
    assert_eq!(token.token(), "s.unwrapped");
    assert!(auth.is_unwrapped());

    let second = auth.login().await;
    assert!(second.unwrap_err().is_authentication());
}

#[tokio::test]
async fn test_namespace_header_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/approle/login"))
        .and(header("X-Vault-Namespace", "team-a"))
        .and(body_string_contains("role-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("s.ns", None, None)))
        .expect(1)
        .mount(&server)
        .await;

    let client = vault_config::client::VaultClient::with_http_client(
        &server.uri(),
        Some("team-a".into()),
        reqwest::Client::new(),
    )
    .unwrap();
    let properties = AppRoleProperties { role_id: Some("role-1".into()), ..Default::default() };
    AppRoleAuthentication::new(&properties, client).unwrap().login().await.unwrap();
}
