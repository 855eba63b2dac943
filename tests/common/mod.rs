//! Shared helpers for integration tests.
//!
//! A wiremock server stands in for the secret store's HTTP API.

#![allow(dead_code)]

use serde_json::{json, Value};
use vault_config::client::{ClientOptions, VaultClient};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Body of a successful login.
pub fn auth_body(token: &str, renewable: Option<bool>, lease_duration: Option<u64>) -> Value {
    let mut auth = json!({ "client_token": token, "accessor": "accessor-1", "policies": ["default"] });
    if let Some(renewable) = renewable {
        auth["renewable"] = json!(renewable);
    }
    if let Some(lease) = lease_duration {
        auth["lease_duration"] = json!(lease);
    }
    json!({ "auth": auth })
}

/// Body of a secret read.
pub fn secret_body(data: Value) -> Value {
    json!({ "data": data, "lease_duration": 0, "renewable": false })
}

pub fn error_body(message: &str) -> Value {
    json!({ "errors": [message] })
}

pub fn client(server: &MockServer) -> VaultClient {
    VaultClient::new(ClientOptions { address: server.uri(), ..Default::default() })
        .expect("mock server address is valid")
}

/// Mount a login endpoint that answers with `token`.
pub async fn mount_login(server: &MockServer, login_path: &str, token: &str, lease: Option<u64>) {
    Mock::given(method("POST"))
        .and(path(format!("/v1/{}", login_path)))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body(token, Some(true), lease)))
        .mount(server)
        .await;
}

/// Mount a secret readable with `token`.
pub async fn mount_secret(server: &MockServer, secret_path: &str, token: &str, data: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/{}", secret_path)))
        .and(header("X-Vault-Token", token))
        .respond_with(ResponseTemplate::new(200).set_body_json(secret_body(data)))
        .mount(server)
        .await;
}
