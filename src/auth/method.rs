//! Authentication scheme selector.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported ways of obtaining a session token. Exactly one is active per session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationMethod {
    /// Statically configured token
    #[default]
    Token,
    /// Role id (+ optional secret id)
    #[serde(alias = "app_role")]
    Approle,
    /// App id + derived user id
    #[serde(alias = "app_id")]
    Appid,
    /// TLS client certificate
    Cert,
    /// Signed EC2 instance identity document
    AwsEc2,
    /// Kubernetes service account JWT
    Kubernetes,
    /// Single-use response-wrapped token
    #[serde(alias = "wrapped_token")]
    Cubbyhole,
}

impl AuthenticationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Approle => "approle",
            Self::Appid => "appid",
            Self::Cert => "cert",
            Self::AwsEc2 => "aws_ec2",
            Self::Kubernetes => "kubernetes",
            Self::Cubbyhole => "cubbyhole",
        }
    }
}

impl FromStr for AuthenticationMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "token" => Ok(Self::Token),
            "approle" | "app_role" => Ok(Self::Approle),
            "appid" | "app_id" => Ok(Self::Appid),
            "cert" => Ok(Self::Cert),
            "aws_ec2" => Ok(Self::AwsEc2),
            "kubernetes" => Ok(Self::Kubernetes),
            "cubbyhole" | "wrapped_token" => Ok(Self::Cubbyhole),
            _ => Err(format!("Unknown authentication method: {}", s)),
        }
    }
}

impl fmt::Display for AuthenticationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
