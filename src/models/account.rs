//! Credentials for one object-storage account.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_REGION: &str = "us-east-1";

/// Endpoint and static key pair of one account.
///
/// The core treats the credential as opaque; only the gateway connector reads it.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccountCredential {
    /// Service endpoint, e.g. `https://obs.example.com`.
    pub endpoint: String,

    #[serde(alias = "ak")]
    pub access_key: String,

    #[serde(alias = "sk")]
    pub secret_key: String,

    /// Signing region. S3-compatible services usually accept any value.
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl AccountCredential {
    pub fn new(
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: default_region(),
        }
    }

    /// Identifier used in log lines. Never includes the secret.
    pub fn label(&self) -> String {
        format!("{}/{}", self.endpoint, self.access_key)
    }
}

impl fmt::Debug for AccountCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredential")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}
