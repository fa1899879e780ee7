//! Handshake payload shapes.

use serde::{Deserialize, Serialize};

fn default_language() -> String {
    "unknown".to_string()
}

/// The `CONNECTION_ACCEPTED` JSON payload `{"version": str, "lang": str}`.
/// A missing `lang` defaults to `"unknown"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    #[serde(default = "default_language")]
    pub lang: String,
}
