//! Wire protocol: request/response shapes and error codes.
//!
//! Requests arrive as JSON bodies in length-prefixed frames. The `type`
//! field selects the handler; unknown inbound fields are ignored. Every
//! response is the `{ ok, data?, code?, message? }` envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed set of error codes exchanged with the extension.
///
/// `PHISHING_BLOCK` and `NO_CREDENTIALS` are produced by the extension side
/// of the protocol; the host defines them so the set stays in one place.
pub mod code {
    pub const BAD_JSON: &str = "BAD_JSON";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const UNSUPPORTED: &str = "UNSUPPORTED";
    pub const UNLOCK_FAILED: &str = "UNLOCK_FAILED";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const SESSION_EXPIRED: &str = "SESSION_EXPIRED";
    pub const NONCE_REPLAY: &str = "NONCE_REPLAY";
    pub const INVALID_STATE: &str = "INVALID_STATE";
    pub const DB_ERROR: &str = "DB_ERROR";
    pub const ENCRYPT_FAILED: &str = "ENCRYPT_FAILED";
    pub const ETLD_MISMATCH: &str = "ETLD_MISMATCH";
    pub const ETLD_INVALID: &str = "ETLD_INVALID";
    pub const URL_PARSE_ERROR: &str = "URL_PARSE_ERROR";
    #[allow(dead_code)] // emitted by the extension side of the protocol
    pub const PHISHING_BLOCK: &str = "PHISHING_BLOCK";
    #[allow(dead_code)] // emitted by the extension side of the protocol
    pub const NO_CREDENTIALS: &str = "NO_CREDENTIALS";
}

#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub request_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockRequest {
    #[serde(default)]
    pub dir: String,
    #[serde(default)]
    pub master_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    #[serde(default)]
    pub session_token: String,
    #[serde(default)]
    pub nonce: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCredentialsRequest {
    #[serde(flatten)]
    pub session: SessionRequest,
    #[serde(default)]
    pub domain_etld1: String,
    #[serde(default)]
    pub exact_host: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub require_exact_host: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveCredentialRequest {
    #[serde(flatten)]
    pub session: SessionRequest,
    #[serde(default)]
    pub domain_etld1: String,
    #[serde(default)]
    pub exact_host: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub require_exact_host: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhishingCheckRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub saved_etld1: String,
    #[serde(default)]
    pub exact_host: String,
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    pub fn success(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            code: None,
            message: None,
        }
    }

    pub fn success_empty() -> Self {
        Self {
            ok: true,
            data: None,
            code: None,
            message: None,
        }
    }

    pub fn failure(code: &str) -> Self {
        Self {
            ok: false,
            data: None,
            code: Some(code.to_string()),
            message: None,
        }
    }

    pub fn failure_with(code: &str, message: &str) -> Self {
        Self {
            ok: false,
            data: None,
            code: Some(code.to_string()),
            message: Some(message.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CredentialItem {
    pub username: String,
    pub password: String,
}
