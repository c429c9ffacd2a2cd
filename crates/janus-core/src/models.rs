use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Request payload for POST /login/
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginPayload {
    /// Identity assertion produced by the client-side provider.
    #[serde(default)]
    pub assert: String,
    #[serde(default)]
    pub appkey: String,
}

/// Response for a successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub ok: bool,
    /// Tenant database the client should talk to.
    pub db: String,
    pub name: String,
}

/// Request payload for PUT /app/{key}/
#[derive(Debug, Serialize, Deserialize)]
pub struct AppPayload {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// Error response. Carries only the stable kind, never internal detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorKind,
}
