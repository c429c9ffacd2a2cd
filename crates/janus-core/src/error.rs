use serde::{Deserialize, Serialize};

/// Stable error kinds surfaced to clients as `{"error": <kind>}`.
///
/// The wire strings are part of the public contract; clients branch on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    #[serde(rename = "error_verifying_assertion")]
    VerifyingAssertion,
    #[serde(rename = "error_retrieving_user")]
    RetrievingUser,
    #[serde(rename = "error_creating_user")]
    CreatingUser,
    #[serde(rename = "error_verifying_app")]
    VerifyingApp,
    #[serde(rename = "error_creating_database")]
    CreatingDatabase,
    #[serde(rename = "error_securing_database")]
    SecuringDatabase,
    #[serde(rename = "error_creating_session")]
    CreatingSession,
    #[serde(rename = "error_creating_janus_session")]
    CreatingJanusSession,
    SessionExpired,
    PrivilegesRequired,
    #[serde(rename = "error_creating_app")]
    CreatingApp,
    #[serde(rename = "error_deleting_app")]
    DeletingApp,
    /// Request body could not be decoded.
    InvalidRequest,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 13] = [
        ErrorKind::VerifyingAssertion,
        ErrorKind::RetrievingUser,
        ErrorKind::CreatingUser,
        ErrorKind::VerifyingApp,
        ErrorKind::CreatingDatabase,
        ErrorKind::SecuringDatabase,
        ErrorKind::CreatingSession,
        ErrorKind::CreatingJanusSession,
        ErrorKind::SessionExpired,
        ErrorKind::PrivilegesRequired,
        ErrorKind::CreatingApp,
        ErrorKind::DeletingApp,
        ErrorKind::InvalidRequest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::VerifyingAssertion => "error_verifying_assertion",
            ErrorKind::RetrievingUser => "error_retrieving_user",
            ErrorKind::CreatingUser => "error_creating_user",
            ErrorKind::VerifyingApp => "error_verifying_app",
            ErrorKind::CreatingDatabase => "error_creating_database",
            ErrorKind::SecuringDatabase => "error_securing_database",
            ErrorKind::CreatingSession => "error_creating_session",
            ErrorKind::CreatingJanusSession => "error_creating_janus_session",
            ErrorKind::SessionExpired => "session_expired",
            ErrorKind::PrivilegesRequired => "privileges_required",
            ErrorKind::CreatingApp => "error_creating_app",
            ErrorKind::DeletingApp => "error_deleting_app",
            ErrorKind::InvalidRequest => "invalid_request",
        }
    }

    /// HTTP status paired with the kind. Session problems are 401, the rest 400.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::SessionExpired | ErrorKind::PrivilegesRequired => 401,
            _ => 400,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
