use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use janus_core::models::ErrorResponse;
use janus_core::ErrorKind;

use crate::sessions::SessionError;
use crate::store::StoreError;
use crate::verifier::VerificationFailure;

/// Failure of a gateway operation, one variant per client-visible kind.
///
/// The `Display` text is for logs only; clients see nothing but the kind.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("assertion could not be verified")]
    VerifyingAssertion(#[from] VerificationFailure),

    #[error("failed to read user record: {0}")]
    RetrievingUser(#[source] StoreError),

    #[error("failed to write user record: {0}")]
    CreatingUser(#[source] StoreError),

    #[error("app could not be resolved: {0}")]
    VerifyingApp(String),

    #[error("failed to create database: {0}")]
    CreatingDatabase(#[source] StoreError),

    #[error("failed to secure database: {0}")]
    SecuringDatabase(#[source] StoreError),

    #[error("failed to open native session: {0}")]
    CreatingSession(String),

    #[error("failed to record gateway session: {0}")]
    CreatingJanusSession(#[source] StoreError),

    #[error("session is not valid: {0}")]
    SessionExpired(#[from] SessionError),

    #[error("no session credential presented")]
    PrivilegesRequired,

    #[error("failed to create app: {0}")]
    CreatingApp(String),

    #[error("failed to delete app: {0}")]
    DeletingApp(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::VerifyingAssertion(_) => ErrorKind::VerifyingAssertion,
            GatewayError::RetrievingUser(_) => ErrorKind::RetrievingUser,
            GatewayError::CreatingUser(_) => ErrorKind::CreatingUser,
            GatewayError::VerifyingApp(_) => ErrorKind::VerifyingApp,
            GatewayError::CreatingDatabase(_) => ErrorKind::CreatingDatabase,
            GatewayError::SecuringDatabase(_) => ErrorKind::SecuringDatabase,
            GatewayError::CreatingSession(_) => ErrorKind::CreatingSession,
            GatewayError::CreatingJanusSession(_) => ErrorKind::CreatingJanusSession,
            GatewayError::SessionExpired(_) => ErrorKind::SessionExpired,
            GatewayError::PrivilegesRequired => ErrorKind::PrivilegesRequired,
            GatewayError::CreatingApp(_) => ErrorKind::CreatingApp,
            GatewayError::DeletingApp(_) => ErrorKind::DeletingApp,
            GatewayError::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse { error: self.kind() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn response_carries_only_the_kind() {
        let err = GatewayError::SecuringDatabase(StoreError::Status {
            status: 500,
            message: "internal detail".to_string(),
        });

        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"error_securing_database"}"#);
    }

    #[test]
    fn session_failures_are_unauthorized() {
        assert_eq!(
            GatewayError::SessionExpired(SessionError::Expired).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::PrivilegesRequired.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::DeletingApp("nope".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
