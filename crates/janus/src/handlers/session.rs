use actix_web::{web, HttpRequest, HttpResponse, Responder};
use janus_core::models::OkResponse;

use crate::app_state::AppState;
use crate::handlers::{removal_cookie, session_token};

/// POST /logout/
/// Revokes the gateway and native sessions. Always succeeds for the client.
pub async fn logout(app_state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Some(token) = session_token(&req) {
        match app_state.sessions().revoke(&token).await {
            Ok(()) => log::info!("Session revoked"),
            Err(e) => log::error!("Failed to revoke session: {e}"),
        }
    } else {
        log::debug!("Logout without session cookie");
    }

    HttpResponse::Ok()
        .cookie(removal_cookie(&app_state.cookie))
        .json(OkResponse::ok())
}
