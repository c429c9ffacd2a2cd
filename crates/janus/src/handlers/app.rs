use actix_web::{web, HttpRequest, HttpResponse, Responder, ResponseError};
use janus_core::models::{AppPayload, OkResponse};

use crate::app_state::AppState;
use crate::error::GatewayError;
use crate::handlers::authenticated_user;

/// PUT /app/{key}/
/// Registers an app owned by the session's identity
pub async fn create_app(
    app_state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    payload: Option<web::Json<AppPayload>>,
) -> impl Responder {
    let app_key = path.into_inner();

    let owner = match authenticated_user(&app_state, &req).await {
        Ok(owner) => owner,
        Err(e) => {
            log::warn!("Unauthenticated app creation for {app_key}: {e}");
            return e.error_response();
        }
    };

    // The body only matters once the caller is authenticated.
    let Some(payload) = payload else {
        return GatewayError::InvalidRequest("missing app name".to_string()).error_response();
    };

    match app_state.apps().create(&app_key, &owner, &payload.name).await {
        Ok(_) => HttpResponse::Created().json(OkResponse::ok()),
        Err(e) => {
            log::error!("App creation failed for {owner}: {e}");
            e.error_response()
        }
    }
}

/// DELETE /app/{key}/
/// Deletes an app owned by the session's identity
pub async fn delete_app(
    app_state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    let app_key = path.into_inner();

    let owner = match authenticated_user(&app_state, &req).await {
        Ok(owner) => owner,
        Err(e) => {
            log::warn!("Unauthenticated app deletion for {app_key}: {e}");
            return e.error_response();
        }
    };

    match app_state.apps().delete(&app_key, &owner).await {
        Ok(()) => HttpResponse::Ok().json(OkResponse::ok()),
        Err(e) => {
            log::warn!("App deletion failed for {owner}: {e}");
            e.error_response()
        }
    }
}
