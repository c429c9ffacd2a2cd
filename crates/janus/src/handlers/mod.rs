pub mod app;
pub mod session;

pub use app::{create_app, delete_app};
pub use session::logout;

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder, ResponseError};
use janus_core::models::{LoginPayload, LoginResponse};

use crate::app_state::{AppState, CookieSettings};
use crate::error::GatewayError;
use crate::store::couch::AUTH_SESSION_COOKIE;
use crate::verifier::VerificationFailure;

/// POST /login/
/// Verifies the assertion against the request's Origin, provisions the
/// tenant database and sets the session cookie
pub async fn login(
    app_state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Json<LoginPayload>,
) -> impl Responder {
    let Some(audience) = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
    else {
        log::warn!("Login attempt without Origin header");
        return GatewayError::VerifyingAssertion(VerificationFailure).error_response();
    };

    log::info!("Login attempt for app key {} from {audience}", payload.appkey);

    match app_state
        .login_pipeline()
        .run(&payload.assert, &audience, &payload.appkey)
        .await
    {
        Ok(outcome) => HttpResponse::Ok()
            .cookie(session_cookie(&app_state.cookie, outcome.token))
            .json(LoginResponse {
                ok: true,
                db: outcome.db,
                name: outcome.name,
            }),
        Err(e) => {
            log::warn!("Login failed ({}): {e}", e.kind());
            e.error_response()
        }
    }
}

/// Helper: Build the session cookie carrying the native token
pub fn session_cookie(settings: &CookieSettings, token: String) -> Cookie<'static> {
    let mut cookie = Cookie::build(AUTH_SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(settings.secure)
        .same_site(if settings.secure {
            SameSite::None
        } else {
            SameSite::Lax
        })
        .finish();

    if let Some(domain) = &settings.domain {
        cookie.set_domain(domain.clone());
    }
    cookie
}

/// Helper: Cookie that makes the client drop its session cookie
pub fn removal_cookie(settings: &CookieSettings) -> Cookie<'static> {
    let mut cookie = session_cookie(settings, String::new());
    cookie.set_max_age(Duration::ZERO);
    cookie
}

/// Helper: Extract the native session token from the request cookie
pub fn session_token(req: &HttpRequest) -> Option<String> {
    req.cookie(AUTH_SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Helper: Resolve the identity behind the request's gateway session
pub async fn authenticated_user(
    app_state: &AppState,
    req: &HttpRequest,
) -> Result<String, GatewayError> {
    let token = session_token(req).ok_or(GatewayError::PrivilegesRequired)?;
    Ok(app_state.sessions().validate(&token).await?)
}

/// JSON extractor config rendering undecodable bodies in the error shape
/// every other failure uses
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("Rejected request body: {err}");
        GatewayError::InvalidRequest(err.to_string()).into()
    })
}
