use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{DbCreated, DocumentStore, SecurityPolicy, StoreError, StoreResult};

/// Name of the cookie CouchDB issues for credential sessions.
pub const AUTH_SESSION_COOKIE: &str = "AuthSession";

/// [`DocumentStore`] over the CouchDB HTTP API.
///
/// Holds one pooled `reqwest::Client`; clones share the pool, so a single
/// instance serves every in-flight request.
#[derive(Debug, Clone)]
pub struct CouchStore {
    client: reqwest::Client,
    base_url: String,
    admin: Option<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct CouchErrorBody {
    error: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    rev: String,
}

#[derive(Debug, Deserialize)]
struct AllDocs {
    rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
struct AllDocsRow {
    id: String,
    #[serde(default)]
    doc: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SessionInfo {
    #[serde(rename = "userCtx")]
    user_ctx: UserCtx,
}

#[derive(Debug, Deserialize)]
struct UserCtx {
    name: Option<String>,
}

impl CouchStore {
    pub fn new(
        base_url: &str,
        admin_user: Option<String>,
        admin_password: Option<String>,
        timeout: Duration,
    ) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        let admin = admin_user.map(|user| (user, admin_password.unwrap_or_default()));

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            admin,
        })
    }

    fn db_url(&self, db: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(db))
    }

    fn doc_url(&self, db: &str, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            urlencoding::encode(db),
            urlencoding::encode(id)
        )
    }

    fn session_url(&self) -> String {
        format!("{}/_session", self.base_url)
    }

    /// Request authenticated as the configured server admin.
    fn admin_request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header("Accept", "application/json");
        match &self.admin {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }

    /// Request carrying a user's native session cookie instead of admin credentials.
    fn cookie_request(&self, method: Method, token: &str) -> RequestBuilder {
        self.client
            .request(method, self.session_url())
            .header("Accept", "application/json")
            .header(COOKIE, format!("{AUTH_SESSION_COOKIE}={token}"))
    }
}

/// Map a non-success response onto [`StoreError`].
async fn error_from_response(response: Response) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<CouchErrorBody>(&body) {
        Ok(err) => match err.reason {
            Some(reason) => format!("{}: {}", err.error, reason),
            None => err.error,
        },
        Err(_) => body.chars().take(200).collect(),
    };

    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound,
        StatusCode::CONFLICT => StoreError::Conflict,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized { message },
        _ => StoreError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

/// Extract the `AuthSession` value from the `Set-Cookie` headers.
fn auth_session_token(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie| {
            let pair = cookie.split(';').next()?.trim();
            let (name, value) = pair.split_once('=')?;
            (name == AUTH_SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
        })
}

#[async_trait]
impl DocumentStore for CouchStore {
    async fn get_doc(&self, db: &str, id: &str) -> StoreResult<Option<Value>> {
        let response = self
            .admin_request(Method::GET, &self.doc_url(db, id))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(Some(response.json::<Value>().await?)),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(error_from_response(response).await),
        }
    }

    async fn put_doc(&self, db: &str, id: &str, doc: &Value) -> StoreResult<String> {
        let response = self
            .admin_request(Method::PUT, &self.doc_url(db, id))
            .json(doc)
            .send()
            .await?;

        if response.status().is_success() {
            let put: PutResponse = response.json().await?;
            Ok(put.rev)
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn delete_doc(&self, db: &str, id: &str, rev: &str) -> StoreResult<()> {
        let response = self
            .admin_request(Method::DELETE, &self.doc_url(db, id))
            .query(&[("rev", rev)])
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn list_docs(&self, db: &str) -> StoreResult<Vec<Value>> {
        let url = format!("{}/_all_docs", self.db_url(db));
        let response = self
            .admin_request(Method::GET, &url)
            .query(&[("include_docs", "true")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let all: AllDocs = response.json().await?;
        Ok(all
            .rows
            .into_iter()
            .filter(|row| !row.id.starts_with("_design/"))
            .filter_map(|row| row.doc)
            .collect())
    }

    async fn create_database(&self, db: &str) -> StoreResult<DbCreated> {
        let response = self
            .admin_request(Method::PUT, &self.db_url(db))
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED | StatusCode::ACCEPTED => Ok(DbCreated::Created),
            StatusCode::PRECONDITION_FAILED => Ok(DbCreated::AlreadyExists),
            _ => Err(error_from_response(response).await),
        }
    }

    async fn delete_database(&self, db: &str) -> StoreResult<bool> {
        let response = self
            .admin_request(Method::DELETE, &self.db_url(db))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::ACCEPTED => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(error_from_response(response).await),
        }
    }

    async fn list_databases(&self) -> StoreResult<Vec<String>> {
        let url = format!("{}/_all_dbs", self.base_url);
        let response = self.admin_request(Method::GET, &url).send().await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn set_security(&self, db: &str, policy: &SecurityPolicy) -> StoreResult<()> {
        let url = format!("{}/_security", self.db_url(db));
        let response = self
            .admin_request(Method::PUT, &url)
            .json(&policy.to_json())
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn create_session(&self, name: &str, password: &str) -> StoreResult<String> {
        let response = self
            .client
            .post(self.session_url())
            .header("Accept", "application/json")
            .json(&json!({ "name": name, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        auth_session_token(&response).ok_or_else(|| StoreError::InvalidResponse {
            message: "session response carried no AuthSession cookie".to_string(),
        })
    }

    async fn session_user(&self, token: &str) -> StoreResult<Option<String>> {
        let response = self.cookie_request(Method::GET, token).send().await?;

        match response.status() {
            StatusCode::OK => {
                let info: SessionInfo = response.json().await?;
                Ok(info.user_ctx.name.filter(|name| !name.is_empty()))
            }
            StatusCode::UNAUTHORIZED => Ok(None),
            _ => Err(error_from_response(response).await),
        }
    }

    async fn delete_session(&self, token: &str) -> StoreResult<()> {
        let response = self.cookie_request(Method::DELETE, token).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }
}
