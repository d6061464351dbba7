//! User Resources
//!
//! User directory, registration and login.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{request_error, ApiClient};
use crate::domain::{ClientError, ClientResult, SessionUser, User};
use crate::normalize;
use crate::transport::ApiRequest;

const INVALID_CREDENTIALS: &str = "Incorrect email or password";

/// Sign-up form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub user_name: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn validate(&self) -> ClientResult<()> {
        if self.user_name.trim().is_empty() || self.email.trim().is_empty() {
            return Err(ClientError::Invalid("Name and email are required".into()));
        }
        if self.password.is_empty() {
            return Err(ClientError::Invalid("Password is required".into()));
        }
        Ok(())
    }
}

/// Result of a login attempt that reached the server.
///
/// Rejected credentials are an expected answer, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Authenticated(SessionUser),
    InvalidCredentials { status: u16, message: String },
}

impl ApiClient {
    pub async fn list_all_users(&self) -> ClientResult<Vec<User>> {
        let rows = self.fetch_list(ApiRequest::get("/users/all"), &[]).await?;
        Ok(rows.iter().filter_map(normalize::user).collect())
    }

    /// Creates an account. The server may or may not echo the user back.
    pub async fn register_user(&self, registration: &Registration) -> ClientResult<Option<User>> {
        registration.validate()?;
        let body = json!({
            "userName": registration.user_name.trim(),
            "email": registration.email.trim(),
            "password": registration.password,
            "userStatus": 1,
        });
        let echoed = self.fetch_json(ApiRequest::post("/users", body)).await?;
        Ok(normalize::user(&echoed))
    }

    /// 401/403/404 come back as `InvalidCredentials`; other failures are errors.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<LoginOutcome> {
        let request = ApiRequest::post(
            "/users/login",
            json!({ "email": email.trim(), "password": password }),
        );
        let response = self.send(request).await?;

        if matches!(response.status, 401 | 403 | 404) {
            let message = response
                .json()
                .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| INVALID_CREDENTIALS.to_string());
            return Ok(LoginOutcome::InvalidCredentials {
                status: response.status,
                message,
            });
        }
        if !response.is_success() {
            return Err(request_error(&response));
        }

        // `{user: {...}}`, a bare user object, or nothing useful at all.
        let fallback = json!({ "email": email.trim() });
        let mut user = match response.json() {
            Some(body) => match body.get("user").filter(|u| u.is_object()) {
                Some(inner) => normalize::session_user(inner),
                None if body.is_object() => normalize::session_user(&body),
                None => normalize::session_user(&fallback),
            },
            None => normalize::session_user(&fallback),
        };
        if user.email.is_empty() {
            user.email = email.trim().to_string();
        }
        Ok(LoginOutcome::Authenticated(user))
    }
}
