//! Shopping Cart Helpers
//!
//! Session cookie and bearer token handling shared by the HTTP handlers.

use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

/// Cookie carrying the browsing session id
pub const SESSION_COOKIE: &str = "cart_session";

/// The browsing session a request belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub id: String,

    /// No cookie was sent; the response must set one
    pub is_new: bool,
}

impl SessionContext {
    /// Reads the session cookie or starts a new session.
    pub fn resolve(headers: &HeaderMap) -> Self {
        match session_id_from_cookies(headers) {
            Some(id) => Self { id, is_new: false },
            None => Self {
                id: new_session_id(),
                is_new: true,
            },
        }
    }

    /// Adds `Set-Cookie` to `response` for new sessions
    pub fn attach(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();

        if self.is_new {
            let cookie = format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", self.id);
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
        }

        response
    }
}

/// Creates a fresh session identifier
pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn session_id_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_owned())
}

/// Extracts the access token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}
