//! Session cookie extraction
//!
//! Every request is bound to a session id carried in the `hw_session` cookie; requests without
//! a usable cookie get a fresh id, which the response must then set. The principal is read from
//! the session: anonymous unless something upstream stored a signed-in user under
//! `SESSION_USER_KEY`.

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::response::Response;
use helloworld_core::models::Principal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::constants::{SESSION_COOKIE, SESSION_USER_KEY};
use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct SessionUser {
    id: i64,
    username: String,
}

/// The caller's session and identity
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub principal: Principal,
    /// Whether the id was minted for this request and still has to be sent to the client
    pub is_new: bool,
}

impl SessionContext {
    pub fn session_id(&self) -> &str {
        &self.principal.session_id
    }

    /// Attach the session cookie to `response` when the session was just created.
    pub fn apply(&self, mut response: Response) -> Response {
        if self.is_new {
            let cookie = format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax",
                SESSION_COOKIE,
                self.session_id()
            );
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        response
    }
}

/// Session id from the `Cookie` header, if present and well formed.
pub fn session_id_from_cookies(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
        .map(|id| id.to_string())
}

impl FromRequestParts<Arc<AppState>> for SessionContext {
    type Rejection = HttpAppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (session_id, is_new) = match session_id_from_cookies(parts) {
            Some(id) => (id, false),
            None => (Uuid::new_v4().to_string(), true),
        };

        let principal = if is_new {
            Principal::anonymous(session_id)
        } else {
            match state.session.get(&session_id, SESSION_USER_KEY).await? {
                Some(value) => match serde_json::from_value::<SessionUser>(value) {
                    Ok(user) => Principal::user(user.id, user.username, session_id),
                    Err(e) => {
                        tracing::warn!(error = %e, "Ignoring malformed session user");
                        Principal::anonymous(session_id)
                    }
                },
                None => Principal::anonymous(session_id),
            }
        };

        Ok(Self { principal, is_new })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_cookie(cookie: &str) -> Parts {
        Request::builder()
            .header(COOKIE, cookie)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn test_reads_session_cookie_among_others() {
        let id = Uuid::new_v4().to_string();
        let parts = parts_with_cookie(&format!("theme=dark; hw_session={}; lang=en", id));
        assert_eq!(session_id_from_cookies(&parts), Some(id));
    }

    #[test]
    fn test_rejects_malformed_session_id() {
        let parts = parts_with_cookie("hw_session=../../etc");
        assert_eq!(session_id_from_cookies(&parts), None);
    }
}
