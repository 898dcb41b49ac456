use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use platform_api::ApiError;
use platform_authn::{SESSION_COOKIE, SessionKeys, SessionUser};
use time::Duration as TimeDuration;

use crate::config::AppConfig;

/// Session resolved by the guard middleware, if any.
#[derive(Debug, Clone)]
pub struct Session(pub Option<SessionUser>);

impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<SessionUser>().cloned()))
    }
}

/// Signed-in user; rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionUser>()
            .cloned()
            .map(Self)
            .ok_or(ApiError::Unauthorized)
    }
}

/// Reads and verifies the session cookie. Invalid or expired tokens are
/// treated as no session.
pub fn session_from_jar(keys: &SessionKeys, jar: &CookieJar) -> Option<SessionUser> {
    let cookie = jar.get(SESSION_COOKIE)?;
    match keys.verify(cookie.value()) {
        Ok(user) => Some(user),
        Err(err) => {
            tracing::debug!(%err, "ignoring session cookie");
            None
        }
    }
}

pub fn session_cookie(config: &AppConfig, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::seconds(config.session_ttl.num_seconds()))
        .build()
}

pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build())
}
