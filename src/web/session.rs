use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::warn;

use crate::auth::context::AuthContext;
use crate::auth::gate::{authenticate, is_public};
use crate::state::AppState;

/// Session cookie holding the same signed credential the API carries in its
/// Authorization header.
pub const AUTH_COOKIE: &str = "AUTH_TOKEN";

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

pub fn session_cookie(token: &str) -> String {
    format!("{AUTH_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn clear_session_cookie() -> String {
    format!("{AUTH_COOKIE}=; Path=/; HttpOnly; Max-Age=0")
}

/// Cookie adapter of the authentication gate: same classify/verify/resolve
/// pipeline as the API middleware, but every rejection becomes a redirect to
/// the login page instead of a JSON envelope.
pub async fn web_gate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if is_public(req.uri().path()) {
        return next.run(req).await;
    }

    let Some(token) = cookie_value(req.headers(), AUTH_COOKIE)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
    else {
        return Redirect::to("/auth/login").into_response();
    };

    match authenticate(
        &state.codec,
        state.tokens.as_ref(),
        state.users.as_ref(),
        &token,
    )
    .await
    {
        Ok(user) => {
            let mut ctx = AuthContext::default();
            ctx.set_user(user);
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(failure) => {
            warn!(path = %req.uri().path(), failure = %failure, "session rejected");
            Redirect::to("/auth/login").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_value_picks_the_named_pair() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "other=1; AUTH_TOKEN=abc.def.ghi; last=2".parse().unwrap(),
        );
        assert_eq!(cookie_value(&headers, AUTH_COOKIE), Some("abc.def.ghi"));
        assert_eq!(cookie_value(&headers, "other"), Some("1"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn no_cookie_header_reads_as_none() {
        assert_eq!(cookie_value(&HeaderMap::new(), AUTH_COOKIE), None);
    }

    #[test]
    fn session_cookie_is_http_only_and_clearable() {
        let set = session_cookie("tok");
        assert!(set.starts_with("AUTH_TOKEN=tok"));
        assert!(set.contains("HttpOnly"));
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }
}
