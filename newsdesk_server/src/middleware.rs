use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use log::{info, warn};
use newsdesk::models::Profile;
use newsdesk::{auth, settings, Error};

use crate::{ApiError, AppState};

/// The administrator a request to the dashboard API was made by.
#[derive(Clone, Debug)]
pub struct Admin(pub Profile);

/// The token of an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

pub(crate) async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(req).await;
    info!(
        "{method} {path} {} {:?}",
        response.status().as_u16(),
        started.elapsed()
    );
    response
}

/// Answer 503 while maintenance mode is on.
pub(crate) async fn maintenance(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let current = state.run(|conn| settings::load_settings(conn)).await?;
    if current.maintenance_mode {
        warn!("Refused {} during maintenance", req.uri().path());
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("{} is down for maintenance", current.site_name),
        ));
    }
    Ok(next.run(req).await)
}

/// Reject requests without an administrator's session token.
pub(crate) async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).ok_or(Error::Unauthenticated)?;
    let profile = state
        .run(move |conn| auth::require_admin(conn, &token))
        .await?;
    req.extensions_mut().insert(Admin(profile));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn bearer_tokens() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc".to_string()));
        assert_eq!(bearer_token(&headers("bearer  abc ")), Some("abc".to_string()));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
