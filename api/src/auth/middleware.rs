use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::info;

use crate::auth::claims::AuthUser;

/// Logs method, path and caller id for each request. CORS preflight
/// `OPTIONS` requests are skipped.
pub async fn log_request(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let (mut parts, body) = req.into_parts();

    if parts.method == Method::OPTIONS {
        let req = Request::from_parts(parts, body);
        return Ok(next.run(req).await);
    }

    let user_id = AuthUser::from_request_parts(&mut parts, &())
        .await
        .ok()
        .map(|AuthUser(c)| c.sub)
        .unwrap_or(0);

    info!(
        method = %parts.method,
        path = %parts.uri.path(),
        user = user_id,
        "incoming request"
    );

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}
