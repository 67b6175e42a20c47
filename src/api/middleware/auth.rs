//! Bearer authentication middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::errors::AppError;

/// Authenticated caller, inserted into request extensions.
pub use crate::services::Principal as CurrentUser;

/// Pull the token out of `Authorization: Bearer <token>`.
fn bearer_token(request: &Request) -> Result<&str, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = header
        .strip_prefix(BEARER_TOKEN_PREFIX)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)?;
    Ok(token)
}

/// Authenticate the bearer token against the stored session and inject the
/// caller with freshly loaded permissions. Per-route permission checks
/// happen in the handlers.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?.to_owned();

    let current_user: CurrentUser = state.services.auth().authenticate(&token).await?;
    tracing::debug!(user_id = %current_user.id, "Request authenticated");

    request.extensions_mut().insert(current_user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(header: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/students");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_token_extracted() {
        assert_eq!(bearer_token(&request(Some("Bearer abc.def"))).unwrap(), "abc.def");
    }

    #[test]
    fn test_missing_or_malformed_header_is_unauthorized() {
        for header in [None, Some("abc.def"), Some("Basic dXNlcjpwYXNz"), Some("Bearer ")] {
            assert!(matches!(
                bearer_token(&request(header)),
                Err(AppError::Unauthorized)
            ));
        }
    }
}
