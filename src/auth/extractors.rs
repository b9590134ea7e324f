use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::{JwtKeys, TokenKind};
use crate::error::AppError;

pub const NO_TOKEN: &str = "Unauthorized - No token provided";
pub const INVALID_TOKEN: &str = "Invalid or expired token";

/// Authenticated caller, from a session token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

/// `Authorization: Bearer <token>`; scheme is case-insensitive.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn authenticate(parts: &Parts, keys: &JwtKeys) -> Result<Uuid, AppError> {
    // No codec call at all without a token.
    let token = bearer_token(&parts.headers)
        .ok_or_else(|| AppError::Unauthenticated(NO_TOKEN.into()))?;

    let claims = keys.verify(token).map_err(|_| {
        warn!("invalid or expired token");
        AppError::Unauthenticated(INVALID_TOKEN.into())
    })?;

    if claims.kind != TokenKind::Session {
        warn!(user_id = %claims.sub, kind = ?claims.kind, "non-session token presented");
        return Err(AppError::Unauthenticated(INVALID_TOKEN.into()));
    }
    Ok(claims.sub)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        authenticate(parts, &keys).map(AuthUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::test_config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    #[derive(Clone)]
    struct TestState {
        keys: JwtKeys,
    }

    impl FromRef<TestState> for JwtKeys {
        fn from_ref(state: &TestState) -> Self {
            state.keys.clone()
        }
    }

    async fn whoami(AuthUser(id): AuthUser) -> String {
        id.to_string()
    }

    fn app(keys: JwtKeys) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .with_state(TestState { keys })
    }

    async fn call(app: &Router, uri: &str, auth: Option<&str>) -> (StatusCode, String) {
        let mut req = Request::builder().uri(uri);
        if let Some(value) = auth {
            req = req.header(AUTHORIZATION, value);
        }
        let res = app
            .clone()
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn bearer_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(AUTHORIZATION, "bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let app = app(JwtKeys::new(&test_config("s")));
        let (status, body) = call(&app, "/whoami", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains(NO_TOKEN));
    }

    #[tokio::test]
    async fn invalid_token_is_rejected() {
        let app = app(JwtKeys::new(&test_config("s")));
        let (status, body) = call(&app, "/whoami", Some("Bearer invalid-token")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains(INVALID_TOKEN));
    }

    #[tokio::test]
    async fn valid_session_token_injects_identity() {
        let keys = JwtKeys::new(&test_config("s"));
        let user = Uuid::new_v4();
        let token = keys.sign_session(user).unwrap();
        let app = app(keys);
        let (status, body) = call(&app, "/whoami", Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, user.to_string());
    }

    #[tokio::test]
    async fn reset_token_is_not_a_session() {
        let keys = JwtKeys::new(&test_config("s"));
        let token = keys.sign_reset(Uuid::new_v4()).unwrap();
        let app = app(keys);

        let (status, body) = call(&app, "/whoami", Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains(INVALID_TOKEN));
    }
}
