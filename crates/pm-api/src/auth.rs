use axum::async_trait;
use axum::extract::FromRef;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use clap::ValueEnum;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::ApiError;

/// Symmetric algorithms only; the identity provider signs session tokens
/// with a shared secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum JwtAlgorithm {
    Hs256,
    Hs512,
}

impl JwtAlgorithm {
    fn as_jsonwebtoken(self) -> Algorithm {
        match self {
            JwtAlgorithm::Hs256 => Algorithm::HS256,
            JwtAlgorithm::Hs512 => Algorithm::HS512,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_algorithm: JwtAlgorithm,
}

/// The authenticated session: a verified token whose subject is the user id.
/// Whether that id still resolves to a stored user is checked per-handler,
/// so a stale session yields 401 rather than a broken query.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[allow(dead_code)]
    exp: Option<usize>,
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AuthConfig::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("expected Bearer token".into()))?;

        let validation = Validation::new(config.jwt_algorithm.as_jsonwebtoken());

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|err| ApiError::Unauthorized(format!("invalid token: {err}")))?;

        let user_id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| ApiError::Unauthorized("token subject is not a user id".into()))?;

        Ok(SessionUser { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        exp: usize,
    }

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".into(),
            jwt_algorithm: JwtAlgorithm::Hs256,
        }
    }

    fn parts_with_token(token: &str) -> Parts {
        let request = Request::builder()
            .uri("/")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap();
        request.into_parts().0
    }

    fn sign(sub: &str, secret: &str) -> String {
        encode(
            &Header::default(),
            &TestClaims {
                sub: sub.into(),
                exp: 4_000_000_000,
            },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn accepts_numeric_subject() {
        let mut parts = parts_with_token(&sign("42", "test-secret"));
        let session = SessionUser::from_request_parts(&mut parts, &config())
            .await
            .unwrap();
        assert_eq!(session.user_id, 42);
    }

    #[tokio::test]
    async fn rejects_non_numeric_subject() {
        let mut parts = parts_with_token(&sign("alice", "test-secret"));
        let err = SessionUser::from_request_parts(&mut parts, &config())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn rejects_wrong_secret() {
        let mut parts = parts_with_token(&sign("42", "other-secret"));
        let err = SessionUser::from_request_parts(&mut parts, &config())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
