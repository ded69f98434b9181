//! Access-token extraction for user-scoped endpoints.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    id: Uuid,
    exp: usize,
}

/// HS256 verifier for access tokens issued by the account service.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding: DecodingKey,
    encoding: EncodingKey,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims.id)
            .map_err(|e| {
                log::debug!("rejected access token: {}", e);
                AppError::Unauthorized("Invalid or expired access token".to_string())
            })
    }

    /// Mint a token for `user_id`. Used by tests and local tooling.
    pub fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String, AppError> {
        let exp = (Utc::now() + ttl).timestamp().max(0) as usize;
        encode(&Header::new(Algorithm::HS256), &Claims { id: user_id, exp }, &self.encoding)
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}

/// The caller's user id, taken from a verified access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let verifier = req
        .app_data::<web::Data<TokenVerifier>>()
        .ok_or_else(|| AppError::Internal("token verifier not configured".to_string()))?;
    let token = req
        .cookie(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| bearer_token(req))
        .ok_or_else(|| AppError::Unauthorized("Provide an access token".to_string()))?;
    verifier.verify(&token).map(AuthenticatedUser)
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;

    use super::*;

    fn request(verifier: &TokenVerifier) -> TestRequest {
        TestRequest::default().app_data(web::Data::new(verifier.clone()))
    }

    #[test]
    fn bearer_and_cookie_tokens_are_accepted() {
        let verifier = TokenVerifier::new("secret");
        let user = Uuid::new_v4();
        let token = verifier.issue(user, Duration::minutes(5)).expect("token");

        let req = request(&verifier)
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_http_request();
        assert_eq!(authenticate(&req).expect("bearer"), AuthenticatedUser(user));

        let req = request(&verifier)
            .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, token))
            .to_http_request();
        assert_eq!(authenticate(&req).expect("cookie"), AuthenticatedUser(user));
    }

    #[test]
    fn missing_token_is_unauthorized() {
        let req = request(&TokenVerifier::new("secret")).to_http_request();

        assert!(matches!(authenticate(&req), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn foreign_and_expired_tokens_are_unauthorized() {
        let verifier = TokenVerifier::new("secret");
        let other = TokenVerifier::new("other-secret");
        let user = Uuid::new_v4();

        let forged = other.issue(user, Duration::minutes(5)).expect("token");
        assert!(matches!(verifier.verify(&forged), Err(AppError::Unauthorized(_))));

        let expired = verifier.issue(user, Duration::hours(-1)).expect("token");
        assert!(matches!(verifier.verify(&expired), Err(AppError::Unauthorized(_))));
    }
}
