/// Bearer-token gate
///
/// A handler is protected by taking `AuthenticatedUser` as an argument.
/// The extractor reads `Authorization: Bearer <token>`, validates it
/// against the access-token secret and leaves the claims in the request
/// extensions for anything downstream.

use actix_web::{dev::Payload, web, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::claims::Claims;
use crate::auth::jwt::validate_access_token;
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError};

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub claims: Claims,
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let config = req
        .app_data::<web::Data<AuthSettings>>()
        .ok_or_else(|| AppError::Internal("auth settings not registered".to_string()))?;

    let token = bearer_token(req).ok_or(AuthError::MissingToken)?;
    let claims = validate_access_token(token, config)?;

    tracing::debug!(user_id = %claims.sub, "Access token accepted");

    req.extensions_mut().insert(claims.clone());
    Ok(AuthenticatedUser { claims })
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
