/// Authentication Routes
///
/// Registration, login, token refresh, logout and the caller's own
/// identity. Cookie handling lives here; session rules live in
/// `SessionService`.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{
    presented_refresh_token, refresh_cookie, removal_cookie, AuthenticatedUser, IssuedCredentials,
    SessionService,
};
use crate::error::AppError;
use crate::store::{Identity, Role};
use crate::validators::require_credentials;

/// Register / login request body
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Public view of an identity
#[derive(Serialize)]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl From<&Identity> for UserResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.to_string(),
            username: identity.username.clone(),
            role: identity.role,
        }
    }
}

/// Login / registration response; the refresh token goes in a cookie
#[derive(Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn credentials_response(
    mut builder: actix_web::HttpResponseBuilder,
    issued: IssuedCredentials,
    message: &str,
    session: &SessionService,
) -> HttpResponse {
    let user = UserResponse::from(&issued.identity);
    builder
        .cookie(refresh_cookie(issued.refresh_token, session.settings()))
        .json(AuthResponse {
            message: message.to_string(),
            token: issued.access_token,
            user,
        })
}

/// POST /auth/register
///
/// Creates the identity (role `user`) and logs it in.
///
/// # Errors
/// - 400: username or password missing/invalid
/// - 409: username already taken
pub async fn register(
    form: web::Json<CredentialsRequest>,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let (username, password) =
        require_credentials(form.username.as_deref(), form.password.as_deref())?;

    let issued = session.register(&username, &password).await?;

    tracing::info!(
        user_id = %issued.identity.id,
        "User registered successfully"
    );

    Ok(credentials_response(
        HttpResponse::Created(),
        issued,
        "User registered and logged in successfully",
        &session,
    ))
}

/// POST /auth/login
///
/// # Errors
/// - 400: username or password missing
/// - 401: unknown username or wrong password (same message for both)
pub async fn login(
    form: web::Json<CredentialsRequest>,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let (username, password) =
        require_credentials(form.username.as_deref(), form.password.as_deref())?;

    let issued = session.login(&username, &password).await?;

    tracing::info!(
        user_id = %issued.identity.id,
        "User logged in successfully"
    );

    Ok(credentials_response(
        HttpResponse::Ok(),
        issued,
        "Successful login",
        &session,
    ))
}

/// GET|POST /auth/refresh
///
/// Reads the `refreshToken` cookie and answers `{accessToken}`. The
/// rotated refresh token is only sent back as a cookie when
/// `reissue_refresh_cookie` is on.
///
/// # Errors
/// - 401: no cookie
/// - 403: cookie unknown, revoked, expired, tampered, or its user is gone
pub async fn refresh(
    req: HttpRequest,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let presented = presented_refresh_token(&req);
    let refreshed = session.refresh(presented.as_deref()).await?;

    let mut response = HttpResponse::Ok();
    if session.settings().reissue_refresh_cookie {
        response.cookie(refresh_cookie(refreshed.refresh_token, session.settings()));
    }

    Ok(response.json(RefreshResponse {
        access_token: refreshed.access_token,
    }))
}

/// POST /auth/logout
///
/// # Errors
/// - 401: no cookie
pub async fn logout(
    req: HttpRequest,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let presented = presented_refresh_token(&req);
    session.logout(presented.as_deref()).await?;

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(session.settings()))
        .json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }))
}

/// GET /auth/me
///
/// **Requires** `Authorization: Bearer <access_token>`.
///
/// # Errors
/// - 401: missing or invalid token
/// - 404: the identity behind the token no longer exists
pub async fn get_current_user(
    user: AuthenticatedUser,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let identity = session.current_identity(&user.claims).await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(&identity)))
}
