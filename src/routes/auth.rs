/// Authentication Routes
///
/// Login, registration, token refresh, and the current user's account.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::auth::{
    hash_password, verify_dummy_password, verify_password, Claims, TokenPair, TokenService,
};
use crate::configuration::RefreshDelivery;
use crate::error::{AppError, AuthError, CryptoError, ErrorContext, ValidationError};
use crate::models::{Credentials, NewUser, PasswordChange, User};
use crate::repository::StoreRepository;
use crate::validators::{is_valid_email, is_valid_name, validate_new_password};

/// Cookie carrying the refresh token when `refresh_delivery = cookie`.
/// The `__Host-` prefix forbids a `Domain` attribute and requires `Secure`.
pub const REFRESH_COOKIE: &str = "__Host-refresh_token";

#[derive(Deserialize)]
pub struct RefreshForm {
    pub refresh_token: Option<String>,
}

/// Run a bcrypt operation on the blocking pool
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, CryptoError> + Send + 'static,
    T: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)
}

fn refresh_cookie(token: String, max_age_seconds: i64) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .max_age(Duration::seconds(max_age_seconds))
        .finish()
}

/// Shapes a token pair for the configured delivery channel
fn token_response(tokens: &TokenService, pair: TokenPair) -> HttpResponse {
    let settings = tokens.settings();
    match settings.refresh_delivery {
        RefreshDelivery::Body => HttpResponse::Ok().json(pair),
        RefreshDelivery::Cookie => HttpResponse::Ok()
            .cookie(refresh_cookie(pair.refresh_token, settings.refresh_token_expiry))
            .json(serde_json::json!({ "access_token": pair.access_token })),
    }
}

/// POST /api/v1/auth
///
/// Exchange email and password for a token pair.
///
/// # Errors
/// - 400: body is not JSON
/// - 401: unknown email or wrong password (same message for both)
/// - 500: hashing or signing failure
pub async fn authenticate(
    credentials: web::Json<Credentials>,
    repo: web::Data<dyn StoreRepository>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("authenticate");
    let Credentials { email, password } = credentials.into_inner();

    let user = match repo.user_by_email(email.trim()).await? {
        Some(user) => user,
        None => {
            blocking(move || {
                verify_dummy_password(&password);
                Ok(())
            })
            .await?;
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    if password.is_empty() {
        return Err(AuthError::InvalidCredentials.into());
    }

    let hash = user.password_hash.clone();
    let valid = blocking(move || verify_password(&password, &hash)).await?;
    if !valid {
        return Err(AuthError::InvalidCredentials.into());
    }

    let pair = tokens.issue_pair(&user)?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User authenticated"
    );

    Ok(token_response(&tokens, pair))
}

/// POST /api/v1/auth/register
///
/// Creates a regular (non-admin) account. Any `is_admin` field in the body
/// is ignored.
///
/// # Errors
/// - 400: invalid email, name or password, or email already registered
pub async fn register(
    body: web::Json<NewUser>,
    repo: web::Data<dyn StoreRepository>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("register");
    let NewUser { name, email, password } = body.into_inner();

    let email = is_valid_email(&email)?;
    let name = is_valid_name("name", &name)?;
    validate_new_password(&password)?;

    let password_hash = blocking(move || hash_password(&password)).await?;
    let id = repo
        .insert_user(&name, &email, &password_hash)
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    tracing::info!(request_id = %context.request_id, user_id = %id, "User registered");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": id })))
}

/// POST /api/v1/refresh-token
///
/// Trades a refresh token that is about to expire for a new pair. The token
/// comes from the `refresh_token` form field, or from the refresh cookie
/// when the field is absent.
///
/// # Errors
/// - 400: no refresh token supplied, or its user no longer exists
/// - 401: token invalid, expired or not a refresh token
/// - 425: token still has more than `refresh_window` seconds to live
pub async fn refresh(
    req: HttpRequest,
    form: Option<web::Form<RefreshForm>>,
    repo: web::Data<dyn StoreRepository>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("refresh_token");

    let raw = form
        .and_then(|f| f.into_inner().refresh_token)
        .filter(|t| !t.is_empty())
        .or_else(|| req.cookie(REFRESH_COOKIE).map(|c| c.value().to_string()))
        .ok_or_else(|| ValidationError::EmptyField("refresh_token".to_string()))?;

    let claims = tokens.verify_refresh(&raw)?;

    let remaining = tokens.check_refresh_window(&claims, chrono::Utc::now().timestamp())?;

    let user = repo.user_by_id(claims.user_id()?).await?;
    let pair = tokens.issue_pair(&user)?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        remaining_seconds = remaining,
        "Token pair refreshed"
    );

    Ok(token_response(&tokens, pair))
}

/// GET /api/v1/users/me
pub async fn current_user(
    claims: web::ReqData<Claims>,
    repo: web::Data<dyn StoreRepository>,
) -> Result<HttpResponse, AppError> {
    let user: User = repo.user_by_id(claims.user_id()?).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// PUT /api/v1/users/me/password
///
/// # Errors
/// - 400: new password does not meet the length rules
/// - 401: current password is wrong
pub async fn change_password(
    claims: web::ReqData<Claims>,
    body: web::Json<PasswordChange>,
    repo: web::Data<dyn StoreRepository>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;
    let context = ErrorContext::new("change_password").with_user_id(user_id);
    let PasswordChange {
        current_password,
        new_password,
    } = body.into_inner();

    validate_new_password(&new_password)?;

    let user = repo.user_by_id(user_id).await?;
    let hash = user.password_hash;
    let valid = blocking(move || verify_password(&current_password, &hash)).await?;
    if !valid {
        return Err(AuthError::InvalidCredentials.into());
    }

    let new_hash = blocking(move || hash_password(&new_password)).await?;
    repo.update_password(user_id, &new_hash).await.map_err(|e| {
        context.log_error(&e);
        e
    })?;

    tracing::info!(request_id = %context.request_id, user_id = %user_id, "Password changed");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "password updated" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_cookie_attributes() {
        let cookie = refresh_cookie("token".to_string(), 86400);

        assert_eq!(cookie.name(), "__Host-refresh_token");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(86400)));
        assert!(cookie.domain().is_none());
    }
}
