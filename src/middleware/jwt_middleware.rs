/// JWT Authentication Middleware
///
/// Validates the bearer access token from the Authorization header and
/// injects its claims into request extensions for use by route handlers.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderValue, AUTHORIZATION, VARY},
    Error, HttpMessage, ResponseError,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{Claims, TokenService};
use crate::error::{AppError, AuthError};

/// JWT middleware for protecting routes
///
/// Must be applied to scopes that require authentication.
pub struct JwtMiddleware {
    tokens: TokenService,
}

impl JwtMiddleware {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    tokens: TokenService,
}

/// Pulls the token out of `Bearer <token>`. Anything other than exactly two
/// space-separated parts with a `Bearer` scheme is rejected.
fn bearer_token(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let value = header
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MissingToken),
    }
}

fn authenticate(tokens: &TokenService, req: &ServiceRequest) -> Result<Claims, AuthError> {
    let token = bearer_token(req.headers().get(AUTHORIZATION))?;
    tokens.verify_access(token)
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(&self.tokens, &req) {
            Ok(claims) => {
                tracing::debug!(user_id = %claims.sub, "JWT validated successfully");
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move {
                    let mut res = service.call(req).await?;
                    res.headers_mut()
                        .insert(VARY, HeaderValue::from_static("Authorization"));
                    Ok(res.map_into_left_body())
                })
            }
            Err(e) => {
                tracing::warn!(path = %req.path(), error = %e, "JWT validation failed");

                // Rejections are rendered here so outer middleware sees a response
                let mut response = AppError::Auth(e).error_response();
                response
                    .headers_mut()
                    .insert(VARY, HeaderValue::from_static("Authorization"));
                let res = req.into_response(response).map_into_right_body();
                Box::pin(async move { Ok(res) })
            }
        }
    }
}
