use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::TokenService;
use crate::error::AppError;

/// Routes reachable without a credential.
const PUBLIC_PATHS: [&str; 3] = ["/api/health", "/api/auth/login", "/api/auth/register"];

/// Cookie checked when no `Authorization` header is present.
pub const TOKEN_COOKIE: &str = "token";

/// Verifies the bearer credential of every non-public request and stores the
/// resulting `Identity` in the request extensions.
#[derive(Clone)]
pub struct AuthMiddleware {
    tokens: web::Data<TokenService>,
    log_identity: bool,
}

impl AuthMiddleware {
    pub fn new(tokens: web::Data<TokenService>) -> Self {
        Self {
            tokens,
            log_identity: false,
        }
    }

    /// Log the resolved user id of each authenticated request.
    pub fn log_identity(mut self, enabled: bool) -> Self {
        self.log_identity = enabled;
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            tokens: self.tokens.clone(),
            log_identity: self.log_identity,
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    tokens: web::Data<TokenService>,
    log_identity: bool,
}

/// Finds the raw token: `Authorization` header first, then the token cookie.
/// An optional `Bearer ` prefix is stripped.
pub fn extract_token(req: &ServiceRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let raw = from_header.or_else(|| req.cookie(TOKEN_COOKIE).map(|c| c.value().to_owned()))?;

    let token = raw.strip_prefix("Bearer ").unwrap_or(&raw).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_owned())
    }
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if PUBLIC_PATHS.contains(&req.path()) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let token = match extract_token(&req) {
            Some(token) => token,
            None => {
                let app_err = AppError::Unauthorized("Access denied: missing token".into());
                return Box::pin(async move { Err(app_err.into()) });
            }
        };

        match self.tokens.verify(&token) {
            Ok(identity) => {
                if self.log_identity {
                    log::info!("Authenticated user id: {}", identity.user_id);
                }
                req.extensions_mut().insert(identity);
                Box::pin(self.service.call(req))
            }
            Err(app_err) => {
                log::debug!("Rejected credential on {}: {}", req.path(), app_err);
                Box::pin(async move { Err(app_err.into()) })
            }
        }
    }
}
