use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::auth::token::Identity;
use crate::error::AppError;

/// Extracts the verified caller from request extensions.
///
/// `AuthMiddleware` puts the `Identity` there; if it is missing the route was
/// mounted outside the middleware and the request is treated as unauthenticated.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Identity);

impl AuthenticatedUser {
    pub fn user_id(&self) -> Uuid {
        self.0.user_id
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Identity>().copied() {
            Some(identity) => ready(Ok(AuthenticatedUser(identity))),
            None => {
                let err = AppError::Unauthorized("Access denied: no authenticated user".into());
                ready(Err(err.into()))
            }
        }
    }
}
