use crate::{
    auth::{AuthResponse, LoginRequest, PasswordHasher, RegisterRequest, TokenService},
    error::AppError,
    models::NewUser,
    store::Store,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Runs bcrypt off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Blocking task failed: {}", e)))?
}

/// Register a new user
///
/// Creates a new user account and returns an authentication token.
///
/// ## Responses:
/// - `201 Created`: `AuthResponse` with a token and the new user.
/// - `400 Bad Request`: name, email or password failed validation.
/// - `409 Conflict`: the email is already registered.
#[post("/register")]
pub async fn register(
    store: web::Data<dyn Store>,
    tokens: web::Data<TokenService>,
    hasher: web::Data<PasswordHasher>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let register_data = register_data.into_inner().normalized();
    register_data.validate()?;

    if store
        .find_user_by_email(&register_data.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let hasher = **hasher;
    let password = register_data.password;
    let password_hash = blocking(move || hasher.hash(&password)).await?;

    let user = store
        .create_user(NewUser {
            name: register_data.name,
            email: register_data.email,
            password_hash,
        })
        .await?;
    let token = tokens.issue(user.id)?;

    log::info!("Registered user {}", user.id);
    Ok(HttpResponse::Created().json(AuthResponse {
        message: "User registered successfully".into(),
        token,
        user,
    }))
}

/// Login user
///
/// Authenticates a user and returns an authentication token. Unknown email and
/// wrong password produce the same `401`.
#[post("/login")]
pub async fn login(
    store: web::Data<dyn Store>,
    tokens: web::Data<TokenService>,
    hasher: web::Data<PasswordHasher>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let login_data = login_data.into_inner().normalized();
    login_data.validate()?;

    let user = match store.find_user_by_email(&login_data.email).await? {
        Some(user) => user,
        None => return Err(AppError::Unauthorized("Invalid credentials".into())),
    };

    let hasher = **hasher;
    let password = login_data.password;
    let stored_hash = user.password_hash.clone();
    let matches = blocking(move || hasher.verify(&password, &stored_hash)).await?;
    if !matches {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let token = tokens.issue(user.id)?;
    log::debug!("User {} logged in", user.id);
    Ok(HttpResponse::Ok().json(AuthResponse {
        message: "Login successful".into(),
        token,
        user,
    }))
}
