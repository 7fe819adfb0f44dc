use crate::{
    auth::{
        hash_password, verify_password, AuthResponse, JwtKeys, LoginRequest, PasswordCost,
        RegisterRequest, RegisterResponse,
    },
    error::AppError,
    models::User,
    store::Store,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Register a new user
///
/// Creates an account and returns it without credentials. A taken username
/// yields `409 Conflict`.
#[post("/register")]
pub async fn register(
    store: web::Data<dyn Store>,
    cost: web::Data<PasswordCost>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let RegisterRequest {
        username,
        password,
        name,
    } = register_data.into_inner();

    if store.find_user_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict("Username already exists".into()));
    }

    let password_hash = hash_password(&password, cost.0)?;

    // The store enforces uniqueness too, for registrations racing past the check above.
    let user = store
        .create_user(User::new(username, password_hash, name))
        .await?;
    log::info!("Registered user {} ({})", user.username, user.id);

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User registered successfully".into(),
        user: user.into(),
    }))
}

/// Login user
///
/// Checks the credentials and returns a signed bearer token. Unknown users and
/// wrong passwords get the same `401` response.
#[post("/login")]
pub async fn login(
    store: web::Data<dyn Store>,
    keys: web::Data<JwtKeys>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = store
        .find_user_by_username(&login_data.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    if !verify_password(&login_data.password, &user.password_hash)? {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = keys.generate_token(user.id)?;
    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: user.into(),
    }))
}
