pub mod auth;
pub mod health;
pub mod tasks;

use actix_cors::Cors;
use actix_web::http::header::{self, HeaderName};
use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::auth::{AuthMiddleware, JwtKeys, PasswordCost};
use crate::config::{AllowedOrigins, Config};
use crate::error::AppError;
use crate::models::TaskAccess;
use crate::store::Store;

/// Everything the handlers need, registered as app data by [`app`].
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub keys: JwtKeys,
    pub password_cost: PasswordCost,
    pub task_access: TaskAccess,
}

impl AppState {
    pub fn from_config(store: Arc<dyn Store>, config: &Config) -> Self {
        Self {
            store,
            keys: JwtKeys::new(config.jwt_secret.as_bytes(), config.jwt_expiration_hours),
            password_cost: PasswordCost(config.bcrypt_cost),
            task_access: config.task_access,
        }
    }
}

/// Registers shared state, extractor error handlers and all routes.
///
/// Used as `App::new().configure(routes::app(state.clone()))`.
pub fn app(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::from(state.store))
            .app_data(web::Data::new(state.keys))
            .app_data(web::Data::new(state.password_cost))
            .app_data(web::Data::new(state.task_access))
            .app_data(json_config())
            .app_data(path_config())
            .configure(config);
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::index)
        .service(health::health)
        .service(
            web::scope("/api/v1")
                .service(
                    web::scope("/auth")
                        .service(auth::register)
                        .service(auth::login),
                )
                .service(
                    web::scope("/tasks")
                        .wrap(AuthMiddleware)
                        .service(tasks::get_tasks)
                        .service(tasks::create_task)
                        .service(tasks::get_task)
                        .service(tasks::update_task)
                        .service(tasks::delete_task),
                ),
        )
        .default_service(web::to(not_found));
}

/// CORS policy for browser clients.
pub fn cors(origins: &AllowedOrigins) -> Cors {
    let cors = match origins {
        AllowedOrigins::Any => Cors::default().allow_any_origin(),
        AllowedOrigins::List(list) => list
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin)),
    };

    cors.allowed_methods(vec!["GET", "POST", "HEAD", "PUT", "DELETE", "PATCH", "OPTIONS"])
        .allowed_headers(vec![
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers(vec![header::CONTENT_LENGTH, header::AUTHORIZATION])
        .max_age(86400)
}

// Body and path extraction failures would otherwise be plain-text responses
// (and a bad path parameter a 404).
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid request body: {}", err)).into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| AppError::BadRequest("Invalid task ID format".into()).into())
}

async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound("Resource not found".into()))
}
