use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::auth::token::JwtKeys;
use crate::error::AppError;
use crate::models::User;
use crate::store::Store;

/// Requires a valid `Authorization: Bearer <token>` header on every request
/// it wraps and attaches the resolved [`User`] to the request extensions.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
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
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            // Rejections must be Ok responses; CORS does not decorate Err.
            let resolved = resolve_user(&req).await;
            match resolved {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}

async fn resolve_user(req: &ServiceRequest) -> Result<User, AppError> {
    let keys = req
        .app_data::<web::Data<JwtKeys>>()
        .ok_or_else(|| AppError::InternalServerError("Token keys are not configured".into()))?;
    let store = req
        .app_data::<web::Data<dyn Store>>()
        .ok_or_else(|| AppError::InternalServerError("Store is not configured".into()))?;

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    authenticate(store.get_ref(), keys.get_ref(), auth_header).await
}

/// Resolves an `Authorization` header value to the user it was issued for.
///
/// The scheme is matched case-insensitively. Every failure is
/// `AppError::Unauthorized`: missing header, a scheme other than `Bearer`,
/// a token that fails signature or expiry checks, or a token whose user no
/// longer exists.
pub async fn authenticate(
    store: &dyn Store,
    keys: &JwtKeys,
    auth_header: Option<&str>,
) -> Result<User, AppError> {
    let auth_header =
        auth_header.ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = auth_header
        .trim()
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("Bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;

    let claims = keys.verify_token(token)?;

    match store.find_user_by_id(claims.sub).await? {
        Some(user) => Ok(user),
        None => {
            log::warn!("Rejected token for unknown user {}", claims.sub);
            Err(AppError::Unauthorized("User not found".into()))
        }
    }
}
