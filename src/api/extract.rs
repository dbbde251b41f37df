use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use crate::app::AppState;
use crate::auth::{Session, SessionError};
use crate::error::DomainError;
use super::error::ApiError;

/// Resolves `Authorization: Bearer <token>` through the session store
impl FromRequest for Session {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string);
        let sessions = req
            .app_data::<web::Data<AppState>>()
            .map(|state| state.sessions.clone());

        Box::pin(async move {
            let sessions = sessions
                .ok_or_else(|| DomainError::Internal("application state is not registered".to_string()))?;

            sessions.resolve(token.as_deref()).await.map_err(|error| {
                if error != SessionError::MissingToken {
                    tracing::warn!(error = %error, "Rejected bearer token");
                }
                ApiError::from(error)
            })
        })
    }
}
