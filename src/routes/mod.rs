mod appointments;
mod availability;
mod booking;
mod health_check;
mod login;
mod messages;
mod navigation;
mod notifications;
mod profile;
mod records;
mod users;

pub use appointments::*;
pub use availability::*;
pub use booking::*;
pub use health_check::*;
pub use login::*;
pub use messages::*;
pub use navigation::*;
pub use notifications::*;
pub use profile::*;
pub use records::*;
pub use users::*;

use actix_web::http::header::{self, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};

use crate::auth::{authenticate, AuthError};
use crate::availability::AvailabilityError;
use crate::booking::BookingError;
use crate::models::User;
use crate::navigation::AccessDenied;
use crate::session::TypedSession;
use crate::store::{MockStore, StoreError};
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum ApiError {
    #[error("Authentication failed")]
    AuthError(#[source] anyhow::Error),
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error(transparent)]
    Availability(#[from] AvailabilityError),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials(_) => ApiError::AuthError(e.into()),
            AuthError::UnexpectedError(_) => ApiError::UnexpectedError(e.into()),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::AuthError(_) => StatusCode::UNAUTHORIZED,
            ApiError::AccessDenied(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) | ApiError::Availability(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(e) => match e {
                StoreError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::Forbidden(_) => StatusCode::FORBIDDEN,
                StoreError::Conflict(_) | StoreError::InvalidTransition { .. } => {
                    StatusCode::CONFLICT
                }
                StoreError::Validation(_)
                | StoreError::SlotUnavailable { .. }
                | StoreError::Availability(_) => StatusCode::BAD_REQUEST,
                StoreError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Booking(BookingError::Busy) => StatusCode::CONFLICT,
            ApiError::Booking(_) => StatusCode::BAD_REQUEST,
            ApiError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Something went wrong".to_string()
        } else {
            self.to_string()
        };
        let mut response = HttpResponse::build(status).json(serde_json::json!({
            "status": "error",
            "message": message
        }));
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(r#"Basic realm="Restricted""#),
            );
        }
        response
    }
}

/// Resolves the caller and records it on the handler's span.
pub(crate) async fn caller(
    request: &HttpRequest,
    session: &TypedSession,
    store: &MockStore,
) -> Result<User, ApiError> {
    let user = authenticate(request.headers(), session, store).await?;
    tracing::Span::current().record("user_id", tracing::field::display(&user.id));
    Ok(user)
}
