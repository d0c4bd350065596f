use actix_web::{web, HttpRequest, HttpResponse};
use anyhow::Context;

use super::{caller, ApiError};
use crate::auth::{parse_authorization, Authorization, Credentials};
use crate::models::{Login, LoginResponse, Register};
use crate::session::TypedSession;
use crate::store::MockStore;
use crate::utils::{created_response, data_response};

fn start_session(session: &TypedSession, response: &LoginResponse) -> Result<(), ApiError> {
    session.renew();
    session
        .insert_user_id(&response.user.id)
        .context("Failed to store the user id in the session")?;
    Ok(())
}

#[tracing::instrument(
    name = "Login",
    skip(form, store, session),
    fields(email = %form.email, user_id = tracing::field::Empty)
)]
pub async fn login(
    form: web::Json<Login>,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let Login { email, password } = form.into_inner();
    let response = store.login(Credentials { email, password }).await?;
    tracing::Span::current().record("user_id", tracing::field::display(&response.user.id));
    start_session(&session, &response)?;
    Ok(data_response(&response))
}

#[tracing::instrument(
    name = "Register",
    skip(form, store, session),
    fields(email = %form.email, user_id = tracing::field::Empty)
)]
pub async fn register(
    form: web::Json<Register>,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let response = store.register(form.into_inner()).await?;
    tracing::Span::current().record("user_id", tracing::field::display(&response.user.id));
    start_session(&session, &response)?;
    Ok(created_response(&response))
}

/// Revokes the bearer token, if one was sent, and drops the session cookie.
#[tracing::instrument(name = "Logout", skip(request, store, session))]
pub async fn log_out(
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    if let Ok(Some(Authorization::Bearer(token))) = parse_authorization(request.headers()) {
        store.logout(&token).await;
    }
    session.log_out();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "message": "You have successfully logged out."
    })))
}

#[tracing::instrument(
    name = "Current user",
    skip(request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn me(
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    Ok(data_response(&user))
}
