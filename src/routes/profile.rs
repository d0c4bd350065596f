use actix_web::{web, HttpRequest, HttpResponse};

use super::{caller, ApiError};
use crate::models::{PasswordChange, Preferences, ProfileUpdate};
use crate::navigation::{authorize, Page};
use crate::session::TypedSession;
use crate::store::MockStore;
use crate::utils::data_response;

#[tracing::instrument(
    name = "Viewing profile",
    skip(request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn get_profile(
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Page::Profile)?;
    Ok(data_response(&user))
}

#[tracing::instrument(
    name = "Updating profile",
    skip(update, request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn update_profile(
    update: web::Json<ProfileUpdate>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Page::Profile)?;
    let updated = store.update_profile(&user.id, update.into_inner()).await?;
    Ok(data_response(&updated))
}

#[tracing::instrument(
    name = "Changing password",
    skip(change, request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn change_password(
    change: web::Json<PasswordChange>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Page::Settings)?;
    store.change_password(&user.id, change.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "message": "Your password has been changed."
    })))
}

#[tracing::instrument(
    name = "Viewing preferences",
    skip(request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn get_preferences(
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Page::Settings)?;
    let preferences = store.preferences(&user.id).await?;
    Ok(data_response(&preferences))
}

#[tracing::instrument(
    name = "Saving preferences",
    skip(preferences, request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn update_preferences(
    preferences: web::Json<Preferences>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Page::Settings)?;
    let saved = store
        .save_preferences(&user.id, preferences.into_inner())
        .await?;
    Ok(data_response(&saved))
}
