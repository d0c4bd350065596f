use actix_web::{web, HttpRequest, HttpResponse};

use super::{caller, ApiError};
use crate::listing::UserFilter;
use crate::models::{Register, UserUpdate};
use crate::navigation::{authorize, Action, Page};
use crate::session::TypedSession;
use crate::store::MockStore;
use crate::utils::{created_response, data_response, listing_response};

#[tracing::instrument(
    name = "Listing users",
    skip(filter, request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn get_users(
    filter: web::Query<UserFilter>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Page::Users)?;
    let users = store.users().await;
    Ok(listing_response(&filter.apply(&users)))
}

#[tracing::instrument(
    name = "Adding a user",
    skip(form, request, store, session),
    fields(user_id = tracing::field::Empty, email = %form.email)
)]
pub async fn create_user(
    form: web::Json<Register>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Action::ManageUsers)?;
    let created = store.create_user(form.into_inner()).await?;
    Ok(created_response(&created))
}

#[tracing::instrument(
    name = "Editing a user",
    skip(update, request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn update_user(
    path: web::Path<String>,
    update: web::Json<UserUpdate>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Action::ManageUsers)?;
    let updated = store
        .update_user(&user, &path, update.into_inner())
        .await?;
    Ok(data_response(&updated))
}

#[tracing::instrument(
    name = "Deleting a user",
    skip(request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn delete_user(
    path: web::Path<String>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Action::ManageUsers)?;
    let removed = store.delete_user(&user, &path).await?;
    Ok(data_response(&removed))
}
