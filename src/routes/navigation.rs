use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;

use super::{caller, ApiError};
use crate::navigation::{authorize, menu_for, Page};
use crate::session::TypedSession;
use crate::store::MockStore;
use crate::utils::{data_response, list_response};

#[tracing::instrument(
    name = "Navigation menu",
    skip(request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn navigation(
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    Ok(list_response(&menu_for(user.role)))
}

#[tracing::instrument(
    name = "Dashboard",
    skip(request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn dashboard(
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Page::Dashboard)?;
    let summary = store.dashboard(&user, Utc::now().date_naive()).await;
    Ok(data_response(&summary))
}
