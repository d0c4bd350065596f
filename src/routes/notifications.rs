use actix_web::{web, HttpRequest, HttpResponse};

use super::{caller, ApiError};
use crate::session::TypedSession;
use crate::store::MockStore;
use crate::utils::{data_response, list_response};

#[tracing::instrument(
    name = "Listing notifications",
    skip(request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn get_notifications(
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    let notifications = store.notifications(&user.id).await;
    Ok(list_response(&notifications))
}

#[tracing::instrument(
    name = "Marking a notification read",
    skip(request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn read_notification(
    path: web::Path<String>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    let notification = store.mark_notification_read(&user.id, &path).await?;
    Ok(data_response(&notification))
}
