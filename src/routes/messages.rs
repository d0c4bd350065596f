use actix_web::{web, HttpRequest, HttpResponse};

use super::{caller, ApiError};
use crate::listing::ContactFilter;
use crate::models::{MessageForm, NewMessage};
use crate::navigation::{authorize, Action, Page};
use crate::session::TypedSession;
use crate::store::MockStore;
use crate::utils::{created_response, data_response, list_response, listing_response};

#[tracing::instrument(
    name = "Listing messages",
    skip(request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn get_messages(
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Page::Messages)?;
    let messages = store.messages(&user.id).await;
    Ok(list_response(&messages))
}

#[tracing::instrument(
    name = "Sending a message",
    skip(form, request, store, session),
    fields(user_id = tracing::field::Empty, receiver_id = %form.receiver_id)
)]
pub async fn send_message(
    form: web::Json<MessageForm>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Action::SendMessage)?;
    let message = NewMessage::parse(&user.id, form.into_inner()).map_err(ApiError::BadRequest)?;
    let sent = store.send_message(message).await?;
    Ok(created_response(&sent))
}

#[tracing::instrument(
    name = "Marking a message read",
    skip(request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn read_message(
    path: web::Path<String>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Page::Messages)?;
    let message = store.mark_message_read(&user, &path).await?;
    Ok(data_response(&message))
}

#[tracing::instrument(
    name = "Listing contacts",
    skip(filter, request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn get_contacts(
    filter: web::Query<ContactFilter>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Page::Messages)?;
    let contacts = store.contacts(&user).await;
    Ok(listing_response(&filter.apply(&contacts)))
}
