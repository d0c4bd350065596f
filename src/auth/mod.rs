mod credentials;

pub use credentials::{
    compute_password_hash, parse_authorization, validate_creds, AuthError, Authorization,
    Credentials,
};
pub(crate) use credentials::verify_password_hash;

use actix_web::http::header::HeaderMap;

use crate::models::User;
use crate::session::TypedSession;
use crate::store::{MockStore, StoreError};

/// Resolves the caller from a bearer token, basic credentials or the
/// session cookie, in that order.
#[tracing::instrument(name = "Authenticate caller", skip_all, fields(user_id = tracing::field::Empty))]
pub async fn authenticate(
    headers: &HeaderMap,
    session: &TypedSession,
    store: &MockStore,
) -> Result<User, AuthError> {
    let user_id = match parse_authorization(headers)? {
        Some(Authorization::Bearer(token)) => store
            .user_id_for_token(&token)
            .await
            .ok_or_else(|| AuthError::InvalidCredentials(anyhow::anyhow!("Unknown token")))?,
        Some(Authorization::Basic(credentials)) => validate_creds(credentials, store).await?,
        None => session
            .get_user_id()
            .map_err(|e| AuthError::UnexpectedError(anyhow::anyhow!(e.to_string())))?
            .ok_or_else(|| AuthError::InvalidCredentials(anyhow::anyhow!("Missing credentials")))?,
    };
    tracing::Span::current().record("user_id", tracing::field::display(&user_id));

    store.user(&user_id).await.map_err(|e| match e {
        StoreError::NotFound(_) => {
            AuthError::InvalidCredentials(anyhow::anyhow!("The account no longer exists"))
        }
        other => AuthError::UnexpectedError(other.into()),
    })
}
