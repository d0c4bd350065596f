use actix_web::http::header::HeaderMap;
use anyhow::Context;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use base64::Engine;
use secrecy::{ExposeSecret, Secret};

use crate::store::MockStore;
use crate::telemetry::spawn_blocking_with_tracing;

pub struct Credentials {
    pub email: String,
    pub password: Secret<String>,
}

/// What the `Authorization` header carried, if anything.
pub enum Authorization {
    Basic(Credentials),
    Bearer(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication failed")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

pub fn parse_authorization(headers: &HeaderMap) -> Result<Option<Authorization>, AuthError> {
    let Some(header) = headers.get("Authorization") else {
        return Ok(None);
    };
    let header = header
        .to_str()
        .context("Failed to parse Authorization header")
        .map_err(AuthError::InvalidCredentials)?;
    if let Some(token) = header.strip_prefix("Bearer ") {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::InvalidCredentials(anyhow::anyhow!(
                "Empty bearer token"
            )));
        }
        return Ok(Some(Authorization::Bearer(token.to_string())));
    }
    basic_auth(header).map(|credentials| Some(Authorization::Basic(credentials)))
}

fn basic_auth(header: &str) -> Result<Credentials, AuthError> {
    let base64 = header
        .strip_prefix("Basic ")
        .context("Invalid Authorization header")
        .map_err(AuthError::InvalidCredentials)?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(base64)
        .context("Failed to decode base64")
        .map_err(AuthError::InvalidCredentials)?;
    let decoded_credentials = String::from_utf8(decoded)
        .context("Invalid UTF-8")
        .map_err(AuthError::InvalidCredentials)?;

    // Split it into 2 sections separated by :
    let mut creds = decoded_credentials.splitn(2, ':');
    let email = creds
        .next()
        .ok_or_else(|| anyhow::anyhow!("Missing email in Basic Auth"))
        .map_err(AuthError::InvalidCredentials)?
        .to_string();
    let password = creds
        .next()
        .ok_or_else(|| anyhow::anyhow!("Missing password in Basic Auth"))
        .map_err(AuthError::InvalidCredentials)?
        .to_string();
    Ok(Credentials {
        email,
        password: Secret::new(password),
    })
}

/// Returns the id of the account owning `credentials`.
#[tracing::instrument(name = "Validate credentials", skip(credentials, store))]
pub async fn validate_creds(credentials: Credentials, store: &MockStore) -> Result<String, AuthError> {
    let mut user_id = None;
    // Unknown emails are still checked against a hash so both paths cost the same
    let mut expected_password_hash = Secret::new(
        "$argon2id$v=19$m=15000,t=2,p=1$\
        gZiV/M1gPc22ElAH/Jh1Hw$\
        CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno"
            .to_string(),
    );

    if let Some((stored_user_id, stored_password_hash)) =
        store.stored_credentials(&credentials.email).await
    {
        user_id = Some(stored_user_id);
        expected_password_hash = stored_password_hash;
    }

    spawn_blocking_with_tracing(move || {
        verify_password_hash(expected_password_hash, credentials.password)
    })
    .await
    .context("Failed to spawn a blocking task")??;

    user_id
        .ok_or_else(|| anyhow::anyhow!("Unknown email"))
        .map_err(AuthError::InvalidCredentials)
}

#[tracing::instrument(
    name = "Verify password hash",
    skip(expected_password_hash, password_candidate)
)]
pub(crate) fn verify_password_hash(
    expected_password_hash: Secret<String>,
    password_candidate: Secret<String>,
) -> Result<(), AuthError> {
    let expected_password_hash = PasswordHash::new(expected_password_hash.expose_secret())
        .context("Failed to parse hash in PHC string format.")?;

    Argon2::default()
        .verify_password(
            password_candidate.expose_secret().as_bytes(),
            &expected_password_hash,
        )
        .context("Invalid password.")
        .map_err(AuthError::InvalidCredentials)
}

pub fn compute_password_hash(password: Secret<String>) -> Result<Secret<String>, anyhow::Error> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(15000, 2, 1, None).context("Invalid argon2 parameters")?,
    )
    .hash_password(password.expose_secret().as_bytes(), &salt)
    .context("Failed to hash password")?
    .to_string();
    Ok(Secret::new(password_hash))
}
