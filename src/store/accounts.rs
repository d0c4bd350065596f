use std::collections::HashSet;

use anyhow::Context;
use chrono::NaiveDate;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;

use super::{Account, MockStore, PortalData, StoreError};
use crate::auth::{compute_password_hash, validate_creds, verify_password_hash, Credentials};
use crate::models::{
    AppointmentStatus, FileKind, LoginResponse, PasswordChange, Preferences, ProfileUpdate,
    Register, Role, User, UserUpdate,
};
use crate::telemetry::spawn_blocking_with_tracing;

const MIN_PASSWORD_LENGTH: usize = 8;

/// Counters shown on the dashboard. Role specific ones are left out for
/// the other roles.
#[derive(Debug, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub upcoming_appointments: usize,
    pub appointments_today: usize,
    pub unread_messages: usize,
    pub unread_notifications: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescriptions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_patients: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_users: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_doctors: Option<usize>,
}

/// Generate a random 25-characters-long case-sensitive session token.
fn generate_token() -> String {
    let mut rng = thread_rng();
    std::iter::repeat_with(|| rng.sample(Alphanumeric))
        .map(char::from)
        .take(25)
        .collect()
}

fn require(value: &str, field: &str) -> Result<String, StoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StoreError::Validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn check_password_strength(password: &Secret<String>) -> Result<(), StoreError> {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(StoreError::Validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

async fn hash_password(password: Secret<String>) -> Result<Secret<String>, StoreError> {
    let hash = spawn_blocking_with_tracing(move || compute_password_hash(password))
        .await
        .context("Failed to spawn a blocking task")??;
    Ok(hash)
}

impl PortalData {
    fn specialty_exists(&self, specialty_id: &str) -> bool {
        self.specialties.iter().any(|s| s.id == specialty_id)
    }

    /// Normalises an email and checks no other account uses it.
    fn checked_email(&self, raw: &str, owner: Option<&str>) -> Result<String, StoreError> {
        let email = require(raw, "Email")?.to_lowercase();
        if !email.contains('@') {
            return Err(StoreError::Validation(format!("{} is not a valid email", email)));
        }
        if self.accounts.iter().any(|account| {
            Some(account.user.id.as_str()) != owner
                && account.user.email.eq_ignore_ascii_case(&email)
        }) {
            return Err(StoreError::Conflict(format!(
                "An account already exists for {}",
                email
            )));
        }
        Ok(email)
    }

    /// Doctors need an existing specialty. Other roles carry none.
    fn checked_specialty(
        &self,
        role: Role,
        specialty_id: Option<&str>,
    ) -> Result<Option<String>, StoreError> {
        let specialty_id = specialty_id.map(str::trim).filter(|id| !id.is_empty());
        match (role, specialty_id) {
            (Role::Doctor, None) => Err(StoreError::Validation(
                "Doctors must choose a specialty".to_string(),
            )),
            (Role::Doctor, Some(id)) if !self.specialty_exists(id) => {
                Err(StoreError::NotFound(format!("Specialty {}", id)))
            }
            (Role::Doctor, Some(id)) => Ok(Some(id.to_string())),
            _ => Ok(None),
        }
    }

    /// Checks a sign-up form against the current accounts and returns the
    /// user it would create, minus the id.
    fn prepare_user(&self, form: &Register, role: Role) -> Result<User, StoreError> {
        let email = self.checked_email(&form.email, None)?;
        let specialty_id = self.checked_specialty(role, form.specialty_id.as_deref())?;
        Ok(User {
            id: String::new(),
            email,
            first_name: require(&form.first_name, "First name")?,
            last_name: require(&form.last_name, "Last name")?,
            role,
            specialty_id,
            profile_image: form
                .profile_image
                .clone()
                .filter(|url| !url.trim().is_empty()),
        })
    }

    fn issue_token(&mut self, user_id: &str) -> String {
        let token = generate_token();
        self.tokens.insert(token.clone(), user_id.to_string());
        token
    }
}

impl MockStore {
    /// Lookups used to resolve the caller skip the simulated latency.
    pub async fn stored_credentials(&self, email: &str) -> Option<(String, Secret<String>)> {
        let data = self.data.read().await;
        data.accounts
            .iter()
            .find(|account| account.user.email.eq_ignore_ascii_case(email.trim()))
            .map(|account| (account.user.id.clone(), account.password_hash.clone()))
    }

    pub async fn user_id_for_token(&self, token: &str) -> Option<String> {
        self.data.read().await.tokens.get(token).cloned()
    }

    pub async fn user(&self, user_id: &str) -> Result<User, StoreError> {
        self.data.read().await.user(user_id).cloned()
    }

    #[tracing::instrument(
        name = "Logging in",
        skip(self, credentials),
        fields(email = %credentials.email, user_id = tracing::field::Empty)
    )]
    pub async fn login(&self, credentials: Credentials) -> Result<LoginResponse, StoreError> {
        self.simulate_latency().await;
        let user_id = validate_creds(credentials, self).await?;
        tracing::Span::current().record("user_id", tracing::field::display(&user_id));
        let mut data = self.data.write().await;
        let user = data.user(&user_id)?.clone();
        let token = data.issue_token(&user.id);
        Ok(LoginResponse { token, user })
    }

    /// Self sign-up. Admin accounts can only be created by another admin.
    #[tracing::instrument(name = "Registering", skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: Register) -> Result<LoginResponse, StoreError> {
        let role = form.role.unwrap_or(Role::Patient);
        if role == Role::Admin {
            return Err(StoreError::Forbidden(
                "Admin accounts cannot be self-registered".to_string(),
            ));
        }
        let user = self.add_account(form, role).await?;
        let token = self.data.write().await.issue_token(&user.id);
        Ok(LoginResponse { token, user })
    }

    #[tracing::instrument(name = "Creating user", skip(self, form), fields(email = %form.email))]
    pub async fn create_user(&self, form: Register) -> Result<User, StoreError> {
        let role = form.role.unwrap_or(Role::Patient);
        self.add_account(form, role).await
    }

    async fn add_account(&self, form: Register, role: Role) -> Result<User, StoreError> {
        check_password_strength(&form.password)?;
        // Validate before paying for the hash, then again under the write lock
        self.data.read().await.prepare_user(&form, role)?;
        self.simulate_latency().await;
        let password_hash = hash_password(form.password.clone()).await?;

        let mut data = self.data.write().await;
        let mut user = data.prepare_user(&form, role)?;
        user.id = self.next_id("u");
        data.accounts.push(Account {
            user: user.clone(),
            password_hash,
        });
        tracing::info!(user_id = %user.id, role = %user.role, "Account created");
        Ok(user)
    }

    #[tracing::instrument(name = "Logging out", skip(self, token))]
    pub async fn logout(&self, token: &str) {
        self.data.write().await.tokens.remove(token);
    }

    #[tracing::instrument(name = "Fetching users", skip(self))]
    pub async fn users(&self) -> Vec<User> {
        self.simulate_latency().await;
        let data = self.data.read().await;
        data.accounts.iter().map(|a| a.user.clone()).collect()
    }

    /// Removes the account and revokes its tokens. Past appointments and
    /// messages are left as they are.
    #[tracing::instrument(name = "Deleting user", skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn delete_user(&self, actor: &User, user_id: &str) -> Result<User, StoreError> {
        if actor.id == user_id {
            return Err(StoreError::Forbidden(
                "You cannot delete your own account".to_string(),
            ));
        }
        self.simulate_latency().await;
        let mut data = self.data.write().await;
        let index = data
            .accounts
            .iter()
            .position(|account| account.user.id == user_id)
            .ok_or_else(|| StoreError::NotFound(format!("User {}", user_id)))?;
        let removed = data.accounts.remove(index).user;
        data.tokens.retain(|_, owner| owner != user_id);
        data.availability.remove(user_id);
        data.preferences.remove(user_id);
        Ok(removed)
    }

    /// Admin edit of an account. A doctor moved to another role loses their
    /// specialty and weekly availability.
    #[tracing::instrument(name = "Updating user", skip(self, actor, update), fields(actor_id = %actor.id))]
    pub async fn update_user(
        &self,
        actor: &User,
        user_id: &str,
        update: UserUpdate,
    ) -> Result<User, StoreError> {
        if actor.id == user_id && update.role.map_or(false, |role| role != actor.role) {
            return Err(StoreError::Forbidden(
                "You cannot change your own role".to_string(),
            ));
        }
        self.simulate_latency().await;
        let mut data = self.data.write().await;
        let current = data.user(user_id)?.clone();
        let role = update.role.unwrap_or(current.role);
        let email = match update.email.as_deref() {
            Some(email) => data.checked_email(email, Some(user_id))?,
            None => current.email,
        };
        let first_name = match update.first_name.as_deref() {
            Some(name) => require(name, "First name")?,
            None => current.first_name,
        };
        let last_name = match update.last_name.as_deref() {
            Some(name) => require(name, "Last name")?,
            None => current.last_name,
        };
        if role != Role::Doctor && update.specialty_id.is_some() {
            return Err(StoreError::Validation(
                "Only doctors have a specialty".to_string(),
            ));
        }
        let specialty_id = data.checked_specialty(
            role,
            update
                .specialty_id
                .as_deref()
                .or(current.specialty_id.as_deref()),
        )?;

        if current.role == Role::Doctor && role != Role::Doctor {
            data.availability.remove(user_id);
            tracing::warn!(user_id, %role, "Doctor moved to another role, availability cleared");
        }
        let account = data
            .account_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(format!("User {}", user_id)))?;
        account.user.email = email;
        account.user.first_name = first_name;
        account.user.last_name = last_name;
        account.user.role = role;
        account.user.specialty_id = specialty_id;
        Ok(account.user.clone())
    }

    #[tracing::instrument(name = "Updating profile", skip(self, update))]
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<User, StoreError> {
        self.simulate_latency().await;
        let mut data = self.data.write().await;
        if let Some(specialty_id) = update.specialty_id.as_deref() {
            if data.user(user_id)?.role != Role::Doctor {
                return Err(StoreError::Validation(
                    "Only doctors have a specialty".to_string(),
                ));
            }
            if !data.specialty_exists(specialty_id) {
                return Err(StoreError::NotFound(format!("Specialty {}", specialty_id)));
            }
        }
        let first_name = update
            .first_name
            .as_deref()
            .map(|name| require(name, "First name"))
            .transpose()?;
        let last_name = update
            .last_name
            .as_deref()
            .map(|name| require(name, "Last name"))
            .transpose()?;

        let account = data
            .account_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(format!("User {}", user_id)))?;
        if let Some(first_name) = first_name {
            account.user.first_name = first_name;
        }
        if let Some(last_name) = last_name {
            account.user.last_name = last_name;
        }
        if let Some(specialty_id) = update.specialty_id {
            account.user.specialty_id = Some(specialty_id);
        }
        if let Some(image) = update.profile_image {
            account.user.profile_image = Some(image).filter(|url| !url.trim().is_empty());
        }
        Ok(account.user.clone())
    }

    #[tracing::instrument(name = "Changing password", skip(self, change))]
    pub async fn change_password(
        &self,
        user_id: &str,
        change: PasswordChange,
    ) -> Result<(), StoreError> {
        if change.new_password.expose_secret() != change.confirm_password.expose_secret() {
            return Err(StoreError::Validation(
                "You entered two different new passwords - the field values must match"
                    .to_string(),
            ));
        }
        check_password_strength(&change.new_password)?;
        self.simulate_latency().await;

        let current_hash = self
            .data
            .read()
            .await
            .account(user_id)
            .map(|account| account.password_hash.clone())
            .ok_or_else(|| StoreError::NotFound(format!("User {}", user_id)))?;
        let current_password = change.current_password;
        spawn_blocking_with_tracing(move || verify_password_hash(current_hash, current_password))
            .await
            .context("Failed to spawn a blocking task")?
            .map_err(|_| StoreError::Validation("The current password is incorrect".to_string()))?;

        let new_hash = hash_password(change.new_password).await?;
        let mut data = self.data.write().await;
        let account = data
            .account_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(format!("User {}", user_id)))?;
        account.password_hash = new_hash;
        Ok(())
    }

    /// Saved settings, or the defaults for an account that never saved any.
    #[tracing::instrument(name = "Fetching preferences", skip(self))]
    pub async fn preferences(&self, user_id: &str) -> Result<Preferences, StoreError> {
        self.simulate_latency().await;
        let data = self.data.read().await;
        data.user(user_id)?;
        Ok(data.preferences.get(user_id).cloned().unwrap_or_default())
    }

    #[tracing::instrument(name = "Saving preferences", skip(self, preferences))]
    pub async fn save_preferences(
        &self,
        user_id: &str,
        preferences: Preferences,
    ) -> Result<Preferences, StoreError> {
        self.simulate_latency().await;
        let mut data = self.data.write().await;
        data.user(user_id)?;
        data.preferences
            .insert(user_id.to_string(), preferences.clone());
        Ok(preferences)
    }

    #[tracing::instrument(name = "Building dashboard", skip(self, user), fields(user_id = %user.id))]
    pub async fn dashboard(&self, user: &User, today: NaiveDate) -> DashboardSummary {
        self.simulate_latency().await;
        let data = self.data.read().await;
        let mine: Vec<_> = data
            .appointments
            .iter()
            .filter(|a| user.role == Role::Admin || a.involves(&user.id))
            .collect();
        let mut summary = DashboardSummary {
            upcoming_appointments: mine.iter().filter(|a| a.is_upcoming(today)).count(),
            appointments_today: mine
                .iter()
                .filter(|a| a.date == today && a.status == AppointmentStatus::Scheduled)
                .count(),
            unread_messages: data
                .messages
                .iter()
                .filter(|m| m.receiver_id == user.id && !m.read)
                .count(),
            unread_notifications: data
                .notifications
                .iter()
                .filter(|n| n.user_id == user.id && !n.read)
                .count(),
            ..DashboardSummary::default()
        };
        match user.role {
            Role::Patient => {
                let records: Vec<_> = data
                    .records
                    .iter()
                    .filter(|r| r.patient_id == user.id)
                    .collect();
                summary.prescriptions = Some(
                    records
                        .iter()
                        .flat_map(|r| &r.files)
                        .filter(|f| f.kind == FileKind::Prescription)
                        .count(),
                );
                summary.medical_records = Some(records.len());
            }
            Role::Doctor => {
                let patients: HashSet<&str> =
                    mine.iter().map(|a| a.patient_id.as_str()).collect();
                summary.total_patients = Some(patients.len());
                summary.medical_records = Some(
                    data.records
                        .iter()
                        .filter(|r| r.doctor_id == user.id)
                        .count(),
                );
            }
            Role::Admin => {
                summary.total_users = Some(data.accounts.len());
                summary.total_doctors = Some(data.users_with_role(Role::Doctor).count());
            }
        }
        summary
    }
}
