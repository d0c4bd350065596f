//! In-memory stand-in for the portal back end.
//!
//! Every public operation waits for the configured latency first, outside
//! of any lock, then reads or mutates the shared data.

mod accounts;
mod messaging;
mod records;
mod scheduling;
pub(crate) mod seed;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use secrecy::Secret;
use tokio::sync::RwLock;

use crate::auth::AuthError;
use crate::availability::{AvailabilityError, AvailabilityGrid};
use crate::config::MockSettings;
use crate::models::{
    Appointment, AppointmentStatus, Message, MedicalRecord, NewAppointment, Notification,
    NotificationKind, Preferences, Role, SlotTime, Specialty, TimeSlot, User,
};
use crate::utils::error_chain_fmt;

pub use accounts::DashboardSummary;
pub use seed::SAMPLE_PASSWORD;

/// Ids handed out at runtime start here, well clear of the seeded ones.
const FIRST_GENERATED_ID: u64 = 1000;

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{time} on {date} is not an available slot for doctor {doctor_id}")]
    SlotUnavailable {
        doctor_id: String,
        date: NaiveDate,
        time: SlotTime,
    },
    #[error("Cannot move an appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Availability(#[from] AvailabilityError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<AuthError> for StoreError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials(_) => StoreError::InvalidCredentials,
            AuthError::UnexpectedError(e) => StoreError::Unexpected(e),
        }
    }
}

/// The calls the booking flow depends on.
#[async_trait]
pub trait SchedulingApi: Send + Sync {
    async fn specialties(&self) -> Result<Vec<Specialty>, StoreError>;

    async fn doctors_by_specialty(&self, specialty_id: &str) -> Result<Vec<User>, StoreError>;

    async fn doctor_availability(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>, StoreError>;

    async fn book_appointment(&self, appointment: NewAppointment)
        -> Result<Appointment, StoreError>;
}

struct Account {
    user: User,
    password_hash: Secret<String>,
}

#[derive(Default)]
struct PortalData {
    accounts: Vec<Account>,
    specialties: Vec<Specialty>,
    appointments: Vec<Appointment>,
    messages: Vec<Message>,
    records: Vec<MedicalRecord>,
    notifications: Vec<Notification>,
    availability: HashMap<String, AvailabilityGrid>,
    /// Only accounts that saved their settings have an entry.
    preferences: HashMap<String, Preferences>,
    /// Session token -> user id.
    tokens: HashMap<String, String>,
}

impl PortalData {
    fn account(&self, user_id: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|account| account.user.id == user_id)
    }

    fn account_mut(&mut self, user_id: &str) -> Option<&mut Account> {
        self.accounts
            .iter_mut()
            .find(|account| account.user.id == user_id)
    }

    fn user(&self, user_id: &str) -> Result<&User, StoreError> {
        self.account(user_id)
            .map(|account| &account.user)
            .ok_or_else(|| StoreError::NotFound(format!("User {}", user_id)))
    }

    fn user_with_role(&self, user_id: &str, role: Role) -> Result<&User, StoreError> {
        self.account(user_id)
            .map(|account| &account.user)
            .filter(|user| user.role == role)
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", role, user_id)))
    }

    fn users_with_role(&self, role: Role) -> impl Iterator<Item = &User> {
        self.accounts
            .iter()
            .map(|account| &account.user)
            .filter(move |user| user.role == role)
    }

    fn grid_for(&self, doctor_id: &str) -> AvailabilityGrid {
        self.availability
            .get(doctor_id)
            .cloned()
            .unwrap_or_default()
    }

    fn notify(
        &mut self,
        id: String,
        user_id: &str,
        kind: NotificationKind,
        title: &str,
        message: String,
        link_to: &str,
    ) {
        let muted = self
            .preferences
            .get(user_id)
            .map_or(false, |p| !p.notifications.wants(kind));
        if muted {
            tracing::debug!(user_id, ?kind, "Notification muted by preferences");
            return;
        }
        self.notifications.push(Notification {
            id,
            user_id: user_id.to_string(),
            title: title.to_string(),
            message,
            timestamp: Utc::now(),
            read: false,
            kind,
            link_to: Some(link_to.to_string()),
        });
    }
}

pub struct MockStore {
    latency: Duration,
    data: RwLock<PortalData>,
    sequence: AtomicU64,
}

impl MockStore {
    fn with_data(latency: Duration, data: PortalData) -> Self {
        Self {
            latency,
            data: RwLock::new(data),
            sequence: AtomicU64::new(FIRST_GENERATED_ID),
        }
    }

    /// An empty store: no accounts, no catalogue.
    pub fn new(latency: Duration) -> Self {
        Self::with_data(latency, PortalData::default())
    }

    pub fn seeded(settings: &MockSettings) -> Result<Self, anyhow::Error> {
        let data = seed::sample_data(settings.seed_sample_data)?;
        Ok(Self::with_data(settings.latency(), data))
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.sequence.fetch_add(1, Ordering::Relaxed))
    }
}
