use chrono::NaiveDate;
use enum_display::EnumDisplay;
use serde::{Deserialize, Serialize};

use crate::models::schedule::SlotTime;

pub const DEFAULT_DURATION_MINUTES: u32 = 30;
const MAX_DURATION_MINUTES: u32 = 240;

#[derive(Debug, EnumDisplay, Serialize, Deserialize, PartialEq, Eq, Copy, Clone)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, EnumDisplay, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ConsultationType {
    #[default]
    InPerson,
    Teleconsultation,
}

impl ConsultationType {
    /// Label shown to users and matched by consultation search.
    pub fn label(&self) -> &'static str {
        match self {
            ConsultationType::InPerson => "in-person",
            ConsultationType::Teleconsultation => "teleconsultation",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub duration: u32,
    pub status: AppointmentStatus,
    #[serde(rename = "type")]
    pub consultation_type: ConsultationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Appointment {
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.status == AppointmentStatus::Scheduled && self.date >= today
    }

    pub fn is_past(&self, today: NaiveDate) -> bool {
        self.status == AppointmentStatus::Completed || self.date < today
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.patient_id == user_id || self.doctor_id == user_id
    }
}

/// A validated booking request. The store assigns id and status.
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub patient_id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub duration: u32,
    #[serde(rename = "type")]
    pub consultation_type: ConsultationType,
    pub notes: Option<String>,
}

/// Partial appointment as submitted by a client.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentForm {
    #[serde(default)]
    pub patient_id: Option<String>,
    pub doctor_id: String,
    pub date: NaiveDate,
    pub time: SlotTime,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(rename = "type", default)]
    pub consultation_type: Option<ConsultationType>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TryFrom<AppointmentForm> for NewAppointment {
    type Error = String;

    fn try_from(value: AppointmentForm) -> Result<Self, Self::Error> {
        let patient_id = value
            .patient_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| "A patient is required".to_string())?;
        if value.doctor_id.trim().is_empty() {
            return Err("A doctor is required".to_string());
        }
        let duration = value.duration.unwrap_or(DEFAULT_DURATION_MINUTES);
        if !is_valid_duration(duration) {
            return Err(format!(
                "Duration must be between 1 and {} minutes",
                MAX_DURATION_MINUTES
            ));
        }
        Ok(NewAppointment {
            patient_id,
            doctor_id: value.doctor_id,
            date: value.date,
            time: value.time,
            duration,
            consultation_type: value.consultation_type.unwrap_or_default(),
            notes: value.notes.filter(|notes| !notes.trim().is_empty()),
        })
    }
}

fn is_valid_duration(minutes: u32) -> bool {
    (1..=MAX_DURATION_MINUTES).contains(&minutes)
}
