use serde::{Deserialize, Serialize};

use crate::models::NotificationKind;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Spanish,
    French,
    German,
    Chinese,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProfileVisibility {
    #[default]
    Public,
    Patients,
    Private,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPreferences {
    pub email: bool,
    pub push: bool,
    pub sms: bool,
    pub appointments: bool,
    pub messages: bool,
    pub updates: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
            sms: false,
            appointments: true,
            messages: true,
            updates: false,
        }
    }
}

impl NotificationPreferences {
    /// Whether a notification of `kind` should be delivered at all.
    pub fn wants(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::Appointment => self.appointments,
            NotificationKind::Message => self.messages,
            NotificationKind::System => true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivacyPreferences {
    pub profile_visibility: ProfileVisibility,
    pub show_contact_info: bool,
    pub allow_messaging: bool,
}

impl Default for PrivacyPreferences {
    fn default() -> Self {
        Self {
            profile_visibility: ProfileVisibility::Public,
            show_contact_info: true,
            allow_messaging: true,
        }
    }
}

/// Per-account settings. A submitted document replaces the stored one;
/// omitted fields fall back to their defaults.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub dark_mode: bool,
    pub language: Language,
    pub notifications: NotificationPreferences,
    pub privacy: PrivacyPreferences,
    pub two_factor_enabled: bool,
}
