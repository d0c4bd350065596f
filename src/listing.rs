//! Client-style search and filtering shared by the list screens.

use chrono::NaiveDate;
use serde::de::value::StringDeserializer;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Appointment, MedicalRecord, Role, User};

/// Text fields a free-text search looks at.
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

impl Searchable for User {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
        ]
    }
}

impl Searchable for Appointment {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.consultation_type.label()];
        if let Some(notes) = &self.notes {
            fields.push(notes.as_str());
        }
        fields
    }
}

impl Searchable for MedicalRecord {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.description.as_str()]
    }
}

/// Case-insensitive substring match over any field. A blank query matches.
pub fn matches_search(fields: &[&str], query: &str) -> bool {
    let query = query.trim().to_lowercase();
    query.is_empty() || fields.iter().any(|field| field.to_lowercase().contains(&query))
}

fn search<'a, T: Searchable + Clone>(
    items: &'a [T],
    query: Option<&str>,
) -> impl Iterator<Item = T> + 'a {
    let query = query.unwrap_or_default().to_string();
    items
        .iter()
        .filter(move |item| matches_search(&item.search_fields(), &query))
        .cloned()
}

/// Result of a filter: either rows, or an explicit empty state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing<T> {
    Items(Vec<T>),
    Empty { message: &'static str },
}

impl<T> Listing<T> {
    pub fn new(items: Vec<T>, empty_message: &'static str) -> Self {
        if items.is_empty() {
            Listing::Empty {
                message: empty_message,
            }
        } else {
            Listing::Items(items)
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            Listing::Items(items) => items,
            Listing::Empty { .. } => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Listing::Empty { .. })
    }
}

/// Reads `?field=` as "no filter". Query strings send an empty value for
/// "all" options, which would otherwise fail to parse as the enum.
pub fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => {
            T::deserialize(StringDeserializer::<D::Error>::new(raw.trim().to_string())).map(Some)
        }
        _ => Ok(None),
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct UserFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub role: Option<Role>,
}

impl UserFilter {
    pub fn apply(&self, users: &[User]) -> Listing<User> {
        let role = self.role;
        let rows = search(users, self.search.as_deref())
            .filter(|user| role.map_or(true, |role| user.role == role))
            .collect();
        Listing::new(rows, "No users found")
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationTab {
    #[default]
    Upcoming,
    Past,
}

#[derive(Debug, Clone)]
pub struct ConsultationFilter {
    pub search: Option<String>,
    pub tab: ConsultationTab,
    pub today: NaiveDate,
}

impl ConsultationFilter {
    pub fn apply(&self, appointments: &[Appointment]) -> Listing<Appointment> {
        let today = self.today;
        let tab = self.tab;
        let rows = search(appointments, self.search.as_deref())
            .filter(|appointment| match tab {
                ConsultationTab::Upcoming => appointment.is_upcoming(today),
                ConsultationTab::Past => appointment.is_past(today),
            })
            .collect();
        let message = match tab {
            ConsultationTab::Upcoming => "No upcoming consultations",
            ConsultationTab::Past => "No past consultations",
        };
        Listing::new(rows, message)
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RecordFilter {
    #[serde(default)]
    pub search: Option<String>,
}

impl RecordFilter {
    pub fn apply(&self, records: &[MedicalRecord]) -> Listing<MedicalRecord> {
        let rows = search(records, self.search.as_deref()).collect();
        Listing::new(rows, "No medical records found")
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ContactFilter {
    #[serde(default)]
    pub search: Option<String>,
}

impl ContactFilter {
    pub fn apply(&self, contacts: &[User]) -> Listing<User> {
        let query = self.search.clone().unwrap_or_default();
        let rows = contacts
            .iter()
            .filter(|contact| {
                matches_search(
                    &[contact.first_name.as_str(), contact.last_name.as_str()],
                    &query,
                )
            })
            .cloned()
            .collect();
        Listing::new(rows, "No contacts found")
    }
}
