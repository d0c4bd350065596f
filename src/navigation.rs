//! Role gating for pages and actions.
//!
//! The sidebar menu and the check performed when a page or action is
//! entered read the same static table, so a page missing from a role's menu
//! is also refused when requested directly.

use std::fmt;

use serde::Serialize;

use crate::models::{Role, User};

const EVERYONE: &[Role] = &[Role::Patient, Role::Doctor, Role::Admin];
const CARE: &[Role] = &[Role::Patient, Role::Doctor];
const DOCTORS: &[Role] = &[Role::Doctor];
const ADMINS: &[Role] = &[Role::Admin];

/// Anything whose access is restricted to a closed set of roles.
pub trait Gated: fmt::Display {
    fn permitted_roles(&self) -> &'static [Role];

    fn is_permitted(&self, role: Role) -> bool {
        self.permitted_roles().contains(&role)
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Page {
    Dashboard,
    Appointments,
    Messages,
    MedicalRecords,
    Consultations,
    Availability,
    Users,
    Profile,
    Settings,
}

impl Page {
    /// Menu order.
    pub const ALL: [Page; 9] = [
        Page::Dashboard,
        Page::Appointments,
        Page::Messages,
        Page::MedicalRecords,
        Page::Consultations,
        Page::Availability,
        Page::Users,
        Page::Profile,
        Page::Settings,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Page::Dashboard => "/",
            Page::Appointments => "/appointments",
            Page::Messages => "/messages",
            Page::MedicalRecords => "/medical-records",
            Page::Consultations => "/consultations",
            Page::Availability => "/availability",
            Page::Users => "/users",
            Page::Profile => "/profile",
            Page::Settings => "/settings",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Appointments => "Appointments",
            Page::Messages => "Messages",
            Page::MedicalRecords => "Medical Records",
            Page::Consultations => "Consultations",
            Page::Availability => "My Availability",
            Page::Users => "User Management",
            Page::Profile => "Profile",
            Page::Settings => "Settings",
        }
    }
}

impl Gated for Page {
    fn permitted_roles(&self) -> &'static [Role] {
        match self {
            Page::Dashboard | Page::Appointments | Page::Profile | Page::Settings => EVERYONE,
            Page::Messages | Page::MedicalRecords => CARE,
            Page::Consultations | Page::Availability => DOCTORS,
            Page::Users => ADMINS,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "open the {} page", self.label())
    }
}

/// Mutations that are narrower than the page they live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    BookAppointment,
    ScheduleConsultation,
    CompleteAppointment,
    CreateMedicalRecord,
    EditAvailability,
    ManageUsers,
    SendMessage,
}

impl Gated for Action {
    fn permitted_roles(&self) -> &'static [Role] {
        match self {
            Action::BookAppointment => &[Role::Patient, Role::Admin],
            Action::ScheduleConsultation
            | Action::CompleteAppointment
            | Action::CreateMedicalRecord
            | Action::EditAvailability => DOCTORS,
            Action::ManageUsers => ADMINS,
            Action::SendMessage => CARE,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::BookAppointment => "book appointments",
            Action::ScheduleConsultation => "schedule consultations",
            Action::CompleteAppointment => "complete appointments",
            Action::CreateMedicalRecord => "create medical records",
            Action::EditAvailability => "edit availability",
            Action::ManageUsers => "manage users",
            Action::SendMessage => "send messages",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Access denied: {role} accounts cannot {target}")]
pub struct AccessDenied {
    pub role: Role,
    pub target: String,
}

/// Entry check shared by every handler.
pub fn authorize<G: Gated + ?Sized>(user: &User, target: &G) -> Result<(), AccessDenied> {
    if target.is_permitted(user.role) {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.id, role = %user.role, target = %target, "Access denied");
        Err(AccessDenied {
            role: user.role,
            target: target.to_string(),
        })
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub page: Page,
    pub path: &'static str,
    pub label: &'static str,
}

impl From<Page> for NavItem {
    fn from(page: Page) -> Self {
        Self {
            page,
            path: page.path(),
            label: page.label(),
        }
    }
}

pub fn menu_for(role: Role) -> Vec<NavItem> {
    Page::ALL
        .into_iter()
        .filter(|page| page.is_permitted(role))
        .map(NavItem::from)
        .collect()
}
