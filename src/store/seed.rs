//! Hard-coded sample data the portal starts with.

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use secrecy::Secret;

use super::{Account, PortalData};
use crate::auth::compute_password_hash;
use crate::models::{
    Appointment, AppointmentStatus, ConsultationType, FileKind, MedicalFile, MedicalRecord,
    Message, Notification, NotificationKind, Role, Specialty, User,
};

/// Password shared by every seeded account.
pub const SAMPLE_PASSWORD: &str = "password";

/// Accounts and specialties are always present so that login works.
/// Appointments, messages, records and notifications only when asked for.
pub(super) fn sample_data(include_activity: bool) -> Result<PortalData, anyhow::Error> {
    let password_hash = compute_password_hash(Secret::new(SAMPLE_PASSWORD.to_string()))
        .context("Failed to hash the sample password")?;

    let mut data = PortalData {
        accounts: users()
            .into_iter()
            .map(|user| Account {
                user,
                password_hash: password_hash.clone(),
            })
            .collect(),
        specialties: specialties(),
        ..PortalData::default()
    };
    if include_activity {
        data.appointments = appointments()?;
        data.messages = messages()?;
        data.records = records()?;
        data.notifications = notifications()?;
    }
    Ok(data)
}

fn specialties() -> Vec<Specialty> {
    vec![
        Specialty::new("s1", "Cardiology", "Heart and cardiovascular system", "heart"),
        Specialty::new("s2", "Dermatology", "Skin, hair, and nails", "user"),
        Specialty::new("s3", "Neurology", "Brain and nervous system", "brain"),
        Specialty::new("s4", "Pediatrics", "Children's health", "baby"),
        Specialty::new("s5", "Orthopedics", "Bones and muscles", "bone"),
        Specialty::new("s6", "Ophthalmology", "Eye care", "eye"),
    ]
}

fn user(id: &str, email: &str, first_name: &str, last_name: &str, role: Role) -> User {
    User {
        id: id.into(),
        email: email.into(),
        first_name: first_name.into(),
        last_name: last_name.into(),
        role,
        specialty_id: None,
        profile_image: None,
    }
}

fn users() -> Vec<User> {
    vec![
        User {
            specialty_id: Some("s1".into()),
            profile_image: Some(photo(5452293)),
            ..user("d1", "doctor@example.com", "John", "Smith", Role::Doctor)
        },
        User {
            specialty_id: Some("s1".into()),
            profile_image: Some(photo(5214958)),
            ..user("d2", "doctor2@example.com", "Sarah", "Johnson", Role::Doctor)
        },
        User {
            profile_image: Some(photo(5327580)),
            ..user("p1", "patient@example.com", "Jane", "Doe", Role::Patient)
        },
        user("p2", "patient2@example.com", "Robert", "Brown", Role::Patient),
        User {
            profile_image: Some(photo(5452201)),
            ..user("a1", "admin@example.com", "Admin", "User", Role::Admin)
        },
    ]
}

fn photo(id: u32) -> String {
    format!(
        "https://images.pexels.com/photos/{id}/pexels-photo-{id}.jpeg?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=2"
    )
}

fn date(raw: &str) -> Result<NaiveDate, anyhow::Error> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("Bad sample date {}", raw))
}

fn timestamp(raw: &str) -> Result<DateTime<Utc>, anyhow::Error> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Bad sample timestamp {}", raw))?
        .with_timezone(&Utc))
}

fn appointments() -> Result<Vec<Appointment>, anyhow::Error> {
    let appointment = |id: &str, patient: &str, doctor: &str, day: &str, time: &str| {
        Ok::<_, anyhow::Error>(Appointment {
            id: id.into(),
            patient_id: patient.into(),
            doctor_id: doctor.into(),
            date: date(day)?,
            time: time.parse()?,
            duration: 30,
            status: AppointmentStatus::Scheduled,
            consultation_type: ConsultationType::Teleconsultation,
            notes: None,
        })
    };
    Ok(vec![
        appointment("a1", "p1", "d1", "2025-06-15", "09:00")?,
        Appointment {
            duration: 45,
            consultation_type: ConsultationType::InPerson,
            notes: Some("Follow-up appointment".into()),
            ..appointment("a2", "p1", "d2", "2025-06-18", "14:30")?
        },
        Appointment {
            status: AppointmentStatus::Completed,
            ..appointment("a3", "p2", "d1", "2025-06-10", "11:00")?
        },
    ])
}

fn messages() -> Result<Vec<Message>, anyhow::Error> {
    let message = |id: &str, sender: &str, receiver: &str, content: &str, at: &str, read| {
        Ok::<_, anyhow::Error>(Message {
            id: id.into(),
            sender_id: sender.into(),
            receiver_id: receiver.into(),
            content: content.into(),
            timestamp: timestamp(at)?,
            read,
            attachment_url: None,
        })
    };
    Ok(vec![
        message(
            "m1",
            "d1",
            "p1",
            "Hello, how can I help you today?",
            "2025-06-14T10:30:00Z",
            true,
        )?,
        message(
            "m2",
            "p1",
            "d1",
            "I have a question about my prescription.",
            "2025-06-14T10:32:00Z",
            true,
        )?,
        message(
            "m3",
            "d1",
            "p1",
            "Sure, what would you like to know?",
            "2025-06-14T10:35:00Z",
            false,
        )?,
    ])
}

fn records() -> Result<Vec<MedicalRecord>, anyhow::Error> {
    let file = |id: &str, name: &str, kind, at: &str| {
        Ok::<_, anyhow::Error>(MedicalFile {
            id: id.into(),
            name: name.into(),
            kind,
            url: "#".into(),
            uploaded_at: timestamp(at)?,
        })
    };
    Ok(vec![
        MedicalRecord {
            id: "mr1".into(),
            patient_id: "p1".into(),
            doctor_id: "d1".into(),
            date: date("2025-05-20")?,
            title: "Annual Checkup".into(),
            description: "General health examination with blood tests".into(),
            files: vec![
                file("f1", "Blood Test Results", FileKind::Report, "2025-05-20T14:30:00Z")?,
                file("f2", "Prescription", FileKind::Prescription, "2025-05-20T14:35:00Z")?,
            ],
        },
        MedicalRecord {
            id: "mr2".into(),
            patient_id: "p1".into(),
            doctor_id: "d2".into(),
            date: date("2025-04-15")?,
            title: "Allergy Consultation".into(),
            description: "Evaluation for seasonal allergies".into(),
            files: vec![file(
                "f3",
                "Allergy Test Results",
                FileKind::Report,
                "2025-04-15T11:00:00Z",
            )?],
        },
    ])
}

fn notifications() -> Result<Vec<Notification>, anyhow::Error> {
    let notification =
        |id: &str, user: &str, title: &str, message: &str, at: &str, read, kind, link: &str| {
            Ok::<_, anyhow::Error>(Notification {
                id: id.into(),
                user_id: user.into(),
                title: title.into(),
                message: message.into(),
                timestamp: timestamp(at)?,
                read,
                kind,
                link_to: Some(link.into()),
            })
        };
    Ok(vec![
        notification(
            "n1",
            "p1",
            "Appointment Reminder",
            "You have an appointment tomorrow at 9:00 AM",
            "2025-06-14T08:00:00Z",
            false,
            NotificationKind::Appointment,
            "/appointments",
        )?,
        notification(
            "n2",
            "p1",
            "New Message",
            "You have a new message from Dr. Smith",
            "2025-06-13T15:30:00Z",
            true,
            NotificationKind::Message,
            "/messages",
        )?,
        notification(
            "n3",
            "d1",
            "Appointment Reminder",
            "You have a teleconsultation with Jane Doe tomorrow at 9:00 AM",
            "2025-06-14T08:00:00Z",
            false,
            NotificationKind::Appointment,
            "/consultations",
        )?,
        notification(
            "n4",
            "d1",
            "New Message",
            "You have a new message from Jane Doe",
            "2025-06-14T10:32:00Z",
            false,
            NotificationKind::Message,
            "/messages",
        )?,
    ])
}

/// A seeded store without latency.
#[cfg(test)]
pub(crate) fn test_store() -> super::MockStore {
    let settings = crate::config::MockSettings {
        latency_milliseconds: 0,
        seed_sample_data: true,
    };
    super::MockStore::seeded(&settings).expect("Failed to seed the store")
}
