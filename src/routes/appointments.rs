use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use super::{caller, ApiError};
use crate::listing::{blank_as_none, ConsultationFilter, ConsultationTab};
use crate::models::{
    AppointmentForm, AppointmentStatus, ConsultationType, NewAppointment, Role, SlotTime,
};
use crate::navigation::{authorize, Action, Page};
use crate::session::TypedSession;
use crate::store::{MockStore, SchedulingApi};
use crate::utils::{created_response, data_response, list_response, listing_response};

#[derive(Deserialize, Debug)]
pub struct SlotQuery {
    pub date: NaiveDate,
}

#[derive(Deserialize, Debug, Default)]
pub struct ConsultationQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub tab: Option<ConsultationTab>,
}

/// A consultation scheduled by a doctor. The doctor is the caller.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationForm {
    pub patient_id: String,
    pub date: NaiveDate,
    pub time: SlotTime,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(rename = "type", default)]
    pub consultation_type: Option<ConsultationType>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[tracing::instrument(
    name = "Listing specialties",
    skip(request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn get_specialties(
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    caller(&request, &session, &store).await?;
    let specialties = store.specialties().await?;
    Ok(list_response(&specialties))
}

#[tracing::instrument(
    name = "Listing doctors of a specialty",
    skip(request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn get_specialty_doctors(
    path: web::Path<String>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    caller(&request, &session, &store).await?;
    let doctors = store.doctors_by_specialty(&path).await?;
    Ok(list_response(&doctors))
}

#[tracing::instrument(
    name = "Listing a doctor's time slots",
    skip(request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn get_doctor_slots(
    path: web::Path<String>,
    query: web::Query<SlotQuery>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    caller(&request, &session, &store).await?;
    let slots = store.doctor_availability(&path, query.date).await?;
    Ok(list_response(&slots))
}

#[tracing::instrument(
    name = "Listing appointments",
    skip(request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn get_appointments(
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Page::Appointments)?;
    let appointments = store.appointments(&user.id, user.role).await?;
    Ok(list_response(&appointments))
}

/// Patients always book for themselves; admins name the patient.
#[tracing::instrument(
    name = "Booking an appointment",
    skip(form, request, store, session),
    fields(
        user_id = tracing::field::Empty,
        doctor_id = %form.doctor_id,
    )
)]
pub async fn book_appointment(
    form: web::Json<AppointmentForm>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Action::BookAppointment)?;
    let mut form = form.into_inner();
    if user.role == Role::Patient {
        form.patient_id = Some(user.id.clone());
    }
    let appointment: NewAppointment = form.try_into().map_err(ApiError::BadRequest)?;
    let booked = store.book_appointment(appointment).await?;
    Ok(created_response(&booked))
}

#[tracing::instrument(
    name = "Cancelling an appointment",
    skip(request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn cancel_appointment(
    path: web::Path<String>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Page::Appointments)?;
    let appointment = store
        .set_appointment_status(&user, &path, AppointmentStatus::Cancelled)
        .await?;
    Ok(data_response(&appointment))
}

#[tracing::instrument(
    name = "Completing an appointment",
    skip(request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn complete_appointment(
    path: web::Path<String>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Action::CompleteAppointment)?;
    let appointment = store
        .set_appointment_status(&user, &path, AppointmentStatus::Completed)
        .await?;
    Ok(data_response(&appointment))
}

#[tracing::instrument(
    name = "Listing consultations",
    skip(query, request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn get_consultations(
    query: web::Query<ConsultationQuery>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Page::Consultations)?;
    let appointments = store.appointments(&user.id, user.role).await?;
    let query = query.into_inner();
    let filter = ConsultationFilter {
        search: query.search,
        tab: query.tab.unwrap_or_default(),
        today: Utc::now().date_naive(),
    };
    Ok(listing_response(&filter.apply(&appointments)))
}

#[tracing::instrument(
    name = "Scheduling a consultation",
    skip(form, request, store, session),
    fields(user_id = tracing::field::Empty, patient_id = %form.patient_id)
)]
pub async fn schedule_consultation(
    form: web::Json<ConsultationForm>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Action::ScheduleConsultation)?;
    let form = form.into_inner();
    let appointment: NewAppointment = AppointmentForm {
        patient_id: Some(form.patient_id),
        doctor_id: user.id.clone(),
        date: form.date,
        time: form.time,
        duration: form.duration,
        consultation_type: form.consultation_type,
        notes: form.notes,
    }
    .try_into()
    .map_err(ApiError::BadRequest)?;
    let booked = store.book_appointment(appointment).await?;
    Ok(created_response(&booked))
}
