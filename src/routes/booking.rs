use std::collections::HashMap;

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use tokio::sync::Mutex;

use super::{caller, ApiError};
use crate::booking::{BookingError, BookingFlow, Fetch};
use crate::models::{ConsultationType, Role, SlotTime, User};
use crate::navigation::{authorize, Action};
use crate::session::TypedSession;
use crate::store::{MockStore, SchedulingApi, StoreError};
use crate::utils::data_response;

/// In-progress booking forms, one per patient.
#[derive(Default)]
pub struct BookingDrafts(Mutex<HashMap<String, BookingFlow>>);

impl BookingDrafts {
    /// The lock is only held around state transitions, never across a fetch.
    async fn run(&self, api: &dyn SchedulingApi, patient_id: &str, fetch: Fetch) {
        let (ticket, outcome) = fetch.run(api).await;
        if let Some(flow) = self.0.lock().await.get_mut(patient_id) {
            flow.apply(ticket, outcome);
        }
    }

    /// Creates the draft on first use and loads the specialty catalogue.
    async fn open(&self, api: &dyn SchedulingApi, patient_id: &str) -> Result<(), ApiError> {
        let fetch = {
            let mut drafts = self.0.lock().await;
            if drafts.contains_key(patient_id) {
                return Ok(());
            }
            let mut flow = BookingFlow::new(patient_id);
            let fetch = flow.load_specialties()?;
            drafts.insert(patient_id.to_string(), flow);
            fetch
        };
        self.run(api, patient_id, fetch).await;
        Ok(())
    }

    async fn step<F>(
        &self,
        api: &dyn SchedulingApi,
        patient_id: &str,
        action: F,
    ) -> Result<(), ApiError>
    where
        F: FnOnce(&mut BookingFlow) -> Result<Option<Fetch>, BookingError>,
    {
        self.open(api, patient_id).await?;
        let fetch = {
            let mut drafts = self.0.lock().await;
            let flow = drafts
                .entry(patient_id.to_string())
                .or_insert_with(|| BookingFlow::new(patient_id));
            action(flow)?
        };
        if let Some(fetch) = fetch {
            self.run(api, patient_id, fetch).await;
        }
        Ok(())
    }

    async fn render(&self, patient_id: &str) -> HttpResponse {
        let drafts = self.0.lock().await;
        match drafts.get(patient_id) {
            Some(flow) => data_response(&flow.view()),
            None => data_response(&BookingFlow::new(patient_id).view()),
        }
    }

    async fn discard(&self, patient_id: &str) {
        self.0.lock().await.remove(patient_id);
    }
}

/// The booking form always books for the signed-in patient. Admins book
/// through `POST /appointments`, naming the patient.
async fn booking_patient(
    request: &HttpRequest,
    session: &TypedSession,
    store: &MockStore,
) -> Result<User, ApiError> {
    let user = caller(request, session, store).await?;
    authorize(&user, &Action::BookAppointment)?;
    if user.role != Role::Patient {
        return Err(StoreError::Forbidden(
            "The booking form is only available to patients".to_string(),
        )
        .into());
    }
    Ok(user)
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SpecialtyChoice {
    #[serde(default)]
    pub specialty_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DoctorChoice {
    #[serde(default)]
    pub doctor_id: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct DateChoice {
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Deserialize, Debug)]
pub struct TimeChoice {
    pub time: SlotTime,
}

#[derive(Deserialize, Debug)]
pub struct BookingDetails {
    #[serde(rename = "type", default)]
    pub consultation_type: Option<ConsultationType>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[tracing::instrument(
    name = "Viewing booking form",
    skip(request, store, drafts, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn get_booking(
    request: HttpRequest,
    store: web::Data<MockStore>,
    drafts: web::Data<BookingDrafts>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = booking_patient(&request, &session, &store).await?;
    drafts.open(store.get_ref(), &user.id).await?;
    Ok(drafts.render(&user.id).await)
}

#[tracing::instrument(
    name = "Choosing a specialty",
    skip(choice, request, store, drafts, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn choose_specialty(
    choice: web::Json<SpecialtyChoice>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    drafts: web::Data<BookingDrafts>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = booking_patient(&request, &session, &store).await?;
    let specialty_id = choice.into_inner().specialty_id.filter(|id| !id.is_empty());
    drafts
        .step(store.get_ref(), &user.id, |flow| {
            flow.select_specialty(specialty_id)
        })
        .await?;
    Ok(drafts.render(&user.id).await)
}

#[tracing::instrument(
    name = "Choosing a doctor",
    skip(choice, request, store, drafts, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn choose_doctor(
    choice: web::Json<DoctorChoice>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    drafts: web::Data<BookingDrafts>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = booking_patient(&request, &session, &store).await?;
    let doctor_id = choice.into_inner().doctor_id.filter(|id| !id.is_empty());
    drafts
        .step(store.get_ref(), &user.id, |flow| {
            flow.select_doctor(doctor_id).map(|_| None)
        })
        .await?;
    Ok(drafts.render(&user.id).await)
}

#[tracing::instrument(
    name = "Choosing a date",
    skip(choice, request, store, drafts, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn choose_date(
    choice: web::Json<DateChoice>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    drafts: web::Data<BookingDrafts>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = booking_patient(&request, &session, &store).await?;
    let date = choice.date;
    drafts
        .step(store.get_ref(), &user.id, |flow| flow.select_date(date))
        .await?;
    Ok(drafts.render(&user.id).await)
}

#[tracing::instrument(
    name = "Choosing a time",
    skip(choice, request, store, drafts, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn choose_time(
    choice: web::Json<TimeChoice>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    drafts: web::Data<BookingDrafts>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = booking_patient(&request, &session, &store).await?;
    let time = choice.time;
    drafts
        .step(store.get_ref(), &user.id, |flow| {
            flow.select_time(time).map(|_| None)
        })
        .await?;
    Ok(drafts.render(&user.id).await)
}

#[tracing::instrument(
    name = "Editing booking details",
    skip(details, request, store, drafts, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn edit_booking_details(
    details: web::Json<BookingDetails>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    drafts: web::Data<BookingDrafts>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = booking_patient(&request, &session, &store).await?;
    let BookingDetails {
        consultation_type,
        notes,
    } = details.into_inner();
    drafts
        .step(store.get_ref(), &user.id, |flow| {
            flow.set_details(consultation_type, notes).map(|_| None)
        })
        .await?;
    Ok(drafts.render(&user.id).await)
}

#[tracing::instrument(
    name = "Refreshing time slots",
    skip(request, store, drafts, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn refresh_booking_slots(
    request: HttpRequest,
    store: web::Data<MockStore>,
    drafts: web::Data<BookingDrafts>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = booking_patient(&request, &session, &store).await?;
    drafts
        .step(store.get_ref(), &user.id, |flow| flow.refresh_slots().map(Some))
        .await?;
    Ok(drafts.render(&user.id).await)
}

#[tracing::instrument(
    name = "Submitting booking",
    skip(request, store, drafts, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn submit_booking(
    request: HttpRequest,
    store: web::Data<MockStore>,
    drafts: web::Data<BookingDrafts>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = booking_patient(&request, &session, &store).await?;
    drafts
        .step(store.get_ref(), &user.id, |flow| flow.begin_submit().map(Some))
        .await?;
    Ok(drafts.render(&user.id).await)
}

#[tracing::instrument(
    name = "Retrying booking fetch",
    skip(request, store, drafts, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn retry_booking(
    request: HttpRequest,
    store: web::Data<MockStore>,
    drafts: web::Data<BookingDrafts>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = booking_patient(&request, &session, &store).await?;
    drafts
        .step(store.get_ref(), &user.id, |flow| flow.retry().map(Some))
        .await?;
    Ok(drafts.render(&user.id).await)
}

#[tracing::instrument(
    name = "Discarding booking form",
    skip(request, store, drafts, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn discard_booking(
    request: HttpRequest,
    store: web::Data<MockStore>,
    drafts: web::Data<BookingDrafts>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = booking_patient(&request, &session, &store).await?;
    drafts.discard(&user.id).await;
    Ok(HttpResponse::NoContent().finish())
}
