use std::collections::HashMap;

use actix_web::{web, HttpRequest, HttpResponse};
use tokio::sync::Mutex;

use super::{caller, ApiError};
use crate::availability::AvailabilityGrid;
use crate::models::{SlotTime, User, Weekday};
use crate::navigation::{authorize, Action, Page};
use crate::session::TypedSession;
use crate::store::MockStore;
use crate::utils::data_response;

/// Unsaved edits to a doctor's weekly grid, keyed by doctor id.
#[derive(Default)]
pub struct AvailabilityDrafts(Mutex<HashMap<String, AvailabilityGrid>>);

impl AvailabilityDrafts {
    /// The current draft, starting from the saved grid.
    async fn load(&self, store: &MockStore, doctor_id: &str) -> Result<AvailabilityGrid, ApiError> {
        if let Some(grid) = self.0.lock().await.get(doctor_id) {
            return Ok(grid.clone());
        }
        let saved = store.availability(doctor_id).await?;
        Ok(self
            .0
            .lock()
            .await
            .entry(doctor_id.to_string())
            .or_insert(saved)
            .clone())
    }

    async fn edit<F>(
        &self,
        store: &MockStore,
        doctor_id: &str,
        edit: F,
    ) -> Result<AvailabilityGrid, ApiError>
    where
        F: FnOnce(&mut AvailabilityGrid) -> Result<(), ApiError>,
    {
        self.load(store, doctor_id).await?;
        let mut drafts = self.0.lock().await;
        let grid = drafts
            .entry(doctor_id.to_string())
            .or_insert_with(AvailabilityGrid::seeded);
        edit(grid)?;
        Ok(grid.clone())
    }
}

async fn editing_doctor(
    request: &HttpRequest,
    session: &TypedSession,
    store: &MockStore,
) -> Result<User, ApiError> {
    let user = caller(request, session, store).await?;
    authorize(&user, &Page::Availability)?;
    authorize(&user, &Action::EditAvailability)?;
    Ok(user)
}

fn parse_day(raw: &str) -> Result<Weekday, ApiError> {
    raw.parse().map_err(ApiError::BadRequest)
}

fn parse_slot(raw: &str) -> Result<SlotTime, ApiError> {
    raw.parse::<SlotTime>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

async fn save(
    store: &MockStore,
    doctor_id: &str,
    grid: AvailabilityGrid,
) -> Result<HttpResponse, ApiError> {
    let outside = store.save_availability(doctor_id, grid.clone()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "data": grid,
        "outsideAvailability": outside
    })))
}

#[tracing::instrument(
    name = "Viewing availability",
    skip(request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn get_availability(
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Page::Availability)?;
    let grid = store.availability(&user.id).await?;
    Ok(data_response(&grid))
}

/// Replaces the whole grid in one go.
#[tracing::instrument(
    name = "Saving availability",
    skip(grid, request, store, drafts, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn put_availability(
    grid: web::Json<AvailabilityGrid>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    drafts: web::Data<AvailabilityDrafts>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = editing_doctor(&request, &session, &store).await?;
    let response = save(&store, &user.id, grid.into_inner()).await?;
    drafts.0.lock().await.remove(&user.id);
    Ok(response)
}

#[tracing::instrument(
    name = "Viewing availability draft",
    skip(request, store, drafts, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn get_availability_draft(
    request: HttpRequest,
    store: web::Data<MockStore>,
    drafts: web::Data<AvailabilityDrafts>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = editing_doctor(&request, &session, &store).await?;
    let grid = drafts.load(&store, &user.id).await?;
    Ok(data_response(&grid))
}

#[tracing::instrument(
    name = "Toggling an availability day",
    skip(request, store, drafts, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn toggle_availability_day(
    path: web::Path<String>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    drafts: web::Data<AvailabilityDrafts>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = editing_doctor(&request, &session, &store).await?;
    let day = parse_day(&path)?;
    let grid = drafts
        .edit(&store, &user.id, |grid| {
            grid.toggle_day(day);
            Ok(())
        })
        .await?;
    Ok(data_response(&grid))
}

#[tracing::instrument(
    name = "Toggling an availability slot",
    skip(request, store, drafts, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn toggle_availability_slot(
    path: web::Path<(String, String)>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    drafts: web::Data<AvailabilityDrafts>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = editing_doctor(&request, &session, &store).await?;
    let (day, time) = path.into_inner();
    let day = parse_day(&day)?;
    let time = parse_slot(&time)?;
    let grid = drafts
        .edit(&store, &user.id, |grid| {
            grid.toggle_slot(day, time)?;
            Ok(())
        })
        .await?;
    Ok(data_response(&grid))
}

#[tracing::instrument(
    name = "Saving availability draft",
    skip(request, store, drafts, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn save_availability_draft(
    request: HttpRequest,
    store: web::Data<MockStore>,
    drafts: web::Data<AvailabilityDrafts>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = editing_doctor(&request, &session, &store).await?;
    let grid = drafts.load(&store, &user.id).await?;
    let response = save(&store, &user.id, grid).await?;
    drafts.0.lock().await.remove(&user.id);
    Ok(response)
}

#[tracing::instrument(
    name = "Discarding availability draft",
    skip(request, store, drafts, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn discard_availability_draft(
    request: HttpRequest,
    store: web::Data<MockStore>,
    drafts: web::Data<AvailabilityDrafts>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = editing_doctor(&request, &session, &store).await?;
    drafts.0.lock().await.remove(&user.id);
    Ok(HttpResponse::NoContent().finish())
}
