use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use super::{caller, ApiError};
use crate::listing::{blank_as_none, RecordFilter};
use crate::models::{RecordForm, Role};
use crate::navigation::{authorize, Action, Page};
use crate::session::TypedSession;
use crate::store::MockStore;
use crate::utils::{created_response, listing_response};

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RecordQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub patient_id: Option<String>,
}

/// Patients only ever see their own records. Doctors see one patient's
/// records when `patientId` is given, otherwise the records they wrote.
#[tracing::instrument(
    name = "Listing medical records",
    skip(query, request, store, session),
    fields(user_id = tracing::field::Empty)
)]
pub async fn get_medical_records(
    query: web::Query<RecordQuery>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Page::MedicalRecords)?;
    let RecordQuery { search, patient_id } = query.into_inner();
    let records = match (user.role, patient_id) {
        (Role::Doctor, Some(patient_id)) => store.medical_records(&patient_id).await,
        (Role::Doctor, None) => store.records_by_doctor(&user.id).await,
        _ => store.medical_records(&user.id).await,
    };
    Ok(listing_response(&RecordFilter { search }.apply(&records)))
}

#[tracing::instrument(
    name = "Creating a medical record",
    skip(form, request, store, session),
    fields(user_id = tracing::field::Empty, patient_id = %form.patient_id)
)]
pub async fn create_medical_record(
    form: web::Json<RecordForm>,
    request: HttpRequest,
    store: web::Data<MockStore>,
    session: TypedSession,
) -> Result<HttpResponse, ApiError> {
    let user = caller(&request, &session, &store).await?;
    authorize(&user, &Action::CreateMedicalRecord)?;
    let record = store.create_medical_record(&user, form.into_inner()).await?;
    Ok(created_response(&record))
}
