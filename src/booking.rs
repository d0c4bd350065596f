//! Cascading specialty -> doctor -> date -> time selection.
//!
//! `BookingFlow` is a plain state machine: selections return the fetch the
//! caller has to run, and the caller hands the outcome back through
//! [`BookingFlow::apply`]. Every fetch carries a [`FetchTicket`]; once a newer
//! request for the same stage (or for an upstream stage) has been issued, the
//! old ticket no longer matches and its outcome is dropped. The last request
//! issued wins, whatever order the responses arrive in. Tickets also carry
//! the epoch of the flow that issued them, so a discarded form's responses
//! never land in its replacement.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::appointments::DEFAULT_DURATION_MINUTES;
use crate::models::{
    Appointment, ConsultationType, NewAppointment, SlotTime, Specialty, TimeSlot, User,
};
use crate::store::{SchedulingApi, StoreError};

static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Serialize, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Specialties,
    Doctors,
    Slots,
    Booking,
}

impl Stage {
    const ALL: [Stage; 4] = [Stage::Specialties, Stage::Doctors, Stage::Slots, Stage::Booking];

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Specialties => "specialties",
            Stage::Doctors => "doctors",
            Stage::Slots => "time slots",
            Stage::Booking => "booking",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Default)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Idle,
    SpecialtySelected,
    DoctorSelected,
    SlotsLoaded,
    Submitting,
    Booked {
        appointment: Appointment,
    },
    Failed {
        stage: Stage,
        message: String,
    },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BookingError {
    #[error("A booking is already being submitted")]
    Busy,
    #[error("Specialty {0} is not in the list")]
    UnknownSpecialty(String),
    #[error("Doctor {0} is not available for the selected specialty")]
    UnknownDoctor(String),
    #[error("Choose a doctor first")]
    NoDoctor,
    #[error("{0} is not an available time slot")]
    SlotUnavailable(SlotTime),
    #[error("Choose a {0} before submitting")]
    Incomplete(&'static str),
    #[error("There is no failed request to retry")]
    NothingToRetry,
}

/// Identifies one issued fetch. Only the latest ticket of a stage is honoured.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct FetchTicket {
    pub stage: Stage,
    epoch: u64,
    generation: u64,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum FetchRequest {
    Specialties,
    Doctors { specialty_id: String },
    Slots { doctor_id: String, date: NaiveDate },
    Booking(NewAppointment),
}

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Specialties(Vec<Specialty>),
    Doctors(Vec<User>),
    Slots(Vec<TimeSlot>),
    Booked(Appointment),
}

impl FetchOutcome {
    fn stage(&self) -> Stage {
        match self {
            FetchOutcome::Specialties(_) => Stage::Specialties,
            FetchOutcome::Doctors(_) => Stage::Doctors,
            FetchOutcome::Slots(_) => Stage::Slots,
            FetchOutcome::Booked(_) => Stage::Booking,
        }
    }
}

/// A fetch the flow wants performed.
#[derive(Debug, Clone)]
pub struct Fetch {
    pub ticket: FetchTicket,
    pub request: FetchRequest,
}

impl Fetch {
    /// Runs the request against the scheduling service. Holds no reference
    /// to the flow, so callers can release their lock while it is in flight.
    #[tracing::instrument(name = "Running booking fetch", skip(self, api), fields(stage = %self.ticket.stage))]
    pub async fn run(
        self,
        api: &dyn SchedulingApi,
    ) -> (FetchTicket, Result<FetchOutcome, StoreError>) {
        let outcome = match self.request {
            FetchRequest::Specialties => api.specialties().await.map(FetchOutcome::Specialties),
            FetchRequest::Doctors { specialty_id } => api
                .doctors_by_specialty(&specialty_id)
                .await
                .map(FetchOutcome::Doctors),
            FetchRequest::Slots { doctor_id, date } => api
                .doctor_availability(&doctor_id, date)
                .await
                .map(FetchOutcome::Slots),
            FetchRequest::Booking(appointment) => api
                .book_appointment(appointment)
                .await
                .map(FetchOutcome::Booked),
        };
        if let Err(e) = &outcome {
            tracing::error!(error.cause_chain = ?e, error.message = %e, "Booking fetch failed");
        }
        (self.ticket, outcome)
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Applied {
    Applied,
    Stale,
}

#[derive(Debug, Default, Clone, Copy)]
struct StageCounter {
    generation: u64,
    pending: bool,
}

#[derive(Debug, Clone)]
pub struct BookingFlow {
    epoch: u64,
    patient_id: String,
    specialties: Vec<Specialty>,
    specialty: Option<String>,
    doctors: Vec<User>,
    doctor: Option<String>,
    date: Option<NaiveDate>,
    slots: Vec<TimeSlot>,
    time: Option<SlotTime>,
    consultation_type: ConsultationType,
    notes: Option<String>,
    phase: Phase,
    counters: [StageCounter; 4],
}

impl BookingFlow {
    pub fn new(patient_id: impl Into<String>) -> Self {
        Self {
            epoch: NEXT_EPOCH.fetch_add(1, Ordering::Relaxed),
            patient_id: patient_id.into(),
            specialties: Vec::new(),
            specialty: None,
            doctors: Vec::new(),
            doctor: None,
            date: None,
            slots: Vec::new(),
            time: None,
            consultation_type: ConsultationType::default(),
            notes: None,
            phase: Phase::Idle,
            counters: [StageCounter::default(); 4],
        }
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn doctors(&self) -> &[User] {
        &self.doctors
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn selected_time(&self) -> Option<SlotTime> {
        self.time
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn selected_doctor(&self) -> Option<&str> {
        self.doctor.as_deref()
    }

    pub fn is_pending(&self, stage: Stage) -> bool {
        self.counters[stage.index()].pending
    }

    pub fn doctor_selectable(&self) -> bool {
        self.specialty.is_some() && !self.doctors.is_empty()
    }

    pub fn date_selectable(&self) -> bool {
        self.doctor.is_some()
    }

    pub fn can_submit(&self) -> bool {
        self.phase != Phase::Submitting
            && self.doctor.is_some()
            && self.date.is_some()
            && self.time.is_some()
    }

    fn ensure_not_submitting(&self) -> Result<(), BookingError> {
        if self.phase == Phase::Submitting {
            return Err(BookingError::Busy);
        }
        Ok(())
    }

    /// Drops every outstanding ticket from `stage` downstream.
    fn invalidate_from(&mut self, stage: Stage) {
        for later in Stage::ALL.iter().filter(|s| **s >= stage) {
            let counter = &mut self.counters[later.index()];
            counter.generation += 1;
            counter.pending = false;
        }
    }

    fn issue(&mut self, request: FetchRequest) -> Fetch {
        let stage = match &request {
            FetchRequest::Specialties => Stage::Specialties,
            FetchRequest::Doctors { .. } => Stage::Doctors,
            FetchRequest::Slots { .. } => Stage::Slots,
            FetchRequest::Booking(_) => Stage::Booking,
        };
        self.invalidate_from(stage);
        let counter = &mut self.counters[stage.index()];
        counter.pending = true;
        Fetch {
            ticket: FetchTicket {
                stage,
                epoch: self.epoch,
                generation: counter.generation,
            },
            request,
        }
    }

    /// The resting phase implied by the current selections.
    fn settled_phase(&self) -> Phase {
        match (&self.specialty, &self.doctor, self.date) {
            (None, _, _) => Phase::Idle,
            (Some(_), None, _) => Phase::SpecialtySelected,
            (Some(_), Some(_), Some(_)) if !self.slots.is_empty() => Phase::SlotsLoaded,
            (Some(_), Some(_), _) => Phase::DoctorSelected,
        }
    }

    /// Moves to the resting phase, unless a submission, its result or a
    /// failure is on show. Those only change on a new selection or a retry.
    fn settle(&mut self) {
        if !matches!(
            self.phase,
            Phase::Submitting | Phase::Booked { .. } | Phase::Failed { .. }
        ) {
            self.phase = self.settled_phase();
        }
    }

    fn clear_doctor(&mut self) {
        self.doctor = None;
        self.clear_date();
    }

    fn clear_date(&mut self) {
        self.date = None;
        self.slots.clear();
        self.time = None;
    }

    pub fn load_specialties(&mut self) -> Result<Fetch, BookingError> {
        self.ensure_not_submitting()?;
        Ok(self.issue(FetchRequest::Specialties))
    }

    /// `None` empties the doctor list and returns to `Idle` without a fetch.
    pub fn select_specialty(
        &mut self,
        specialty_id: Option<String>,
    ) -> Result<Option<Fetch>, BookingError> {
        self.ensure_not_submitting()?;
        let specialty_id = match specialty_id {
            Some(id) => id,
            None => {
                self.specialty = None;
                self.doctors.clear();
                self.clear_doctor();
                self.invalidate_from(Stage::Doctors);
                self.phase = Phase::Idle;
                return Ok(None);
            }
        };
        if !self.specialties.iter().any(|s| s.id == specialty_id) {
            return Err(BookingError::UnknownSpecialty(specialty_id));
        }
        self.specialty = Some(specialty_id.clone());
        self.doctors.clear();
        self.clear_doctor();
        self.phase = Phase::SpecialtySelected;
        Ok(Some(self.issue(FetchRequest::Doctors { specialty_id })))
    }

    pub fn select_doctor(&mut self, doctor_id: Option<String>) -> Result<(), BookingError> {
        self.ensure_not_submitting()?;
        if let Some(id) = &doctor_id {
            if !self.doctors.iter().any(|d| &d.id == id) {
                return Err(BookingError::UnknownDoctor(id.clone()));
            }
        }
        self.clear_date();
        self.invalidate_from(Stage::Slots);
        self.doctor = doctor_id;
        self.phase = self.settled_phase();
        Ok(())
    }

    /// Clears the time. With a doctor and a date set, returns the slots fetch.
    pub fn select_date(&mut self, date: Option<NaiveDate>) -> Result<Option<Fetch>, BookingError> {
        self.ensure_not_submitting()?;
        let doctor_id = self.doctor.clone().ok_or(BookingError::NoDoctor)?;
        self.clear_date();
        self.invalidate_from(Stage::Slots);
        self.date = date;
        self.phase = self.settled_phase();
        Ok(date.map(|date| self.issue(FetchRequest::Slots { doctor_id, date })))
    }

    /// Re-fetches slots for the current doctor and date. The selected time
    /// survives only if it is still offered.
    pub fn refresh_slots(&mut self) -> Result<Fetch, BookingError> {
        self.ensure_not_submitting()?;
        let doctor_id = self.doctor.clone().ok_or(BookingError::NoDoctor)?;
        let date = self.date.ok_or(BookingError::Incomplete("date"))?;
        if matches!(self.phase, Phase::Failed { .. }) {
            self.phase = self.settled_phase();
        }
        Ok(self.issue(FetchRequest::Slots { doctor_id, date }))
    }

    pub fn select_time(&mut self, time: SlotTime) -> Result<(), BookingError> {
        self.ensure_not_submitting()?;
        if !self.slots.iter().any(|s| s.time == time && s.available) {
            return Err(BookingError::SlotUnavailable(time));
        }
        self.time = Some(time);
        Ok(())
    }

    pub fn set_details(
        &mut self,
        consultation_type: Option<ConsultationType>,
        notes: Option<String>,
    ) -> Result<(), BookingError> {
        self.ensure_not_submitting()?;
        if let Some(consultation_type) = consultation_type {
            self.consultation_type = consultation_type;
        }
        if let Some(notes) = notes {
            let notes = notes.trim();
            self.notes = (!notes.is_empty()).then(|| notes.to_string());
        }
        Ok(())
    }

    pub fn begin_submit(&mut self) -> Result<Fetch, BookingError> {
        self.ensure_not_submitting()?;
        let doctor_id = self.doctor.clone().ok_or(BookingError::Incomplete("doctor"))?;
        let date = self.date.ok_or(BookingError::Incomplete("date"))?;
        let time = self.time.ok_or(BookingError::Incomplete("time"))?;
        let appointment = NewAppointment {
            patient_id: self.patient_id.clone(),
            doctor_id,
            date,
            time,
            duration: DEFAULT_DURATION_MINUTES,
            consultation_type: self.consultation_type,
            notes: self.notes.clone(),
        };
        // Lookups still in flight would move the phase off `Submitting`.
        self.invalidate_from(Stage::Doctors);
        self.phase = Phase::Submitting;
        Ok(self.issue(FetchRequest::Booking(appointment)))
    }

    /// Re-issues whatever failed last.
    pub fn retry(&mut self) -> Result<Fetch, BookingError> {
        let stage = match &self.phase {
            Phase::Failed { stage, .. } => *stage,
            _ => return Err(BookingError::NothingToRetry),
        };
        self.phase = self.settled_phase();
        match stage {
            Stage::Specialties => self.load_specialties(),
            Stage::Doctors => {
                let specialty_id = self.specialty.clone().ok_or(BookingError::NothingToRetry)?;
                Ok(self.issue(FetchRequest::Doctors { specialty_id }))
            }
            Stage::Slots => self.refresh_slots(),
            Stage::Booking => self.begin_submit(),
        }
    }

    fn reset_form(&mut self) {
        self.specialty = None;
        self.doctors.clear();
        self.clear_doctor();
        self.consultation_type = ConsultationType::default();
        self.notes = None;
        self.invalidate_from(Stage::Doctors);
    }

    /// Feeds a fetch result back. Outcomes for superseded tickets are
    /// discarded and leave the flow untouched.
    pub fn apply(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<FetchOutcome, StoreError>,
    ) -> Applied {
        let counter = self.counters[ticket.stage.index()];
        if ticket.epoch != self.epoch
            || counter.generation != ticket.generation
            || !counter.pending
        {
            tracing::debug!(stage = %ticket.stage, "Discarding a superseded response");
            return Applied::Stale;
        }
        if let Ok(result) = &outcome {
            if result.stage() != ticket.stage {
                tracing::error!(
                    stage = %ticket.stage,
                    "Response does not match the request it was issued for"
                );
                return Applied::Stale;
            }
        }
        self.counters[ticket.stage.index()].pending = false;

        match outcome {
            Ok(FetchOutcome::Specialties(specialties)) => {
                self.specialties = specialties;
                self.settle();
            }
            Ok(FetchOutcome::Doctors(doctors)) => {
                self.doctors = doctors;
                self.settle();
            }
            Ok(FetchOutcome::Slots(slots)) => {
                let still_open = self
                    .time
                    .map_or(false, |t| slots.iter().any(|s| s.time == t && s.available));
                if !still_open {
                    self.time = None;
                }
                self.slots = slots;
                self.settle();
            }
            Ok(FetchOutcome::Booked(appointment)) => {
                tracing::info!(appointment_id = %appointment.id, "Booking completed");
                self.reset_form();
                self.phase = Phase::Booked { appointment };
            }
            Err(e) => self.fail(ticket.stage, e.to_string()),
        }
        Applied::Applied
    }

    fn fail(&mut self, stage: Stage, message: String) {
        tracing::warn!(%stage, %message, "Booking fetch failed");
        match stage {
            Stage::Specialties => {
                self.specialties.clear();
                self.specialty = None;
                self.doctors.clear();
                self.clear_doctor();
                self.invalidate_from(Stage::Doctors);
            }
            Stage::Doctors => {
                self.doctors.clear();
                self.clear_doctor();
                self.invalidate_from(Stage::Slots);
            }
            Stage::Slots => {
                self.slots.clear();
                self.time = None;
            }
            Stage::Booking => {}
        }
        self.phase = Phase::Failed { stage, message };
    }

    pub fn view(&self) -> BookingView<'_> {
        BookingView {
            phase: &self.phase,
            specialties: &self.specialties,
            specialty_id: self.specialty.as_deref(),
            doctors: &self.doctors,
            doctor_id: self.doctor.as_deref(),
            date: self.date,
            slots: &self.slots,
            time: self.time,
            consultation_type: self.consultation_type,
            notes: self.notes.as_deref(),
            loading: Stage::ALL
                .into_iter()
                .filter(|stage| self.is_pending(*stage))
                .collect(),
            doctor_selectable: self.doctor_selectable(),
            date_selectable: self.date_selectable(),
            can_submit: self.can_submit(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView<'a> {
    pub phase: &'a Phase,
    pub specialties: &'a [Specialty],
    pub specialty_id: Option<&'a str>,
    pub doctors: &'a [User],
    pub doctor_id: Option<&'a str>,
    pub date: Option<NaiveDate>,
    pub slots: &'a [TimeSlot],
    pub time: Option<SlotTime>,
    #[serde(rename = "type")]
    pub consultation_type: ConsultationType,
    pub notes: Option<&'a str>,
    pub loading: Vec<Stage>,
    pub doctor_selectable: bool,
    pub date_selectable: bool,
    pub can_submit: bool,
}
