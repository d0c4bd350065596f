use async_trait::async_trait;
use chrono::NaiveDate;

use super::{MockStore, SchedulingApi, StoreError};
use crate::availability::AvailabilityGrid;
use crate::models::{
    Appointment, AppointmentStatus, NewAppointment, NotificationKind, Role, Specialty, TimeSlot,
    User,
};

#[async_trait]
impl SchedulingApi for MockStore {
    #[tracing::instrument(name = "Fetching specialties", skip(self))]
    async fn specialties(&self) -> Result<Vec<Specialty>, StoreError> {
        self.simulate_latency().await;
        Ok(self.data.read().await.specialties.clone())
    }

    #[tracing::instrument(name = "Fetching doctors by specialty", skip(self))]
    async fn doctors_by_specialty(&self, specialty_id: &str) -> Result<Vec<User>, StoreError> {
        self.simulate_latency().await;
        let data = self.data.read().await;
        if !data.specialties.iter().any(|s| s.id == specialty_id) {
            return Err(StoreError::NotFound(format!("Specialty {}", specialty_id)));
        }
        Ok(data
            .users_with_role(Role::Doctor)
            .filter(|doctor| doctor.specialty_id.as_deref() == Some(specialty_id))
            .cloned()
            .collect())
    }

    #[tracing::instrument(name = "Fetching doctor availability", skip(self))]
    async fn doctor_availability(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>, StoreError> {
        self.simulate_latency().await;
        let data = self.data.read().await;
        data.user_with_role(doctor_id, Role::Doctor)?;
        Ok(data.grid_for(doctor_id).slots_on(date))
    }

    #[tracing::instrument(
        name = "Booking a new appointment",
        skip(self, appointment),
        fields(
            doctor_id = %appointment.doctor_id,
            patient_id = %appointment.patient_id,
            consultation_type = %appointment.consultation_type,
        )
    )]
    async fn book_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<Appointment, StoreError> {
        self.simulate_latency().await;
        let mut data = self.data.write().await;
        data.user_with_role(&appointment.doctor_id, Role::Doctor)?;
        let patient_name = data
            .user_with_role(&appointment.patient_id, Role::Patient)?
            .full_name();
        if !data
            .grid_for(&appointment.doctor_id)
            .is_open(appointment.date, appointment.time)
        {
            return Err(StoreError::SlotUnavailable {
                doctor_id: appointment.doctor_id,
                date: appointment.date,
                time: appointment.time,
            });
        }

        let booked = Appointment {
            id: self.next_id("a"),
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            date: appointment.date,
            time: appointment.time,
            duration: appointment.duration,
            status: AppointmentStatus::Scheduled,
            consultation_type: appointment.consultation_type,
            notes: appointment.notes,
        };
        data.appointments.push(booked.clone());
        data.notify(
            self.next_id("n"),
            &booked.doctor_id,
            NotificationKind::Appointment,
            "New Appointment",
            format!(
                "{} booked a {} appointment on {} at {}",
                patient_name,
                booked.consultation_type.label(),
                booked.date,
                booked.time
            ),
            "/appointments",
        );
        tracing::info!(appointment_id = %booked.id, "Appointment booked");
        Ok(booked)
    }
}

impl MockStore {
    /// Patients and doctors see their own appointments, admins see all.
    #[tracing::instrument(name = "Fetching appointments", skip(self))]
    pub async fn appointments(
        &self,
        user_id: &str,
        role: Role,
    ) -> Result<Vec<Appointment>, StoreError> {
        self.simulate_latency().await;
        let data = self.data.read().await;
        let mut appointments: Vec<Appointment> = data
            .appointments
            .iter()
            .filter(|appointment| match role {
                Role::Patient => appointment.patient_id == user_id,
                Role::Doctor => appointment.doctor_id == user_id,
                Role::Admin => true,
            })
            .cloned()
            .collect();
        appointments.sort_by(|a, b| (a.date, a.time).cmp(&(b.date, b.time)));
        Ok(appointments)
    }

    #[tracing::instrument(
        name = "Updating appointment status",
        skip(self, actor),
        fields(user_id = %actor.id)
    )]
    pub async fn set_appointment_status(
        &self,
        actor: &User,
        appointment_id: &str,
        status: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        self.simulate_latency().await;
        let mut data = self.data.write().await;
        let appointment = data
            .appointments
            .iter_mut()
            .find(|appointment| appointment.id == appointment_id)
            .ok_or_else(|| StoreError::NotFound(format!("Appointment {}", appointment_id)))?;

        let permitted = match (actor.role, status) {
            (Role::Admin, AppointmentStatus::Cancelled) => true,
            (Role::Patient, AppointmentStatus::Cancelled) => appointment.patient_id == actor.id,
            (Role::Doctor, AppointmentStatus::Cancelled | AppointmentStatus::Completed) => {
                appointment.doctor_id == actor.id
            }
            _ => false,
        };
        if !permitted {
            return Err(StoreError::Forbidden(format!(
                "You cannot mark appointment {} as {}",
                appointment_id, status
            )));
        }
        if appointment.status != AppointmentStatus::Scheduled || status == AppointmentStatus::Scheduled
        {
            return Err(StoreError::InvalidTransition {
                from: appointment.status,
                to: status,
            });
        }
        appointment.status = status;
        Ok(appointment.clone())
    }

    /// The saved weekly grid, or the default one if the doctor never saved.
    #[tracing::instrument(name = "Fetching availability grid", skip(self))]
    pub async fn availability(&self, doctor_id: &str) -> Result<AvailabilityGrid, StoreError> {
        self.simulate_latency().await;
        let data = self.data.read().await;
        data.user_with_role(doctor_id, Role::Doctor)?;
        Ok(data.grid_for(doctor_id))
    }

    /// Replaces the whole grid at once. Returns the scheduled appointments
    /// that no longer fit; they are reported, not cancelled.
    #[tracing::instrument(name = "Saving availability grid", skip(self, grid))]
    pub async fn save_availability(
        &self,
        doctor_id: &str,
        grid: AvailabilityGrid,
    ) -> Result<Vec<Appointment>, StoreError> {
        grid.validate()?;
        self.simulate_latency().await;
        let mut data = self.data.write().await;
        data.user_with_role(doctor_id, Role::Doctor)?;
        let outside: Vec<Appointment> = data
            .appointments
            .iter()
            .filter(|appointment| {
                appointment.doctor_id == doctor_id
                    && appointment.status == AppointmentStatus::Scheduled
                    && !grid.is_open(appointment.date, appointment.time)
            })
            .cloned()
            .collect();
        if !outside.is_empty() {
            tracing::warn!(
                count = outside.len(),
                "Scheduled appointments fall outside the new availability"
            );
        }
        data.availability.insert(doctor_id.to_string(), grid);
        Ok(outside)
    }
}
