use chrono::Utc;

use super::{MockStore, StoreError};
use crate::models::{
    FileKind, MedicalFile, MedicalRecord, NotificationKind, RecordForm, Role, User,
};

fn newest_first(records: &mut [MedicalRecord]) {
    records.sort_by(|a, b| b.date.cmp(&a.date));
}

impl MockStore {
    #[tracing::instrument(name = "Fetching medical records", skip(self))]
    pub async fn medical_records(&self, patient_id: &str) -> Vec<MedicalRecord> {
        self.simulate_latency().await;
        let data = self.data.read().await;
        let mut records: Vec<MedicalRecord> = data
            .records
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect();
        newest_first(&mut records);
        records
    }

    /// Records a doctor wrote, across all of their patients.
    #[tracing::instrument(name = "Fetching authored medical records", skip(self))]
    pub async fn records_by_doctor(&self, doctor_id: &str) -> Vec<MedicalRecord> {
        self.simulate_latency().await;
        let data = self.data.read().await;
        let mut records: Vec<MedicalRecord> = data
            .records
            .iter()
            .filter(|r| r.doctor_id == doctor_id)
            .cloned()
            .collect();
        newest_first(&mut records);
        records
    }

    #[tracing::instrument(
        name = "Creating medical record",
        skip(self, doctor, form),
        fields(doctor_id = %doctor.id, patient_id = %form.patient_id)
    )]
    pub async fn create_medical_record(
        &self,
        doctor: &User,
        form: RecordForm,
    ) -> Result<MedicalRecord, StoreError> {
        let title = form.title.trim().to_string();
        if title.is_empty() {
            return Err(StoreError::Validation("A record needs a title".to_string()));
        }
        if let Some(file) = form
            .files
            .iter()
            .find(|f| f.name.trim().is_empty() || f.url.trim().is_empty())
        {
            return Err(StoreError::Validation(format!(
                "Attached file `{}` needs a name and a url",
                file.name
            )));
        }
        self.simulate_latency().await;

        let mut data = self.data.write().await;
        data.user_with_role(&doctor.id, Role::Doctor)?;
        data.user_with_role(&form.patient_id, Role::Patient)?;
        let now = Utc::now();
        let files = form
            .files
            .into_iter()
            .map(|file| MedicalFile {
                id: self.next_id("f"),
                kind: FileKind::infer(file.kind, file.content_type.as_deref()),
                name: file.name.trim().to_string(),
                url: file.url,
                uploaded_at: now,
            })
            .collect();
        let record = MedicalRecord {
            id: self.next_id("mr"),
            patient_id: form.patient_id,
            doctor_id: doctor.id.clone(),
            date: now.date_naive(),
            title,
            description: form.description.trim().to_string(),
            files,
        };
        data.records.push(record.clone());
        data.notify(
            self.next_id("n"),
            &record.patient_id,
            NotificationKind::System,
            "New Medical Record",
            format!("Dr. {} added \"{}\" to your records", doctor.last_name, record.title),
            "/medical-records",
        );
        Ok(record)
    }
}
