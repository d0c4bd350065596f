use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Copy, Clone)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Prescription,
    Report,
    Image,
    Other,
}

impl FileKind {
    /// Images are recognised from their content type, everything else
    /// keeps the declared kind and defaults to a report.
    pub fn infer(declared: Option<FileKind>, content_type: Option<&str>) -> Self {
        match content_type {
            Some(mime) if mime.to_ascii_lowercase().starts_with("image/") => FileKind::Image,
            _ => declared.unwrap_or(FileKind::Report),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MedicalFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    pub title: String,
    pub description: String,
    pub files: Vec<MedicalFile>,
}

/// A file reference attached to a new record. Nothing is uploaded.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FileForm {
    pub name: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: Option<FileKind>,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecordForm {
    pub patient_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub files: Vec<FileForm>,
}
