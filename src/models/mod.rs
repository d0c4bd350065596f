pub mod appointments;
pub mod message;
pub mod notification;
pub mod preferences;
pub mod records;
pub mod schedule;
pub mod specialty;
pub mod user;

pub use appointments::{
    Appointment, AppointmentForm, AppointmentStatus, ConsultationType, NewAppointment,
};
pub use message::{Message, MessageForm, NewMessage};
pub use notification::{Notification, NotificationKind};
pub use preferences::{
    Language, NotificationPreferences, Preferences, PrivacyPreferences, ProfileVisibility,
};
pub use records::{FileForm, FileKind, MedicalFile, MedicalRecord, RecordForm};
pub use schedule::{SlotTime, TimeSlot, Weekday};
pub use specialty::Specialty;
pub use user::{
    Login, LoginResponse, PasswordChange, ProfileUpdate, Register, Role, User, UserUpdate,
};
