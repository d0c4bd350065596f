use std::net::TcpListener;

use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use secrecy::{ExposeSecret, Secret};
use tracing_actix_web::TracingLogger;

use crate::config::Settings;
use crate::routes::{
    book_appointment, cancel_appointment, change_password, choose_date, choose_doctor,
    choose_specialty, choose_time, complete_appointment, create_medical_record, create_user,
    dashboard, delete_user, discard_availability_draft, discard_booking, edit_booking_details,
    get_appointments, get_availability, get_availability_draft, get_booking, get_consultations,
    get_contacts, get_doctor_slots, get_medical_records, get_messages, get_notifications,
    get_preferences, get_profile, get_specialties, get_specialty_doctors, get_users,
    health_check, log_out, login, me, navigation, put_availability, read_message,
    read_notification, refresh_booking_slots, register, retry_booking, save_availability_draft,
    schedule_consultation, send_message, submit_booking, toggle_availability_day,
    toggle_availability_slot, update_preferences, update_profile, update_user,
    AvailabilityDrafts, BookingDrafts,
};
use crate::store::MockStore;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, anyhow::Error> {
        let address = format!("{}:{}", config.application.host, config.application.port);
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();
        let store = MockStore::seeded(&config.mock)?;
        let server = run(listener, store, config.application.hmac_secret)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    store: MockStore,
    hmac_secret: Secret<String>,
) -> Result<Server, anyhow::Error> {
    let store = web::Data::new(store);
    let booking_drafts = web::Data::new(BookingDrafts::default());
    let availability_drafts = web::Data::new(AvailabilityDrafts::default());
    let secret_key = Key::from(hmac_secret.expose_secret().as_bytes());
    let server: Server = HttpServer::new(move || {
        App::new()
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                secret_key.clone(),
            ))
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/login", web::post().to(login))
            .route("/register", web::post().to(register))
            .route("/logout", web::post().to(log_out))
            .route("/me", web::get().to(me))
            .route("/navigation", web::get().to(navigation))
            .route("/dashboard", web::get().to(dashboard))
            .route("/specialties", web::get().to(get_specialties))
            .route(
                "/specialties/{id}/doctors",
                web::get().to(get_specialty_doctors),
            )
            .route(
                "/doctors/{id}/availability",
                web::get().to(get_doctor_slots),
            )
            .service(
                web::scope("/appointments")
                    .route("", web::get().to(get_appointments))
                    .route("", web::post().to(book_appointment))
                    .route("/{id}/cancel", web::post().to(cancel_appointment))
                    .route("/{id}/complete", web::post().to(complete_appointment)),
            )
            .route("/consultations", web::get().to(get_consultations))
            .route("/consultations", web::post().to(schedule_consultation))
            .service(
                web::scope("/booking")
                    .route("", web::get().to(get_booking))
                    .route("", web::delete().to(discard_booking))
                    .route("/specialty", web::post().to(choose_specialty))
                    .route("/doctor", web::post().to(choose_doctor))
                    .route("/date", web::post().to(choose_date))
                    .route("/time", web::post().to(choose_time))
                    .route("/details", web::post().to(edit_booking_details))
                    .route("/refresh", web::post().to(refresh_booking_slots))
                    .route("/submit", web::post().to(submit_booking))
                    .route("/retry", web::post().to(retry_booking)),
            )
            .service(
                web::scope("/availability")
                    .route("", web::get().to(get_availability))
                    .route("", web::put().to(put_availability))
                    .route("/draft", web::get().to(get_availability_draft))
                    .route("/draft", web::delete().to(discard_availability_draft))
                    .route("/draft/save", web::post().to(save_availability_draft))
                    .route(
                        "/draft/days/{day}/toggle",
                        web::post().to(toggle_availability_day),
                    )
                    .route(
                        "/draft/days/{day}/slots/{time}/toggle",
                        web::post().to(toggle_availability_slot),
                    ),
            )
            .service(
                web::scope("/messages")
                    .route("", web::get().to(get_messages))
                    .route("", web::post().to(send_message))
                    .route("/contacts", web::get().to(get_contacts))
                    .route("/{id}/read", web::post().to(read_message)),
            )
            .route("/medical-records", web::get().to(get_medical_records))
            .route("/medical-records", web::post().to(create_medical_record))
            .route("/notifications", web::get().to(get_notifications))
            .route(
                "/notifications/{id}/read",
                web::post().to(read_notification),
            )
            .service(
                web::scope("/users")
                    .route("", web::get().to(get_users))
                    .route("", web::post().to(create_user))
                    .route("/{id}", web::put().to(update_user))
                    .route("/{id}", web::delete().to(delete_user)),
            )
            .route("/profile", web::get().to(get_profile))
            .route("/profile", web::put().to(update_profile))
            .route("/settings/password", web::post().to(change_password))
            .route("/settings/preferences", web::get().to(get_preferences))
            .route("/settings/preferences", web::put().to(update_preferences))
            .app_data(store.clone())
            .app_data(booking_drafts.clone())
            .app_data(availability_drafts.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}
