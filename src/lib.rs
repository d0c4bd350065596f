pub mod auth;
pub mod availability;
pub mod booking;
pub mod config;
pub mod listing;
pub mod models;
pub mod navigation;
pub mod routes;
pub mod session;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod utils;
