//! Session, authorization and API plumbing for the admin console.

pub mod api;
pub mod client;
pub mod config;
pub mod guard;
pub mod models;
pub mod preferences;
pub mod routes;
pub mod session;
pub mod sign_in;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
