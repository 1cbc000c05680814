//! Ageshift headless host: configuration, production collaborators and the
//! HTTP control surface over the age-transition engine.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod headless;
pub mod routes;
pub mod state;
pub mod store;
pub mod wiring;
