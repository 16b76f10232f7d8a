#![doc = "The `checklistd` library crate."]
#![doc = ""]
#![doc = "Domain models, authentication, persistence, ordering rules, routing and error"]
#![doc = "handling for the checklist service. The binary (`main.rs`) only reads the"]
#![doc = "configuration, picks a store and assembles the `HttpServer`."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod ordering;
pub mod routes;
pub mod store;

pub use crate::config::Config;
pub use crate::error::AppError;
pub use crate::store::{MemoryStore, PgStore, Store};
