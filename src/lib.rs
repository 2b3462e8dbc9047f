//! Civic Pulse
//!
//! Asynchronous enrichment of citizen-submitted incident reports. Intake
//! stores each report together with an outbox row; the outbox relay turns
//! rows into `IncidentReported` events; enrichment workers classify the
//! description and write the category and priority back onto the record.

pub mod classifier;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod intake;
pub mod messaging;
pub mod models;
pub mod outbox;
pub mod state;

pub use error::{AppError, Result};
