//! Shared data model for the NPS survey pipeline.
//!
//! Everything persisted or exchanged over HTTP by the backend lives here so the
//! wire shapes are defined in one place.

pub mod model;
pub mod requests;
