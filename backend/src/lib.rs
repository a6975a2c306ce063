//! WhatsApp NPS survey pipeline.
//!
//! Campaigns (schedules) pick a survey and a set of employees; the dispatcher
//! sends each one a WhatsApp message with a single-use link; the response page
//! behind that link records a 0-10 score; provider webhooks keep the delivery
//! status of every message up to date.

pub mod config;
pub mod db;
pub mod delivery;
pub mod error;
pub mod job_controller;
pub mod services;
pub mod state;
pub mod tokens;
