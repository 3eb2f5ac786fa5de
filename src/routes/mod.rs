//! Router construction

pub mod api;
