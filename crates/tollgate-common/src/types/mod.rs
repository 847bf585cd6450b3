//! Core data types for Tollgate metering

pub mod event;
pub mod ingest;
pub mod usage;
