//! Ingestion module
//!
//! Provides the validating [`IngestionClient`] emitter over an abstract
//! network [`Transport`].

pub mod client;

pub use client::{ClientInfo, IngestionClient, Transport, TransportError};
