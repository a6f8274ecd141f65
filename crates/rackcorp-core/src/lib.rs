//! # rackcorp-core
//!
//! Core types and utilities for talking to the RackCorp API.
//!
//! This crate provides the transport, the response envelope decoder and the wire
//! codecs shared by every resource client.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and conversions from transport/codec errors
//! - [`ids`] - Strongly-typed integer identifiers for RackCorp resources
//! - [`config`] - Client configuration and URL construction for both endpoints
//! - [`credential`] - API credential type and the discovery chain
//! - [`client`] - HTTP transport, debug log sink and per-call deadlines
//! - [`envelope`] - Legacy and REST response envelopes
//! - [`wire`] - Provider encoding quirks (number strings, CIDR IPs, epochs)

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod credential;
pub mod envelope;
pub mod error;
pub mod ids;
pub mod wire;

// Re-export commonly used types
pub use error::{Error, Result};
