//! # mcomm-core
//!
//! Core types and configuration for working with the MCommunity group gateway.
//!
//! This crate provides the shared error type, HTTP client settings and session
//! configuration used by the gateway client crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and transport error mapping
//! - [`config`] - Session configuration and directory layout
//! - [`client`] - HTTP client settings

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{DirectoryLayout, GatewayConfig};
pub use error::{Error, Result};
