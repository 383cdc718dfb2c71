//! Blocking client for the Mender authentication manager.
//!
//! The manager lives on the system bus as `io.mender.AuthenticationManager` and
//! hands out the device JWT. Start with [`AuthClient::new()`], then
//! [`AuthClient::connect_default()`].

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod consts;
pub mod telemetry;
pub mod transport;

mod error;

pub use crate::client::AuthClient;
pub use crate::error::{Error, Result};
pub use crate::transport::{BusTransport, Reply, ZbusTransport};
