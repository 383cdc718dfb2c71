//! The bus operations [`AuthClient`](crate::AuthClient) is built on.

mod dbus;

use std::time::Duration;

use crate::{Error, Result};

pub use self::dbus::{InRuntime, SignalSubscription, ZbusTransport};

/// Body of a method reply from the authentication manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    String(String),
    Boolean(bool),
}

impl Reply {
    pub fn into_string(self, method: &str) -> Result<String> {
        match self {
            Self::String(value) => Ok(value),
            Self::Boolean(_) => Err(Error::UnexpectedReply {
                method: method.to_owned(),
                expected: "a string",
            }),
        }
    }

    pub fn into_bool(self, method: &str) -> Result<bool> {
        match self {
            Self::Boolean(value) => Ok(value),
            Self::String(_) => Err(Error::UnexpectedReply {
                method: method.to_owned(),
                expected: "a boolean",
            }),
        }
    }
}

/// Blocking access to a message bus.
///
/// Handles are opaque to the caller and owned by whoever requested them. None of
/// the operations retry.
pub trait BusTransport {
    type Connection;
    type Proxy;
    type Subscription;

    /// Opens a connection to the bus this transport is configured for.
    fn open_bus(&self) -> Result<Self::Connection>;

    /// Binds a proxy to the remote object `name`, `path`, `interface`.
    fn proxy(
        &self,
        connection: &Self::Connection,
        name: &str,
        path: &str,
        interface: &str,
    ) -> Result<Self::Proxy>;

    /// Calls the argument-less `method` and waits at most `timeout` for the reply.
    fn call(&self, proxy: &Self::Proxy, method: &str, timeout: Duration)
    -> Result<Reply>;

    /// Starts listening for `signal` emitted by the proxied object. Signals
    /// emitted after this returns are not missed by
    /// [`wait_for_signal`](Self::wait_for_signal).
    fn subscribe(&self, proxy: &Self::Proxy, signal: &str)
    -> Result<Self::Subscription>;

    /// Blocks until the next signal on `subscription`, or fails with
    /// [`Error::Timeout`] after `timeout`.
    fn wait_for_signal(
        &self,
        subscription: &mut Self::Subscription,
        timeout: Duration,
    ) -> Result<()>;
}
