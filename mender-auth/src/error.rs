use std::time::Duration;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("not connected to the authentication manager, call `connect` first")]
    NotConnected,
    #[error(transparent)]
    Transport(#[from] zbus::Error),
    #[error("`{method}` replied with an unexpected body, expected {expected}")]
    UnexpectedReply {
        method: String,
        expected: &'static str,
    },
    #[error("timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },
    #[error("signal stream for `{signal}` closed before the signal arrived")]
    SignalStreamEnded { signal: String },
    /// The manager could not schedule a token fetch.
    #[error("FetchJwtToken failed")]
    FetchTokenFailed,
    #[error("failed to build the runtime driving the dbus connection")]
    Runtime(#[source] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
