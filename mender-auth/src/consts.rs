use std::time::Duration;

pub use mender_auth_dbus::{
    IFACE, METHOD_FETCH_JWT_TOKEN, METHOD_GET_JWT_TOKEN, OBJ_PATH, SERVICE,
    SIGNAL_VALID_JWT_TOKEN_AVAILABLE,
};

/// Upper bound for a single method call on the authentication manager.
pub const METHOD_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound for waiting on `ValidJwtTokenAvailable`.
pub const SIGNAL_TIMEOUT: Duration = Duration::from_secs(10);

pub const SYSLOG_IDENTIFIER: &str = "mender-auth";
