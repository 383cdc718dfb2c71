use std::{fmt, str::FromStr};

use crate::consts::{IFACE, OBJ_PATH, SERVICE};

/// Which bus the authentication manager is reached on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BusAddress {
    #[default]
    System,
    Session,
    /// A raw dbus address such as `unix:path=/run/dbus/system_bus_socket`.
    Address(String),
}

#[derive(Debug, thiserror::Error)]
#[error("`{0}` is neither `system`, `session` nor a dbus address")]
pub struct ParseBusAddressError(String);

impl FromStr for BusAddress {
    type Err = ParseBusAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "system" => Ok(Self::System),
            "session" => Ok(Self::Session),
            address if address.contains(':') => Ok(Self::Address(address.to_owned())),
            _ => Err(ParseBusAddressError(s.to_owned())),
        }
    }
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::Session => f.write_str("session"),
            Self::Address(address) => f.write_str(address),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bus: BusAddress,
    pub service: String,
    pub object_path: String,
    pub interface: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bus: BusAddress::default(),
            service: SERVICE.to_owned(),
            object_path: OBJ_PATH.to_owned(),
            interface: IFACE.to_owned(),
        }
    }
}
