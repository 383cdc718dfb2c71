//! Get the current token
//! gdbus call --system -d io.mender.AuthenticationManager -o '/io/mender/AuthenticationManager' -m
//! io.mender.Authentication1.GetJwtToken
//!
//! Schedule a token refresh
//! gdbus call --system -d io.mender.AuthenticationManager -o '/io/mender/AuthenticationManager' -m
//! io.mender.Authentication1.FetchJwtToken
//!
//! Wait for the refreshed token
//! dbus-monitor --system type='signal',interface='io.mender.Authentication1',member='ValidJwtTokenAvailable'

use zbus::{SignalContext, interface, proxy};

pub const SERVICE: &str = "io.mender.AuthenticationManager";
pub const OBJ_PATH: &str = "/io/mender/AuthenticationManager";
pub const IFACE: &str = "io.mender.Authentication1";

pub const METHOD_GET_JWT_TOKEN: &str = "GetJwtToken";
pub const METHOD_FETCH_JWT_TOKEN: &str = "FetchJwtToken";
pub const SIGNAL_VALID_JWT_TOKEN_AVAILABLE: &str = "ValidJwtTokenAvailable";

/// Client side of `io.mender.Authentication1`.
#[proxy(
    interface = "io.mender.Authentication1",
    default_service = "io.mender.AuthenticationManager",
    default_path = "/io/mender/AuthenticationManager"
)]
pub trait AuthenticationManager {
    /// Returns the JWT currently held by the manager. Empty if there is none.
    fn get_jwt_token(&self) -> zbus::Result<String>;

    /// Asks the manager to fetch a new JWT. `true` only means the fetch was
    /// scheduled; the new token is announced by `ValidJwtTokenAvailable`.
    fn fetch_jwt_token(&self) -> zbus::Result<bool>;

    #[zbus(signal)]
    fn valid_jwt_token_available(&self) -> zbus::Result<()>;
}

/// Server side of `io.mender.Authentication1`.
///
/// Implementors that schedule a fetch are expected to eventually emit
/// [`Authentication::valid_jwt_token_available`] on the provided context.
pub trait AuthenticationT: Send + Sync + 'static {
    fn get_jwt_token(&self) -> zbus::fdo::Result<String>;
    fn fetch_jwt_token(
        &mut self,
        ctxt: SignalContext<'static>,
    ) -> zbus::fdo::Result<bool>;
}

#[derive(Debug, derive_more::From, derive_more::Deref, derive_more::DerefMut)]
pub struct Authentication<T>(pub T);

#[interface(name = "io.mender.Authentication1")]
impl<T: AuthenticationT> Authentication<T> {
    fn get_jwt_token(&self) -> zbus::fdo::Result<String> {
        self.0.get_jwt_token()
    }

    fn fetch_jwt_token(
        &mut self,
        #[zbus(signal_context)] ctxt: SignalContext<'_>,
    ) -> zbus::fdo::Result<bool> {
        self.0.fetch_jwt_token(ctxt.to_owned())
    }

    #[zbus(signal)]
    pub async fn valid_jwt_token_available(
        ctxt: &SignalContext<'_>,
    ) -> zbus::Result<()>;
}
