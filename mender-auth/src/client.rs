use tracing::{debug, info, instrument};

use crate::{
    BusTransport, Error, Result, ZbusTransport,
    config::BusAddress,
    consts::{
        IFACE, METHOD_FETCH_JWT_TOKEN, METHOD_GET_JWT_TOKEN, METHOD_TIMEOUT,
        OBJ_PATH, SERVICE, SIGNAL_TIMEOUT, SIGNAL_VALID_JWT_TOKEN_AVAILABLE,
    },
};

/// Client for the Mender authentication manager.
///
/// Every operation blocks the calling thread. Nothing is retried: failures are
/// returned to the caller as they come out of the transport.
pub struct AuthClient<T: BusTransport = ZbusTransport> {
    session: Option<Session<T>>,
    transport: T,
}

struct Session<T: BusTransport> {
    proxy: T::Proxy,
    // Held for as long as the proxy is.
    _connection: T::Connection,
}

impl AuthClient<ZbusTransport> {
    /// Client for the manager on the system bus.
    pub fn new() -> Result<Self> {
        Self::on_bus(BusAddress::System)
    }

    pub fn on_bus(address: BusAddress) -> Result<Self> {
        ZbusTransport::new(address).map(Self::with_transport)
    }
}

impl<T: BusTransport> AuthClient<T> {
    #[must_use]
    pub fn with_transport(transport: T) -> Self {
        Self {
            session: None,
            transport,
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Opens the bus and binds to the object `name` at `path`, implementing
    /// `interface`.
    ///
    /// Any previous session is dropped first, so after a failure the client is
    /// disconnected.
    #[instrument(skip(self), err)]
    pub fn connect(&mut self, name: &str, path: &str, interface: &str) -> Result<()> {
        self.session = None;
        let connection = self.transport.open_bus()?;
        let proxy = self.transport.proxy(&connection, name, path, interface)?;
        self.session = Some(Session {
            proxy,
            _connection: connection,
        });
        info!("connected to authentication manager");

        Ok(())
    }

    /// [`connect`](Self::connect) to `io.mender.AuthenticationManager`.
    pub fn connect_default(&mut self) -> Result<()> {
        self.connect(SERVICE, OBJ_PATH, IFACE)
    }

    /// The JWT the manager currently holds.
    #[instrument(skip(self), err)]
    pub fn get_token(&self) -> Result<String> {
        let token = self
            .transport
            .call(self.proxy()?, METHOD_GET_JWT_TOKEN, METHOD_TIMEOUT)?
            .into_string(METHOD_GET_JWT_TOKEN)?;
        debug!(len = token.len(), "got token");

        Ok(token)
    }

    /// Asks the manager to fetch a new JWT. Returns whether the fetch was
    /// scheduled, not whether a new token is available yet.
    #[instrument(skip(self), err)]
    pub fn fetch_token(&self) -> Result<bool> {
        let scheduled = self
            .transport
            .call(self.proxy()?, METHOD_FETCH_JWT_TOKEN, METHOD_TIMEOUT)?
            .into_bool(METHOD_FETCH_JWT_TOKEN)?;
        debug!(scheduled, "requested token fetch");

        Ok(scheduled)
    }

    /// Blocks until `ValidJwtTokenAvailable` is emitted, for at most
    /// [`SIGNAL_TIMEOUT`].
    #[instrument(skip(self), err)]
    pub fn wait_for_token(&self) -> Result<()> {
        let mut token_ready = self.subscribe_token_ready()?;
        self.transport
            .wait_for_signal(&mut token_ready, SIGNAL_TIMEOUT)
    }

    /// Fetches a new JWT and returns it once the manager announces it.
    ///
    /// The signal subscription is set up before `FetchJwtToken` is called, so an
    /// announcement racing the fetch reply is still seen.
    #[instrument(skip(self), err)]
    pub fn fetch_and_get_token(&self) -> Result<String> {
        let mut token_ready = self.subscribe_token_ready()?;
        if !self.fetch_token()? {
            return Err(Error::FetchTokenFailed);
        }
        self.transport
            .wait_for_signal(&mut token_ready, SIGNAL_TIMEOUT)?;

        self.get_token()
    }

    fn proxy(&self) -> Result<&T::Proxy> {
        self.session
            .as_ref()
            .map(|session| &session.proxy)
            .ok_or(Error::NotConnected)
    }

    fn subscribe_token_ready(&self) -> Result<T::Subscription> {
        self.transport
            .subscribe(self.proxy()?, SIGNAL_VALID_JWT_TOKEN_AVAILABLE)
    }
}
