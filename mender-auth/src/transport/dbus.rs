use std::{
    ops::{Deref, DerefMut},
    time::Duration,
};

use futures::{StreamExt as _, stream::BoxStream};
use mender_auth_dbus::AuthenticationManagerProxy;
use tokio::runtime::{self, Handle, Runtime};
use tracing::{debug, instrument};
use zbus::CacheProperties;

use super::{BusTransport, Reply};
use crate::{Error, Result, config::BusAddress, consts::METHOD_TIMEOUT};

/// [`BusTransport`] backed by zbus.
///
/// zbus is async only, so the transport owns a current-thread tokio runtime and
/// blocks on it for every operation. Do not use it from within an async context.
#[derive(Debug)]
pub struct ZbusTransport {
    address: BusAddress,
    runtime: Runtime,
}

impl ZbusTransport {
    pub fn new(address: BusAddress) -> Result<Self> {
        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Error::Runtime)?;

        Ok(Self { address, runtime })
    }

    fn bind<T>(&self, value: T) -> InRuntime<T> {
        InRuntime {
            value: Some(value),
            handle: self.runtime.handle().clone(),
        }
    }
}

impl BusTransport for ZbusTransport {
    type Connection = InRuntime<zbus::Connection>;
    type Proxy = InRuntime<AuthenticationManagerProxy<'static>>;
    type Subscription = InRuntime<SignalSubscription>;

    #[instrument(skip(self), fields(bus = %self.address), err)]
    fn open_bus(&self) -> Result<Self::Connection> {
        let connection = self.runtime.block_on(async {
            match &self.address {
                BusAddress::System => zbus::Connection::system().await,
                BusAddress::Session => zbus::Connection::session().await,
                BusAddress::Address(address) => {
                    zbus::ConnectionBuilder::address(address.as_str())?
                        .build()
                        .await
                }
            }
        })?;
        debug!(unique_name = ?connection.unique_name(), "connected to bus");

        Ok(self.bind(connection))
    }

    #[instrument(skip(self, connection), err)]
    fn proxy(
        &self,
        connection: &Self::Connection,
        name: &str,
        path: &str,
        interface: &str,
    ) -> Result<Self::Proxy> {
        let proxy = self.runtime.block_on(async {
            AuthenticationManagerProxy::builder(connection)
                .destination(name.to_owned())?
                .path(path.to_owned())?
                .interface(interface.to_owned())?
                .cache_properties(CacheProperties::No)
                .build()
                .await
        })?;

        Ok(self.bind(proxy))
    }

    #[instrument(skip(self, proxy), err)]
    fn call(
        &self,
        proxy: &Self::Proxy,
        method: &str,
        timeout: Duration,
    ) -> Result<Reply> {
        // The timer has to be created inside the runtime.
        let reply = self
            .runtime
            .block_on(async {
                tokio::time::timeout(timeout, proxy.inner().call_method(method, &()))
                    .await
            })
            .map_err(|_elapsed| Error::Timeout {
                what: format!("reply to `{method}`"),
                after: timeout,
            })??;

        let body = reply.body();
        if let Ok(value) = body.deserialize::<String>() {
            return Ok(Reply::String(value));
        }
        if let Ok(value) = body.deserialize::<bool>() {
            return Ok(Reply::Boolean(value));
        }

        Err(Error::UnexpectedReply {
            method: method.to_owned(),
            expected: "a string or a boolean",
        })
    }

    #[instrument(skip(self, proxy), err)]
    fn subscribe(
        &self,
        proxy: &Self::Proxy,
        signal: &str,
    ) -> Result<Self::Subscription> {
        let stream = self
            .runtime
            .block_on(async {
                tokio::time::timeout(
                    METHOD_TIMEOUT,
                    proxy.inner().receive_signal(signal.to_owned()),
                )
                .await
            })
            .map_err(|_elapsed| Error::Timeout {
                what: format!("subscription to `{signal}`"),
                after: METHOD_TIMEOUT,
            })??;

        Ok(self.bind(SignalSubscription {
            signal: signal.to_owned(),
            stream: stream.boxed(),
        }))
    }

    #[instrument(skip_all, fields(signal = %subscription.signal, ?timeout), err)]
    fn wait_for_signal(
        &self,
        subscription: &mut Self::Subscription,
        timeout: Duration,
    ) -> Result<()> {
        let SignalSubscription { signal, stream } = &mut **subscription;
        match self
            .runtime
            .block_on(async { tokio::time::timeout(timeout, stream.next()).await })
        {
            Ok(Some(_msg)) => {
                debug!("received signal");
                Ok(())
            }
            Ok(None) => Err(Error::SignalStreamEnded {
                signal: signal.clone(),
            }),
            Err(_elapsed) => Err(Error::Timeout {
                what: format!("signal `{signal}`"),
                after: timeout,
            }),
        }
    }
}

/// Messages of one signal, in arrival order.
pub struct SignalSubscription {
    signal: String,
    stream: BoxStream<'static, zbus::Message>,
}

impl std::fmt::Debug for SignalSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalSubscription")
            .field("signal", &self.signal)
            .finish_non_exhaustive()
    }
}

/// A zbus handle tied to the runtime of the [`ZbusTransport`] that created it.
///
/// zbus spawns cleanup work (for example removing match rules) when handles are
/// dropped, which requires a tokio context. The handle is dropped with the
/// runtime entered.
#[derive(Debug)]
pub struct InRuntime<T> {
    // Only `None` while dropping.
    value: Option<T>,
    handle: Handle,
}

impl<T> Deref for InRuntime<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value.as_ref().expect("value is only taken on drop")
    }
}

impl<T> DerefMut for InRuntime<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.value.as_mut().expect("value is only taken on drop")
    }
}

impl<T> Drop for InRuntime<T> {
    fn drop(&mut self) {
        let _guard = self.handle.enter();
        drop(self.value.take());
    }
}
