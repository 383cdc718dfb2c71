use std::time::Duration;

use mender_auth_client::{
    AuthClient, BusTransport as _, Error, Reply, ZbusTransport,
    config::BusAddress,
    consts::{
        IFACE, METHOD_GET_JWT_TOKEN, OBJ_PATH, SERVICE,
        SIGNAL_VALID_JWT_TOKEN_AVAILABLE,
    },
};
use test_log::test;

use crate::fixture::{Fixture, ManagerState, dbus_daemon_available};

fn is_method_error(err: &Error, name: &str) -> bool {
    matches!(
        err,
        Error::Transport(zbus::Error::MethodError(error_name, _, _))
            if error_name.as_str() == name
    )
}

#[test]
fn get_token_returns_current_token() {
    if !dbus_daemon_available("get_token_returns_current_token") {
        return;
    }
    let fx = Fixture::new(ManagerState {
        token: "abc123".to_owned(),
        ..Default::default()
    });

    let token = fx.client().get_token().unwrap();

    assert_eq!(token, "abc123");
    assert_eq!(fx.state().gets, 1);
}

#[test]
fn get_token_surfaces_service_failure() {
    if !dbus_daemon_available("get_token_surfaces_service_failure") {
        return;
    }
    let fx = Fixture::new(ManagerState::default());

    let err = fx.client().get_token().unwrap_err();

    assert!(is_method_error(&err, "org.freedesktop.DBus.Error.Failed"), "{err:?}");
}

#[test]
fn fetch_and_get_token_returns_announced_token() {
    if !dbus_daemon_available("fetch_and_get_token_returns_announced_token") {
        return;
    }
    let fx = Fixture::new(ManagerState {
        token: "old".to_owned(),
        next_token: Some("new".to_owned()),
        ..Default::default()
    });

    let token = fx.client().fetch_and_get_token().unwrap();

    assert_eq!(token, "new");
    let state = fx.state();
    assert_eq!(state.fetches, 1);
    assert_eq!(state.gets, 1);
}

#[test]
fn fetch_and_get_token_stops_when_fetch_is_refused() {
    if !dbus_daemon_available("fetch_and_get_token_stops_when_fetch_is_refused") {
        return;
    }
    let fx = Fixture::new(ManagerState {
        token: "old".to_owned(),
        refuse_fetch: true,
        ..Default::default()
    });

    let err = fx.client().fetch_and_get_token().unwrap_err();

    assert!(matches!(err, Error::FetchTokenFailed), "{err:?}");
    let state = fx.state();
    assert_eq!(state.fetches, 1);
    assert_eq!(state.gets, 0);
}

#[test]
fn fetch_token_reports_scheduling() {
    if !dbus_daemon_available("fetch_token_reports_scheduling") {
        return;
    }
    let fx = Fixture::new(ManagerState::default());
    let client = fx.client();

    assert!(client.fetch_token().unwrap());
    fx.state().refuse_fetch = true;
    assert!(!client.fetch_token().unwrap());
}

#[test]
fn wait_for_token_returns_on_announcement() {
    if !dbus_daemon_available("wait_for_token_returns_on_announcement") {
        return;
    }
    let mut fx = Fixture::new(ManagerState::default());
    let client = fx.client();
    fx.announce_every(Duration::from_millis(50));

    client.wait_for_token().unwrap();
}

#[test]
fn wait_for_signal_times_out_without_announcement() {
    if !dbus_daemon_available("wait_for_signal_times_out_without_announcement") {
        return;
    }
    let fx = Fixture::new(ManagerState::default());
    let transport = ZbusTransport::new(fx.bus()).unwrap();
    let connection = transport.open_bus().unwrap();
    let proxy = transport
        .proxy(&connection, SERVICE, OBJ_PATH, IFACE)
        .unwrap();
    let mut subscription = transport
        .subscribe(&proxy, SIGNAL_VALID_JWT_TOKEN_AVAILABLE)
        .unwrap();

    let timeout = Duration::from_millis(200);
    let err = transport
        .wait_for_signal(&mut subscription, timeout)
        .unwrap_err();

    assert!(
        matches!(err, Error::Timeout { after, .. } if after == timeout),
        "{err:?}"
    );
}

#[test]
fn transport_call_runs_without_ambient_runtime() {
    if !dbus_daemon_available("transport_call_runs_without_ambient_runtime") {
        return;
    }
    let fx = Fixture::new(ManagerState {
        token: "abc123".to_owned(),
        ..Default::default()
    });
    assert!(tokio::runtime::Handle::try_current().is_err());
    let transport = ZbusTransport::new(fx.bus()).unwrap();
    let connection = transport.open_bus().unwrap();
    let proxy = transport
        .proxy(&connection, SERVICE, OBJ_PATH, IFACE)
        .unwrap();

    let reply = transport
        .call(&proxy, METHOD_GET_JWT_TOKEN, Duration::from_secs(5))
        .unwrap();

    assert_eq!(reply, Reply::String("abc123".to_owned()));
}

#[test]
fn transport_call_times_out_on_slow_reply() {
    if !dbus_daemon_available("transport_call_times_out_on_slow_reply") {
        return;
    }
    let fx = Fixture::new(ManagerState {
        token: "abc123".to_owned(),
        get_delay: Some(Duration::from_secs(1)),
        ..Default::default()
    });
    let transport = ZbusTransport::new(fx.bus()).unwrap();
    let connection = transport.open_bus().unwrap();
    let proxy = transport
        .proxy(&connection, SERVICE, OBJ_PATH, IFACE)
        .unwrap();

    let timeout = Duration::from_millis(200);
    let err = transport
        .call(&proxy, METHOD_GET_JWT_TOKEN, timeout)
        .unwrap_err();

    assert!(
        matches!(err, Error::Timeout { after, .. } if after == timeout),
        "{err:?}"
    );
}

#[test]
fn missing_service_fails_on_first_call() {
    if !dbus_daemon_available("missing_service_fails_on_first_call") {
        return;
    }
    let fx = Fixture::new(ManagerState::default());
    let mut client = AuthClient::on_bus(fx.bus()).unwrap();
    client
        .connect("io.mender.NotThere", OBJ_PATH, IFACE)
        .unwrap();

    let err = client.get_token().unwrap_err();

    assert!(
        is_method_error(&err, "org.freedesktop.DBus.Error.ServiceUnknown"),
        "{err:?}"
    );
}

#[test]
fn connect_fails_on_unreachable_bus() {
    let mut client = AuthClient::on_bus(BusAddress::Address(
        "unix:path=/nonexistent/mender-auth-test-bus".to_owned(),
    ))
    .unwrap();

    let err = client.connect_default().unwrap_err();

    assert!(matches!(err, Error::Transport(_)), "{err:?}");
    assert!(!client.is_connected());
}
