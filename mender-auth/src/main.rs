use clap::{
    Parser, Subcommand,
    builder::{Styles, styling::AnsiColor},
};
use color_eyre::eyre::{self, WrapErr as _};
use mender_auth_client::{
    AuthClient,
    config::{BusAddress, Settings},
    consts::{IFACE, OBJ_PATH, SERVICE, SYSLOG_IDENTIFIER},
    telemetry::TelemetryConfig,
};
use tracing::{debug, error};

/// Talk to the Mender authentication manager.
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    styles = clap_v3_styles(),
)]
struct Cli {
    /// `system`, `session` or a dbus address.
    #[arg(long, env = "MENDER_AUTH_BUS", default_value = "system")]
    bus: BusAddress,
    #[arg(long, env = "MENDER_AUTH_SERVICE", default_value = SERVICE)]
    service: String,
    #[arg(long, env = "MENDER_AUTH_PATH", default_value = OBJ_PATH)]
    object_path: String,
    #[arg(long, env = "MENDER_AUTH_INTERFACE", default_value = IFACE)]
    interface: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the token the manager currently holds.
    Get,
    /// Ask the manager to fetch a new token and print whether it was scheduled.
    Fetch,
    /// Wait until the manager announces a valid token.
    Wait,
    /// Fetch a new token, wait for it and print it.
    FetchAndGet,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            bus: self.bus.clone(),
            service: self.service.clone(),
            object_path: self.object_path.clone(),
            interface: self.interface.clone(),
        }
    }
}

fn clap_v3_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default())
        .usage(AnsiColor::Green.on_default())
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let telemetry = TelemetryConfig::new()
        .with_journald(SYSLOG_IDENTIFIER)
        .init();

    let cli = Cli::parse();
    let result = run(&cli);
    if let Err(err) = &result {
        error!("{err:?}");
    }
    telemetry.flush_blocking();

    result
}

fn run(cli: &Cli) -> eyre::Result<()> {
    let settings = cli.settings();
    debug!(?settings, "connecting to authentication manager");

    let mut client = AuthClient::on_bus(settings.bus.clone())?;
    client
        .connect(&settings.service, &settings.object_path, &settings.interface)
        .wrap_err_with(|| {
            format!(
                "failed to connect to `{}` on the {} bus",
                settings.service, settings.bus
            )
        })?;

    match cli.command {
        Command::Get => {
            let token = client.get_token().wrap_err("failed to get token")?;
            println!("{token}");
        }
        Command::Fetch => {
            let scheduled = client.fetch_token().wrap_err("failed to fetch token")?;
            println!("{scheduled}");
        }
        Command::Wait => {
            client
                .wait_for_token()
                .wrap_err("no valid token was announced")?;
        }
        Command::FetchAndGet => {
            let token = client
                .fetch_and_get_token()
                .wrap_err("failed to fetch and get token")?;
            println!("{token}");
        }
    }

    Ok(())
}
