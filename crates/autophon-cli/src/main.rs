//! Autophon
//!
//! Runs the door intercom controller and a console front end. Typed
//! commands stand in for the messaging bot and, on a bench without GPIO,
//! for the push-button, handset and rotary dial.

mod console;

use std::path::PathBuf;

use anyhow::Context;
use autophon_controller::{Autophon, Devices, Settings};
use autophon_core::Config;
use autophon_door::{AnyDoorBackend, HttpDoorBackend};
use autophon_hardware::mock::{MockBell, MockInputs, MockInputsHandle};
use autophon_hardware::{AnyBell, AnyEdgeSource, InputLine};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use console::{Command, HELP};

const DEFAULT_LOG_FILTER: &str = "autophon=info,autophon_core=info,autophon_hardware=info,\
                                  autophon_door=info,autophon_controller=info";

/// Door intercom controller.
#[derive(Debug, Parser)]
#[command(name = "autophon", version, about)]
struct Args {
    /// Environment file read before the process environment.
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(version = autophon_core::VERSION, "Starting autophon");

    let config = Config::from_env(&args.env_file).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;
    info!(
        login_url = %config.backend.login_url,
        open_url = %config.backend.open_url,
        open_code = %config.codes.open_prefix(),
        cancel_code = %config.codes.cancel(),
        request_timeout = ?config.request_timeout,
        "Configuration loaded"
    );

    let (inputs, inputs_handle) = MockInputs::with_name("Console".to_string());
    let (bell, _bell_handle) = MockBell::new();
    let door = HttpDoorBackend::new(config.backend.clone());

    let mut autophon = Autophon::start(
        Settings::from(&config),
        Devices {
            inputs: AnyEdgeSource::Mock(inputs),
            bell: AnyBell::Mock(bell),
            door: AnyDoorBackend::Http(door),
        },
    );

    let result = run_console(&mut autophon, &inputs_handle).await;
    if let Err(e) = &result {
        error!("Autophon failed: {:#}", e);
    }

    autophon.shutdown().await.context("Shutdown failed")?;
    result
}

/// Read commands until `exit`, Ctrl-C, or a worker failure.
async fn run_console(autophon: &mut Autophon, inputs: &MockInputsHandle) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut console_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    println!("{HELP}");

    loop {
        tokio::select! {
            result = autophon.wait() => {
                result.context("Worker stopped")?;
                return Ok(());
            }
            signal = &mut ctrl_c => {
                signal.context("Failed to listen for Ctrl-C")?;
                info!("Received Ctrl-C, shutting down");
                return Ok(());
            }
            line = lines.next_line(), if console_open => {
                let Some(line) = line.context("Failed to read the console")? else {
                    info!("Console closed, running until Ctrl-C");
                    console_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Exit) => return Ok(()),
                    Ok(command) => execute(autophon, inputs, command).await?,
                    Err(e) => println!("{e}\n{HELP}"),
                }
            }
        }
    }
}

async fn execute(
    autophon: &Autophon,
    inputs: &MockInputsHandle,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Request => autophon.request(),
        Command::Push => inputs.press(InputLine::Pusher).await?,
        Command::Pickup => inputs.press(InputLine::Hanger).await?,
        Command::Dial(digits) => {
            let inputs = inputs.clone();
            tokio::spawn(async move {
                if let Err(e) = inputs.dial(&digits).await {
                    warn!("Dialing failed: {}", e);
                }
            });
        }
        Command::Status => {
            let status = autophon.status();
            info!(
                state = %status.arbiter.state,
                auto_armed = status.arbiter.auto_armed,
                ringing = status.ringing,
                door_attempts = status.door.attempts,
                "Status"
            );
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Exit => {}
    }
    Ok(())
}
