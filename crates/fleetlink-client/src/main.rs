//! Interactive controller for the Fleetlink simulation.
//!
//! Connects to the session server, lets the user pick a vehicle and
//! drive it around with line commands, and prints the fleet status on
//! request.
//!
//! # Startup Sequence
//!
//! 1. Initialize logging (warnings only unless `RUST_LOG` says otherwise)
//! 2. Load configuration from the environment
//! 3. Ask for the server address if none is configured
//! 4. Connect and run the command loop until quit or disconnect

mod app;
mod commands;
mod config;
mod connection;
mod display;
mod error;

use std::io::Write;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::net::TcpStream;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::app::{ClientState, InputOutcome};
use crate::config::{ClientConfig, DEFAULT_SERVER};
use crate::error::ClientError;

/// Application entry point for the client.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the connection fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize logging. Stdout belongs to the prompt, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load configuration.
    let config = ClientConfig::from_env()?;
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    // 3. Resolve the server address.
    let host = match config.server {
        Some(host) => host,
        None => prompt_for_server(&mut stdin).await?,
    };

    // 4. Connect and run.
    let stream = TcpStream::connect((host.as_str(), config.port)).await?;
    println!("Connected to server at {host}:{}", config.port);
    run(stream, &mut stdin).await?;
    println!("Disconnected from server");

    Ok(())
}

/// Ask for the server host, falling back to [`DEFAULT_SERVER`] on a
/// blank answer or closed stdin.
async fn prompt_for_server(stdin: &mut Lines<BufReader<Stdin>>) -> Result<String, ClientError> {
    print!("Server address [{DEFAULT_SERVER}]: ");
    flush_stdout();
    let answer = stdin.next_line().await?.unwrap_or_default();
    let answer = answer.trim();
    Ok(if answer.is_empty() {
        DEFAULT_SERVER.to_owned()
    } else {
        answer.to_owned()
    })
}

/// Command loop: forward prompt lines to the server and print what it
/// sends back, until the user quits or either side closes.
async fn run(stream: TcpStream, stdin: &mut Lines<BufReader<Stdin>>) -> Result<(), ClientError> {
    let (reader, mut writer) = stream.into_split();
    let mut incoming = connection::spawn_reader(reader);
    let mut state = ClientState::new();

    loop {
        tokio::select! {
            message = incoming.recv() => {
                let Some(message) = message else {
                    debug!("Server closed the connection");
                    break;
                };
                match message {
                    Ok(message) => {
                        if let Some(text) = state.on_message(message) {
                            println!("{text}");
                            prompt(&state);
                        }
                    }
                    Err(e) => warn!(error = %e, "Ignoring undecodable server message"),
                }
            }
            line = stdin.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match state.on_input(&line) {
                    InputOutcome::Send(command) => {
                        connection::send_command(&mut writer, &command).await?;
                    }
                    InputOutcome::Print(text) => {
                        println!("{text}");
                        prompt(&state);
                    }
                    InputOutcome::Quit => break,
                    InputOutcome::Nothing => prompt(&state),
                }
            }
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!(error = %e, "Shutdown after session end failed");
    }
    Ok(())
}

/// Print the input prompt, or the selection hint before a vehicle is held.
fn prompt(state: &ClientState) {
    if state.controlled().is_some() {
        print!("> ");
    } else {
        print!("Enter a vehicle id (or press Enter for the first free one): ");
    }
    flush_stdout();
}

fn flush_stdout() {
    if let Err(e) = std::io::stdout().flush() {
        debug!(error = %e, "Failed to flush stdout");
    }
}
