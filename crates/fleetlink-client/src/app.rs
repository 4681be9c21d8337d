//! Client-side state machine.
//!
//! [`ClientState`] turns prompt lines into protocol commands and server
//! messages into text to print. It does no I/O, so the interactive loop
//! in `main` stays a thin shell around it.
//!
//! Periodic `state` broadcasts are dropped silently; the next snapshot
//! after a `status` request is printed as the status table.

use fleetlink_types::{ClientCommand, Position, ServerMessage, VehicleId};

use crate::commands::{self, UserCommand};
use crate::display;

/// What the interactive loop should do with a prompt line.
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    /// Send a command to the server.
    Send(ClientCommand),
    /// Print text locally.
    Print(String),
    /// Disconnect and exit.
    Quit,
    /// Nothing to do.
    Nothing,
}

/// State of one client connection.
#[derive(Debug, Default)]
pub struct ClientState {
    controlled: Option<VehicleId>,
    status_pending: bool,
}

impl ClientState {
    /// Fresh state before the welcome.
    pub fn new() -> Self {
        Self::default()
    }

    /// The vehicle this client controls, once selected.
    pub const fn controlled(&self) -> Option<VehicleId> {
        self.controlled
    }

    /// Interpret one prompt line.
    pub fn on_input(&mut self, line: &str) -> InputOutcome {
        match commands::parse_line(line) {
            Ok(None) if self.controlled.is_none() => InputOutcome::Send(ClientCommand::Select {
                vehicle_id: None,
            }),
            Ok(None) => InputOutcome::Nothing,
            Ok(Some(UserCommand::Help)) => InputOutcome::Print(display::render_help().to_owned()),
            Ok(Some(UserCommand::Quit)) => InputOutcome::Quit,
            Ok(Some(command)) => {
                if command == UserCommand::Status {
                    self.status_pending = true;
                }
                command
                    .to_protocol()
                    .map_or(InputOutcome::Nothing, InputOutcome::Send)
            }
            Err(e) => InputOutcome::Print(e.to_string()),
        }
    }

    /// Handle one server message, returning text to print if any.
    pub fn on_message(&mut self, message: ServerMessage) -> Option<String> {
        match message {
            ServerMessage::Welcome { vehicles, prompt } => {
                Some(display::render_welcome(&vehicles, &prompt))
            }
            ServerMessage::Selected { vehicle_id } => {
                self.controlled = Some(vehicle_id);
                Some(format!(
                    "\nYou are now controlling Vehicle {}\nType 'help' for available commands",
                    vehicle_id.into_inner()
                ))
            }
            ServerMessage::MoveAccepted { vehicle_id, x, y } => Some(format!(
                "Vehicle {} moving to {}",
                vehicle_id.into_inner(),
                Position::new(x, y)
            )),
            ServerMessage::State(snapshot) => std::mem::take(&mut self.status_pending)
                .then(|| display::render_status(&snapshot, self.controlled)),
            ServerMessage::Error { code, message } => {
                Some(format!("Error ({}): {message}", code.as_str()))
            }
        }
    }
}
