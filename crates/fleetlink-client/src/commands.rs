//! Line commands typed at the client prompt.
//!
//! ```text
//! move x y            move the controlled vehicle
//! status | s          print the status table
//! refresh | r         same as status
//! select [id] | <id>  take control of a vehicle (lowest free without an id)
//! help | h | ?        list commands
//! exit | quit | q     disconnect
//! ```

use fleetlink_types::{ClientCommand, VehicleId};

/// A parsed prompt command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserCommand {
    /// Take control of a vehicle.
    Select(Option<VehicleId>),
    /// Move the controlled vehicle.
    Move {
        /// Target horizontal coordinate.
        x: f64,
        /// Target vertical coordinate.
        y: f64,
    },
    /// Show the status table.
    Status,
    /// Show the command list.
    Help,
    /// Disconnect.
    Quit,
}

impl UserCommand {
    /// The protocol command to send, if this command involves the server.
    pub const fn to_protocol(self) -> Option<ClientCommand> {
        match self {
            Self::Select(vehicle_id) => Some(ClientCommand::Select { vehicle_id }),
            Self::Move { x, y } => Some(ClientCommand::Move { x, y }),
            Self::Status => Some(ClientCommand::Status),
            Self::Help | Self::Quit => None,
        }
    }
}

/// Why a prompt line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The first word is not a command.
    #[error("unknown command '{0}', type 'help' for available commands")]
    Unknown(String),

    /// Wrong number of arguments.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// An argument is not a valid number.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
}

/// Parse one prompt line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<UserCommand>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();
    let keyword = first.to_ascii_lowercase();

    let command = match (keyword.as_str(), args.as_slice()) {
        ("move", [x, y]) => UserCommand::Move {
            x: parse_coordinate(x)?,
            y: parse_coordinate(y)?,
        },
        ("move", _) => return Err(CommandError::Usage("move x y")),
        ("status" | "s" | "refresh" | "r", []) => UserCommand::Status,
        ("help" | "h" | "?", []) => UserCommand::Help,
        ("exit" | "quit" | "q", []) => UserCommand::Quit,
        ("select", []) => UserCommand::Select(None),
        ("select", [id]) => UserCommand::Select(Some(parse_vehicle_id(id)?)),
        ("select", _) => return Err(CommandError::Usage("select [id]")),
        (word, []) if word.bytes().all(|b| b.is_ascii_digit()) => {
            UserCommand::Select(Some(parse_vehicle_id(word)?))
        }
        _ => return Err(CommandError::Unknown(first.to_owned())),
    };
    Ok(Some(command))
}

fn parse_coordinate(raw: &str) -> Result<f64, CommandError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CommandError::InvalidNumber(raw.to_owned()))
}

fn parse_vehicle_id(raw: &str) -> Result<VehicleId, CommandError> {
    raw.parse::<u32>()
        .ok()
        .map(VehicleId)
        .ok_or_else(|| CommandError::InvalidNumber(raw.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_move() {
        assert_eq!(
            parse_line("move 50 -2.5").unwrap(),
            Some(UserCommand::Move { x: 50.0, y: -2.5 })
        );
        assert_eq!(
            parse_line("  MOVE 1 2 ").unwrap(),
            Some(UserCommand::Move { x: 1.0, y: 2.0 })
        );
    }

    #[test]
    fn move_needs_two_finite_numbers() {
        assert_eq!(
            parse_line("move 1").unwrap_err(),
            CommandError::Usage("move x y")
        );
        assert_eq!(
            parse_line("move a 2").unwrap_err(),
            CommandError::InvalidNumber(String::from("a"))
        );
        assert_eq!(
            parse_line("move inf 2").unwrap_err(),
            CommandError::InvalidNumber(String::from("inf"))
        );
    }

    #[test]
    fn aliases() {
        for line in ["status", "s", "refresh", "r"] {
            assert_eq!(parse_line(line).unwrap(), Some(UserCommand::Status), "{line}");
        }
        for line in ["help", "h", "?"] {
            assert_eq!(parse_line(line).unwrap(), Some(UserCommand::Help), "{line}");
        }
        for line in ["exit", "quit", "q"] {
            assert_eq!(parse_line(line).unwrap(), Some(UserCommand::Quit), "{line}");
        }
    }

    #[test]
    fn selection_forms() {
        assert_eq!(
            parse_line("select").unwrap(),
            Some(UserCommand::Select(None))
        );
        assert_eq!(
            parse_line("select 3").unwrap(),
            Some(UserCommand::Select(Some(VehicleId(3))))
        );
        assert_eq!(
            parse_line("4").unwrap(),
            Some(UserCommand::Select(Some(VehicleId(4))))
        );
        assert!(parse_line("select x").is_err());
    }

    #[test]
    fn blank_and_unknown() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(
            parse_line("fly 1 2").unwrap_err(),
            CommandError::Unknown(String::from("fly"))
        );
    }

    #[test]
    fn protocol_mapping() {
        assert_eq!(
            UserCommand::Move { x: 1.0, y: 2.0 }.to_protocol(),
            Some(ClientCommand::Move { x: 1.0, y: 2.0 })
        );
        assert_eq!(UserCommand::Help.to_protocol(), None);
        assert_eq!(UserCommand::Quit.to_protocol(), None);
    }
}
