//! Wire protocol between remote controllers and the session server.
//!
//! Messages are single-line JSON objects separated by `\n`. Every message
//! carries a `type` discriminator. Commands are decoded once at the session
//! boundary into the closed [`ClientCommand`] set; anything else is a
//! [`ProtocolError`].
//!
//! ```text
//! client -> server   {"type":"select","vehicle_id":2}
//!                    {"type":"move","x":20.0,"y":0.0}
//!                    {"type":"status"}
//! server -> client   {"type":"welcome","vehicles":[...],"prompt":"..."}
//!                    {"type":"selected","vehicle_id":2}
//!                    {"type":"move_accepted","vehicle_id":2,"x":20.0,"y":0.0}
//!                    {"type":"state","tick":7,"vehicles":[...]}
//!                    {"type":"error","code":"protocol_error","message":"..."}
//! ```

use serde::{Deserialize, Serialize};

use crate::ids::VehicleId;
use crate::structs::{AvailableVehicle, WorldSnapshot};

/// A command sent by a client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Take control of a vehicle. Without an id the lowest free vehicle is
    /// assigned.
    Select {
        /// Requested vehicle, if any.
        #[serde(default)]
        vehicle_id: Option<VehicleId>,
    },
    /// Move the controlled vehicle to a new position.
    Move {
        /// Target horizontal coordinate.
        x: f64,
        /// Target vertical coordinate.
        y: f64,
    },
    /// Request the current snapshot immediately.
    Status,
}

/// Machine-readable rejection reason carried by [`ServerMessage::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The target vehicle does not exist in the world.
    UnknownVehicle,
    /// Every vehicle is already controlled by another session.
    NoVehicleAvailable,
    /// The requested vehicle is controlled by another session or unknown.
    VehicleUnavailable,
    /// A command that needs a controlled vehicle arrived before selection.
    NoVehicleSelected,
    /// The message could not be decoded.
    ProtocolError,
}

impl ErrorCode {
    /// Wire spelling of the code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownVehicle => "unknown_vehicle",
            Self::NoVehicleAvailable => "no_vehicle_available",
            Self::VehicleUnavailable => "vehicle_unavailable",
            Self::NoVehicleSelected => "no_vehicle_selected",
            Self::ProtocolError => "protocol_error",
        }
    }
}

/// A message sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Greeting listing the vehicles a new client may control.
    Welcome {
        /// Uncontrolled vehicles at connect time.
        vehicles: Vec<AvailableVehicle>,
        /// Human-readable selection prompt.
        prompt: String,
    },
    /// The session now controls this vehicle.
    Selected {
        /// The leased vehicle.
        vehicle_id: VehicleId,
    },
    /// A move was accepted and will be visible by the next tick.
    MoveAccepted {
        /// The moved vehicle.
        vehicle_id: VehicleId,
        /// New horizontal coordinate.
        x: f64,
        /// New vertical coordinate.
        y: f64,
    },
    /// A full world snapshot (periodic broadcast or `status` reply).
    State(WorldSnapshot),
    /// A command was rejected.
    Error {
        /// Rejection reason.
        code: ErrorCode,
        /// Human-readable details.
        message: String,
    },
}

/// Failure to decode a client command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The line was empty or whitespace.
    #[error("empty message")]
    Empty,

    /// The line was not a recognised JSON command.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// A coordinate was NaN or infinite.
    #[error("coordinates must be finite numbers")]
    NonFiniteCoordinate,

    /// The line exceeded the maximum accepted length.
    #[error("message exceeds {limit} bytes")]
    TooLong {
        /// Maximum accepted length in bytes.
        limit: usize,
    },
}

/// Decode one protocol line into a [`ClientCommand`].
///
/// # Errors
///
/// Returns [`ProtocolError`] for empty lines, invalid JSON, unknown `type`
/// values, missing or mistyped fields, and non-finite coordinates.
pub fn decode_command(line: &str) -> Result<ClientCommand, ProtocolError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::Empty);
    }
    let command: ClientCommand =
        serde_json::from_str(trimmed).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
    if let ClientCommand::Move { x, y } = command
        && !(x.is_finite() && y.is_finite())
    {
        return Err(ProtocolError::NonFiniteCoordinate);
    }
    Ok(command)
}

/// Encode a client command as a single line (no trailing newline).
///
/// # Errors
///
/// Returns the serializer error if the command cannot be encoded.
pub fn encode_command(command: &ClientCommand) -> Result<String, serde_json::Error> {
    serde_json::to_string(command)
}

/// Encode a server message as a single line (no trailing newline).
///
/// # Errors
///
/// Returns the serializer error if the message cannot be encoded.
pub fn encode_message(message: &ServerMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}

/// Decode one line sent by the server.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] if the line is not a known message.
pub fn decode_message(line: &str) -> Result<ServerMessage, ProtocolError> {
    serde_json::from_str(line.trim()).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::enums::LinkState;
    use crate::structs::VehicleView;

    #[test]
    fn decodes_move() {
        let cmd = decode_command(r#"{"type": "move", "x": 20, "y": -1.5}"#).unwrap();
        assert_eq!(cmd, ClientCommand::Move { x: 20.0, y: -1.5 });
    }

    #[test]
    fn decodes_status_with_surrounding_whitespace() {
        let cmd = decode_command("  {\"type\":\"status\"}\r").unwrap();
        assert_eq!(cmd, ClientCommand::Status);
    }

    #[test]
    fn decodes_select_with_and_without_id() {
        let with_id = decode_command(r#"{"type":"select","vehicle_id":3}"#).unwrap();
        assert_eq!(
            with_id,
            ClientCommand::Select {
                vehicle_id: Some(VehicleId(3))
            }
        );
        let without = decode_command(r#"{"type":"select"}"#).unwrap();
        assert_eq!(without, ClientCommand::Select { vehicle_id: None });
    }

    #[test]
    fn rejects_unknown_type() {
        let err = decode_command(r#"{"type":"refresh"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn rejects_missing_coordinates() {
        let err = decode_command(r#"{"type":"move","x":1.0}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn rejects_garbage_and_empty_lines() {
        assert!(matches!(
            decode_command("move 1 2"),
            Err(ProtocolError::Malformed(_))
        ));
        assert_eq!(decode_command("   "), Err(ProtocolError::Empty));
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        assert!(decode_command(r#"{"type":"move","x":1e400,"y":0}"#).is_err());
    }

    #[test]
    fn state_message_matches_broadcast_shape() {
        let msg = ServerMessage::State(WorldSnapshot {
            tick: 9,
            vehicles: vec![VehicleView {
                id: VehicleId(1),
                x: 5.0,
                y: 0.0,
                state: LinkState::RelayedLink,
                relay_target: Some(VehicleId(0)),
            }],
        });
        let json: serde_json::Value =
            serde_json::from_str(&encode_message(&msg).unwrap()).unwrap();
        assert_eq!(json["type"], "state");
        assert_eq!(json["tick"], 9);
        assert_eq!(json["vehicles"][0]["id"], 1);
        assert_eq!(json["vehicles"][0]["state"], "RelayedLink");
        assert_eq!(json["vehicles"][0]["relayTarget"], 0);
    }

    #[test]
    fn error_message_carries_snake_case_code() {
        let msg = ServerMessage::Error {
            code: ErrorCode::NoVehicleAvailable,
            message: String::from("fleet exhausted"),
        };
        let line = encode_message(&msg).unwrap();
        assert!(line.contains(r#""code":"no_vehicle_available""#));
        assert!(!line.contains('\n'));
        assert_eq!(decode_message(&line).unwrap(), msg);
    }

    #[test]
    fn error_code_spelling_matches_serde() {
        for code in [
            ErrorCode::UnknownVehicle,
            ErrorCode::NoVehicleAvailable,
            ErrorCode::VehicleUnavailable,
            ErrorCode::NoVehicleSelected,
            ErrorCode::ProtocolError,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn client_encoding_is_accepted_by_decoder() {
        let cmd = ClientCommand::Move { x: 1.5, y: 2.5 };
        let line = encode_command(&cmd).unwrap();
        assert_eq!(decode_command(&line).unwrap(), cmd);
    }
}
