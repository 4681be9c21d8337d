//! Error types for controller sessions and the session listener.
//!
//! [`SessionError`] is the per-session failure taxonomy. Every variant
//! except [`SessionError::Transport`] is reported to the client as a
//! [`ServerMessage::Error`] and the session carries on. A session only
//! ends on a transport failure, or when the fleet is already exhausted at
//! connect time.

use fleetlink_core::WorldError;
use fleetlink_types::{ErrorCode, ProtocolError, ServerMessage, VehicleId};

/// Failures that can occur while serving one controller session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A move targeted a vehicle that is not in the world.
    #[error("unknown vehicle {0}")]
    UnknownVehicle(VehicleId),

    /// Every vehicle is already controlled by another session.
    #[error("no vehicle available, every vehicle is controlled")]
    NoVehicleAvailable,

    /// The requested vehicle is controlled by another session or does not exist.
    #[error("vehicle {0} is not available")]
    VehicleUnavailable(VehicleId),

    /// A move arrived before the session selected a vehicle.
    #[error("no vehicle selected, send a select command first")]
    NoVehicleSelected,

    /// The client sent something that is not a valid command.
    #[error("{source}")]
    Protocol {
        /// The decode failure.
        #[from]
        source: ProtocolError,
    },

    /// Reading from or writing to the connection failed.
    #[error("transport error: {source}")]
    Transport {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl SessionError {
    /// Wire error code, or `None` for transport failures that cannot be
    /// reported over the broken connection.
    pub const fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::UnknownVehicle(_) => Some(ErrorCode::UnknownVehicle),
            Self::NoVehicleAvailable => Some(ErrorCode::NoVehicleAvailable),
            Self::VehicleUnavailable(_) => Some(ErrorCode::VehicleUnavailable),
            Self::NoVehicleSelected => Some(ErrorCode::NoVehicleSelected),
            Self::Protocol { .. } => Some(ErrorCode::ProtocolError),
            Self::Transport { .. } => None,
        }
    }

    /// The rejection message to send to the client, if any.
    pub fn to_message(&self) -> Option<ServerMessage> {
        self.code().map(|code| ServerMessage::Error {
            code,
            message: self.to_string(),
        })
    }
}

impl From<WorldError> for SessionError {
    fn from(err: WorldError) -> Self {
        match err {
            WorldError::UnknownVehicle(id) => Self::UnknownVehicle(id),
            WorldError::InvalidPosition { .. } => Self::Protocol {
                source: ProtocolError::NonFiniteCoordinate,
            },
            other => Self::Protocol {
                source: ProtocolError::Malformed(other.to_string()),
            },
        }
    }
}

/// Failures of the session listener itself.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Failed to bind the listening socket.
    #[error("bind failed on {addr}: {source}")]
    Bind {
        /// The requested address.
        addr: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The bound socket address could not be read.
    #[error("local address unavailable: {source}")]
    LocalAddr {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use fleetlink_types::Position;

    use super::*;

    #[test]
    fn rejections_other_than_transport_have_wire_codes() {
        assert_eq!(
            SessionError::NoVehicleAvailable.code(),
            Some(ErrorCode::NoVehicleAvailable)
        );
        assert_eq!(
            SessionError::NoVehicleSelected.code(),
            Some(ErrorCode::NoVehicleSelected)
        );
        assert_eq!(
            SessionError::UnknownVehicle(VehicleId(9)).code(),
            Some(ErrorCode::UnknownVehicle)
        );
        assert_eq!(
            SessionError::from(ProtocolError::Empty).code(),
            Some(ErrorCode::ProtocolError)
        );
    }

    #[test]
    fn transport_errors_have_no_wire_message() {
        let err = SessionError::from(std::io::Error::from(std::io::ErrorKind::UnexpectedEof));
        assert_eq!(err.code(), None);
        assert!(err.to_message().is_none());
    }

    #[test]
    fn rejection_messages_carry_code_and_text() {
        let msg = SessionError::VehicleUnavailable(VehicleId(3)).to_message();
        assert_eq!(
            msg,
            Some(ServerMessage::Error {
                code: ErrorCode::VehicleUnavailable,
                message: String::from("vehicle V3 is not available"),
            })
        );
    }

    #[test]
    fn world_errors_map_to_session_errors() {
        let unknown = SessionError::from(WorldError::UnknownVehicle(VehicleId(4)));
        assert_eq!(unknown.code(), Some(ErrorCode::UnknownVehicle));

        let invalid = SessionError::from(WorldError::InvalidPosition {
            vehicle: VehicleId(4),
            position: Position::new(f64::NAN, 0.0),
        });
        assert_eq!(invalid.code(), Some(ErrorCode::ProtocolError));
    }
}
