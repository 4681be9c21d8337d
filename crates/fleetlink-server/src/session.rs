//! One controller session.
//!
//! A [`Session`] serves a single connection. It greets the client with
//! the uncontrolled vehicles, lets it select one, and then multiplexes
//! three event sources in one `tokio::select!` loop:
//!
//! - lines from the client, decoded into [`ClientCommand`]s and applied
//!   to the shared [`WorldHandle`]
//! - per-tick snapshots from the [`SnapshotBroadcaster`], forwarded as
//!   `state` messages (a lagging session skips to the newest snapshot)
//! - the simulation stop signal
//!
//! The session never touches world state directly, and nothing it does
//! can block the tick loop or another session. Its vehicle lease is
//! dropped when [`Session::run`] returns, which releases the vehicle.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use fleetlink_core::{SimulationControl, SnapshotBroadcaster, WorldHandle};
use fleetlink_types::protocol::{self, ClientCommand, ServerMessage};
use fleetlink_types::{AvailableVehicle, Position, VehicleId};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::codec::{self, Frame, LineReader};
use crate::error::SessionError;
use crate::pool::{VehicleLease, VehiclePool};

/// Prompt sent with the welcome message.
pub const SELECT_PROMPT: &str = "Select a vehicle to control";

/// Longest a single write may wait on a client that is not reading.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything a session needs from the running simulation.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Shared world state.
    pub world: WorldHandle,
    /// Snapshot fan-out.
    pub broadcaster: SnapshotBroadcaster,
    /// Uncontrolled vehicles.
    pub pool: VehiclePool,
    /// Stop signal shared with the tick loop.
    pub control: Arc<SimulationControl>,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The client closed the connection.
    Disconnected,
    /// Every vehicle was controlled when the client connected.
    FleetExhausted,
    /// Reading from or writing to the connection failed.
    TransportFailed,
    /// The simulation is shutting down.
    Shutdown,
}

/// A single controller connection.
#[derive(Debug)]
pub struct Session<R, W> {
    id: u64,
    peer: Option<SocketAddr>,
    reader: LineReader<R>,
    writer: W,
    ctx: SessionContext,
    lease: Option<VehicleLease>,
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a session over split read and write halves.
    pub fn new(id: u64, peer: Option<SocketAddr>, reader: R, writer: W, ctx: SessionContext) -> Self {
        Self {
            id,
            peer,
            reader: LineReader::new(reader),
            writer,
            ctx,
            lease: None,
        }
    }

    /// The vehicle this session controls, if any.
    pub fn vehicle(&self) -> Option<VehicleId> {
        self.lease.as_ref().map(VehicleLease::id)
    }

    /// Serve the connection until the client leaves, the transport fails,
    /// or the simulation stops.
    pub async fn run(mut self) -> SessionEnd {
        let end = self.serve().await;
        info!(
            session_id = self.id,
            peer = ?self.peer,
            vehicle_id = ?self.vehicle(),
            end = ?end,
            "Session ended"
        );
        end
    }

    async fn serve(&mut self) -> SessionEnd {
        // Subscribe before the welcome so no tick published after it is missed.
        let mut snapshots = self.ctx.broadcaster.subscribe();

        if let Err(end) = self.greet().await {
            return end;
        }

        let control = Arc::clone(&self.ctx.control);
        loop {
            tokio::select! {
                biased;
                () = control.stopped() => return SessionEnd::Shutdown,
                frame = self.reader.next_line() => {
                    let frame = match frame {
                        Ok(Some(frame)) => frame,
                        Ok(None) => return SessionEnd::Disconnected,
                        Err(e) => {
                            debug!(session_id = self.id, error = %e, "Session read failed");
                            return SessionEnd::TransportFailed;
                        }
                    };
                    let reply = match self.handle_frame(frame).await {
                        Ok(reply) => Some(reply),
                        Err(err) => {
                            debug!(session_id = self.id, error = %err, "Command rejected");
                            err.to_message()
                        }
                    };
                    if let Some(reply) = reply
                        && let Err(end) = self.send(&reply).await
                    {
                        return end;
                    }
                }
                result = snapshots.recv() => match result {
                    Ok(snapshot) => {
                        let message = ServerMessage::State((*snapshot).clone());
                        if let Err(end) = self.send(&message).await {
                            return end;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(session_id = self.id, skipped, "Session lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => return SessionEnd::Shutdown,
                },
            }
        }
    }

    /// Send the welcome, or reject the connection if the fleet is exhausted.
    async fn greet(&mut self) -> Result<(), SessionEnd> {
        let free = self.ctx.pool.available();
        if free.is_empty() {
            warn!(session_id = self.id, peer = ?self.peer, "Rejecting session, fleet exhausted");
            if let Some(message) = SessionError::NoVehicleAvailable.to_message() {
                // The connection closes whether or not the rejection arrives.
                if let Err(end) = self.send(&message).await {
                    debug!(session_id = self.id, end = ?end, "Fleet exhausted notice not delivered");
                }
            }
            return Err(SessionEnd::FleetExhausted);
        }

        let snapshot = self.ctx.world.snapshot().await;
        let vehicles = free
            .into_iter()
            .filter_map(|id| snapshot.vehicle(id))
            .map(|v| AvailableVehicle {
                id: v.id,
                x: v.x,
                y: v.y,
            })
            .collect();

        let welcome = ServerMessage::Welcome {
            vehicles,
            prompt: String::from(SELECT_PROMPT),
        };
        self.send(&welcome).await
    }

    /// Write one message to the client.
    ///
    /// The write gives up after [`WRITE_TIMEOUT`] or as soon as the
    /// simulation stops, so a client that stops reading cannot hold the
    /// session open.
    async fn send(&mut self, message: &ServerMessage) -> Result<(), SessionEnd> {
        let control = Arc::clone(&self.ctx.control);
        tokio::select! {
            biased;
            () = control.stopped() => Err(SessionEnd::Shutdown),
            written = tokio::time::timeout(
                WRITE_TIMEOUT,
                codec::write_message(&mut self.writer, message),
            ) => match written {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => {
                    debug!(session_id = self.id, error = %e, "Session write failed");
                    Err(SessionEnd::TransportFailed)
                }
                Err(_) => {
                    warn!(
                        session_id = self.id,
                        timeout_ms = WRITE_TIMEOUT.as_millis(),
                        "Session write timed out, client not reading"
                    );
                    Err(SessionEnd::TransportFailed)
                }
            },
        }
    }

    async fn handle_frame(&mut self, frame: Frame) -> Result<ServerMessage, SessionError> {
        let command = protocol::decode_command(&frame?)?;
        debug!(session_id = self.id, ?command, "Command received");
        match command {
            ClientCommand::Select { vehicle_id } => self.select(vehicle_id),
            ClientCommand::Move { x, y } => self.move_vehicle(Position::new(x, y)).await,
            ClientCommand::Status => {
                let snapshot = self.ctx.world.snapshot().await;
                Ok(ServerMessage::State((*snapshot).clone()))
            }
        }
    }

    fn select(&mut self, requested: Option<VehicleId>) -> Result<ServerMessage, SessionError> {
        // Asking for any vehicle, or for the held one, keeps the current lease.
        if let Some(current) = self.vehicle()
            && requested.is_none_or(|id| id == current)
        {
            return Ok(ServerMessage::Selected {
                vehicle_id: current,
            });
        }

        let lease = self.ctx.pool.acquire(requested)?;
        let vehicle_id = lease.id();
        // Replacing the old lease releases the previous vehicle.
        self.lease = Some(lease);
        info!(session_id = self.id, vehicle_id = %vehicle_id, "Vehicle selected");
        Ok(ServerMessage::Selected { vehicle_id })
    }

    async fn move_vehicle(&self, position: Position) -> Result<ServerMessage, SessionError> {
        let vehicle_id = self.vehicle().ok_or(SessionError::NoVehicleSelected)?;
        self.ctx.world.apply_move(vehicle_id, position).await?;
        debug!(session_id = self.id, vehicle_id = %vehicle_id, %position, "Move accepted");
        Ok(ServerMessage::MoveAccepted {
            vehicle_id,
            x: position.x,
            y: position.y,
        })
    }
}
