//! Controller session server for the Fleetlink simulation.
//!
//! Remote controllers connect over TCP and speak newline-delimited JSON.
//! Each connection becomes an isolated session task that may control one
//! vehicle at a time, requests world mutations through the shared
//! [`WorldHandle`](fleetlink_core::WorldHandle), and receives every tick's
//! snapshot from the broadcaster.
//!
//! # Modules
//!
//! - [`codec`] -- Cancel-safe line framing and message writing.
//! - [`error`] -- [`SessionError`] taxonomy and [`ListenerError`].
//! - [`listener`] -- [`SessionManager`] accept loop.
//! - [`pool`] -- [`VehiclePool`] and RAII [`VehicleLease`]s.
//! - [`session`] -- The per-connection [`Session`] worker.
//!
//! [`SessionError`]: error::SessionError
//! [`ListenerError`]: error::ListenerError
//! [`SessionManager`]: listener::SessionManager
//! [`VehiclePool`]: pool::VehiclePool
//! [`VehicleLease`]: pool::VehicleLease
//! [`Session`]: session::Session

pub mod codec;
pub mod error;
pub mod listener;
pub mod pool;
pub mod session;

pub use error::{ListenerError, SessionError};
pub use listener::SessionManager;
pub use pool::{VehicleLease, VehiclePool};
pub use session::{Session, SessionContext, SessionEnd};
