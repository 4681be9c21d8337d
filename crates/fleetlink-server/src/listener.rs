//! TCP accept loop for controller sessions.
//!
//! [`SessionManager`] owns the listening socket and spawns one
//! [`Session`] task per connection. It stops accepting when the shared
//! [`SimulationControl`](fleetlink_core::SimulationControl) is stopped and
//! waits for the open sessions, which watch the same signal, to finish.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::ListenerError;
use crate::session::{Session, SessionContext};

/// Pause after a failed accept before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accepts controller connections and runs their sessions.
#[derive(Debug)]
pub struct SessionManager {
    listener: TcpListener,
    ctx: SessionContext,
    next_session_id: u64,
}

impl SessionManager {
    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Bind`] if the address cannot be bound.
    pub async fn bind(addr: &str, ctx: SessionContext) -> Result<Self, ListenerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::Bind {
                addr: addr.to_owned(),
                source,
            })?;
        Ok(Self {
            listener,
            ctx,
            next_session_id: 1,
        })
    }

    /// The address actually bound (useful with port 0).
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::LocalAddr`] if the socket address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr, ListenerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the simulation stops.
    pub async fn serve(mut self) {
        let control = Arc::clone(&self.ctx.control);
        let mut sessions = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                () = control.stopped() => break,
                Some(finished) = sessions.join_next() => {
                    if let Err(e) = finished {
                        warn!(error = %e, "Session task failed");
                    }
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            debug!(%peer, error = %e, "Could not disable Nagle");
                        }
                        let session_id = self.next_session_id;
                        self.next_session_id = self.next_session_id.wrapping_add(1);
                        info!(session_id, %peer, "Session connected");

                        let (reader, writer) = stream.into_split();
                        let session =
                            Session::new(session_id, Some(peer), reader, writer, self.ctx.clone());
                        sessions.spawn(session.run());
                    }
                    Err(e) => {
                        // Per-connection failures (e.g. reset before accept) do not stop the listener.
                        warn!(error = %e, "Accept failed");
                        // Persistent errors such as EMFILE would otherwise spin.
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }

        info!(open_sessions = sessions.len(), "Session listener stopping");
        while sessions.join_next().await.is_some() {}
    }
}
