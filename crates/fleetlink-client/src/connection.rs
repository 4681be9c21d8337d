//! TCP connection to the session server.
//!
//! Incoming lines are read on a dedicated task and forwarded over a
//! channel, so the interactive loop can wait on the keyboard and the
//! server at the same time.

use fleetlink_types::protocol::{self, ClientCommand, ProtocolError, ServerMessage};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::ClientError;

/// Messages buffered between the reader task and the interactive loop.
const INCOMING_CAPACITY: usize = 64;

/// Spawn the reader task. The channel closes when the server disconnects.
pub fn spawn_reader<R>(reader: R) -> mpsc::Receiver<Result<ServerMessage, ProtocolError>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(INCOMING_CAPACITY);
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => {
                    if tx.send(protocol::decode_message(&line)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    debug!(error = %e, "Server read failed");
                    break;
                }
            }
        }
    });
    rx
}

/// Send one command as a newline-terminated line.
pub async fn send_command<W>(writer: &mut W, command: &ClientCommand) -> Result<(), ClientError>
where
    W: AsyncWrite + Unpin,
{
    let mut line = protocol::encode_command(command)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
