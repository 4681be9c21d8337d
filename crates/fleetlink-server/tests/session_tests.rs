//! Loopback tests for the session listener running alongside the tick loop.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use fleetlink_core::{
    FleetConfig, SimulationControl, SnapshotBroadcaster, World, WorldHandle, run_simulation,
};
use fleetlink_server::codec::LineReader;
use fleetlink_server::{SessionContext, SessionManager, VehiclePool};
use fleetlink_types::protocol::{self, ServerMessage};
use fleetlink_types::{ErrorCode, LinkState, VehicleId};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::task::JoinHandle;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

struct Server {
    addr: SocketAddr,
    control: Arc<SimulationControl>,
    listener: JoinHandle<()>,
    ticker: JoinHandle<()>,
}

/// Demonstration fleet, 20ms ticks, listener on an ephemeral port.
async fn start_server() -> Server {
    let config = FleetConfig::default();
    let world = World::new(config.build_vehicles()).unwrap();
    let broadcaster = SnapshotBroadcaster::new(16, world.snapshot());
    let pool = VehiclePool::new(world.vehicle_ids());
    let world = WorldHandle::new(world);
    let control = Arc::new(SimulationControl::new(20, 0));

    let ctx = SessionContext {
        world: world.clone(),
        broadcaster: broadcaster.clone(),
        pool,
        control: Arc::clone(&control),
    };
    let manager = SessionManager::bind("127.0.0.1:0", ctx).await.unwrap();
    let addr = manager.local_addr().unwrap();
    let listener = tokio::spawn(manager.serve());

    let tick_control = Arc::clone(&control);
    let ticker = tokio::spawn(async move {
        let mut callback = broadcaster;
        run_simulation(&world, &tick_control, &mut callback)
            .await
            .unwrap();
    });

    Server {
        addr,
        control,
        listener,
        ticker,
    }
}

struct Client {
    reader: LineReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        Self {
            reader: LineReader::new(reader),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }

    async fn recv(&mut self) -> Option<ServerMessage> {
        let frame = timeout(WAIT, self.reader.next_line())
            .await
            .expect("timed out waiting for server")
            .unwrap()?;
        Some(protocol::decode_message(&frame.unwrap()).unwrap())
    }

    /// Next message that is not a periodic `state` broadcast.
    async fn reply(&mut self) -> ServerMessage {
        loop {
            match self.recv().await.expect("connection closed") {
                ServerMessage::State(_) => {}
                other => return other,
            }
        }
    }

    async fn select(&mut self, id: u32) {
        self.send(&format!(r#"{{"type":"select","vehicle_id":{id}}}"#))
            .await;
        assert_eq!(
            self.reply().await,
            ServerMessage::Selected {
                vehicle_id: VehicleId(id)
            }
        );
    }
}

#[tokio::test]
async fn welcome_then_periodic_broadcasts() {
    let server = start_server().await;
    let mut client = Client::connect(server.addr).await;

    match client.recv().await.unwrap() {
        ServerMessage::Welcome { vehicles, .. } => assert_eq!(vehicles.len(), 6),
        other => panic!("expected welcome, got {other:?}"),
    }

    let mut ticks = Vec::new();
    while ticks.len() < 3 {
        if let Some(ServerMessage::State(snapshot)) = client.recv().await {
            assert_eq!(snapshot.vehicles.len(), 6);
            ticks.push(snapshot.tick);
        }
    }
    assert!(ticks.windows(2).all(|w| w[0] < w[1]), "ticks {ticks:?}");

    server.control.request_stop();
    server.ticker.await.unwrap();
    server.listener.await.unwrap();
}

#[tokio::test]
async fn move_is_visible_by_the_next_tick() {
    let server = start_server().await;
    let mut client = Client::connect(server.addr).await;
    let _welcome = client.recv().await;
    client.select(0).await;

    // Vehicle 0 relays through vehicle 1; far away it falls back to cellular.
    client.send(r#"{"type":"move","x":500.0,"y":500.0}"#).await;
    assert!(matches!(
        client.reply().await,
        ServerMessage::MoveAccepted {
            vehicle_id: VehicleId(0),
            ..
        }
    ));

    let state = loop {
        if let Some(ServerMessage::State(snapshot)) = client.recv().await {
            let view = *snapshot.vehicle(VehicleId(0)).unwrap();
            if (view.x - 500.0).abs() < f64::EPSILON {
                break view;
            }
        }
    };
    assert_eq!(state.state, LinkState::CellularLink);
    assert_eq!(state.relay_target, None);

    server.control.request_stop();
}

#[tokio::test]
async fn vehicles_are_exclusive_and_released_on_disconnect() {
    let server = start_server().await;

    let mut first = Client::connect(server.addr).await;
    let _welcome = first.recv().await;
    first.select(3).await;

    let mut second = Client::connect(server.addr).await;
    match second.recv().await.unwrap() {
        ServerMessage::Welcome { vehicles, .. } => {
            assert!(vehicles.iter().all(|v| v.id != VehicleId(3)));
        }
        other => panic!("expected welcome, got {other:?}"),
    }
    second
        .send(r#"{"type":"select","vehicle_id":3}"#)
        .await;
    assert!(matches!(
        second.reply().await,
        ServerMessage::Error {
            code: ErrorCode::VehicleUnavailable,
            ..
        }
    ));

    drop(first);

    // The release happens when the first session notices the disconnect.
    let mut selected = false;
    for _ in 0..50 {
        second
            .send(r#"{"type":"select","vehicle_id":3}"#)
            .await;
        if let ServerMessage::Selected { vehicle_id } = second.reply().await {
            assert_eq!(vehicle_id, VehicleId(3));
            selected = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(selected, "vehicle 3 was never released");

    server.control.request_stop();
}

#[tokio::test]
async fn disconnecting_one_session_does_not_disturb_another() {
    let server = start_server().await;

    let mut stays = Client::connect(server.addr).await;
    let _welcome = stays.recv().await;
    let leaves = Client::connect(server.addr).await;
    drop(leaves);

    for _ in 0..5 {
        while !matches!(stays.recv().await, Some(ServerMessage::State(_))) {}
    }

    server.control.request_stop();
}

#[tokio::test]
async fn exhausted_fleet_rejects_new_connections() {
    let server = start_server().await;

    let mut holders = Vec::new();
    for id in 0..6 {
        let mut client = Client::connect(server.addr).await;
        let _welcome = client.recv().await;
        client.select(id).await;
        holders.push(client);
    }

    let mut extra = Client::connect(server.addr).await;
    assert!(matches!(
        extra.recv().await,
        Some(ServerMessage::Error {
            code: ErrorCode::NoVehicleAvailable,
            ..
        })
    ));
    assert!(extra.recv().await.is_none(), "connection should be closed");

    server.control.request_stop();
}

#[tokio::test]
async fn stop_closes_sessions() {
    let server = start_server().await;
    let mut client = Client::connect(server.addr).await;
    let _welcome = client.recv().await;

    server.control.request_stop();
    server.listener.await.unwrap();

    while client.recv().await.is_some() {}
}
