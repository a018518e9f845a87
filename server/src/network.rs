//! Server network layer: TCP accept loop, per-connection tasks, and the
//! single state-owning loop.
//!
//! Each connection gets a reader task (frames in, decoded, funneled over a
//! channel) and a writer task (encoded frames out). The run loop is the only
//! code that touches the [`Session`], so inbound messages, disconnects, and
//! clock ticks are applied in one total order with no locking.

use crate::phase::PhaseTable;
use crate::session::{Outbound, Session};
use log::{debug, error, info, warn};
use shared::frame;
use shared::message::Message;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

/// Messages sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    Received { conn_id: u64, message: Message },
    Disconnected { conn_id: u64 },
}

/// Server configuration beyond the bind address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Clock updates per second
    pub tick_rate: u32,
    pub phase_table: PhaseTable,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: 10,
            phase_table: PhaseTable::default(),
        }
    }
}

struct Connection {
    player_id: u32,
    sender: mpsc::UnboundedSender<Vec<u8>>,
}

/// Main server coordinating connections and the session clock
pub struct Server {
    listener: TcpListener,
    session: Session,
    tick_duration: Duration,

    // Funnel from all connection tasks into the run loop
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,

    connections: HashMap<u64, Connection>,
    next_conn_id: u64,
}

impl Server {
    pub async fn new(addr: &str, config: ServerConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let tick_rate = config.tick_rate.max(1);

        Ok(Server {
            listener,
            session: Session::new(config.phase_table),
            tick_duration: Duration::from_secs_f32(1.0 / tick_rate as f32),
            server_tx,
            server_rx,
            connections: HashMap::new(),
            next_conn_id: 0,
        })
    }

    /// The bound address, useful when port 0 was requested.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Main server loop coordinating all operations.
    pub async fn run(mut self) -> std::io::Result<()> {
        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick = Instant::now();

        info!("Server started successfully");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            info!("Connection accepted from {}", addr);
                            self.handle_accept(stream);
                        }
                        Err(e) => {
                            error!("Accept failed: {}", e);
                        }
                    }
                },

                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::Received { conn_id, message }) => {
                            self.handle_received(conn_id, message);
                        }
                        Some(ServerMessage::Disconnected { conn_id }) => {
                            self.handle_disconnected(conn_id);
                        }
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;

                    let out = self.session.tick(dt);
                    self.dispatch(out);
                },
            }
        }

        Ok(())
    }

    fn handle_accept(&mut self, stream: TcpStream) {
        let conn_id = self.next_conn_id;
        self.next_conn_id += 1;

        let (read_half, write_half) = stream.into_split();
        let (frame_tx, frame_rx) = mpsc::unbounded_channel::<Vec<u8>>();

        Self::spawn_reader(conn_id, read_half, self.server_tx.clone());
        Self::spawn_writer(conn_id, write_half, frame_rx);

        let (player_id, out) = self.session.accept();
        self.connections.insert(
            conn_id,
            Connection {
                player_id,
                sender: frame_tx,
            },
        );
        debug!("Connection {} registered as player {}", conn_id, player_id);

        self.dispatch(out);
    }

    /// Spawns the task that reads and decodes inbound frames.
    fn spawn_reader(
        conn_id: u64,
        mut read_half: tokio::net::tcp::OwnedReadHalf,
        server_tx: mpsc::UnboundedSender<ServerMessage>,
    ) {
        tokio::spawn(async move {
            loop {
                match frame::read_frame(&mut read_half).await {
                    Ok(Some(payload)) => match Message::from_bytes(&payload) {
                        Ok(message) => {
                            if server_tx
                                .send(ServerMessage::Received { conn_id, message })
                                .is_err()
                            {
                                break;
                            }
                        }
                        Err(e) => {
                            // A malformed frame drops; the connection lives on.
                            warn!("Dropping undecodable frame on connection {}: {}", conn_id, e);
                        }
                    },
                    Ok(None) => {
                        debug!("Connection {} closed by peer", conn_id);
                        let _ = server_tx.send(ServerMessage::Disconnected { conn_id });
                        break;
                    }
                    Err(e) => {
                        warn!("Read error on connection {}: {}", conn_id, e);
                        let _ = server_tx.send(ServerMessage::Disconnected { conn_id });
                        break;
                    }
                }
            }
        });
    }

    /// Spawns the task that drains queued frames onto the socket.
    fn spawn_writer(
        conn_id: u64,
        mut write_half: OwnedWriteHalf,
        mut frame_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    ) {
        tokio::spawn(async move {
            while let Some(bytes) = frame_rx.recv().await {
                if let Err(e) = frame::write_frame(&mut write_half, &bytes).await {
                    warn!("Write error on connection {}: {}", conn_id, e);
                    break;
                }
            }
        });
    }

    fn handle_received(&mut self, conn_id: u64, mut message: Message) {
        let sender = match self.connections.get(&conn_id) {
            Some(connection) => connection.player_id,
            None => {
                debug!("Message from unknown connection {}", conn_id);
                return;
            }
        };

        message.stamp_sender(sender);
        let out = self.session.handle_message(sender, message);
        self.dispatch(out);
    }

    fn handle_disconnected(&mut self, conn_id: u64) {
        if let Some(connection) = self.connections.remove(&conn_id) {
            info!(
                "Connection {} (player {}) disconnected",
                conn_id, connection.player_id
            );
            let out = self.session.disconnect(connection.player_id);
            self.dispatch(out);
        }
    }

    /// Encodes each message once and queues it on every matching
    /// connection. Queue failures mean the writer already died; the
    /// reader's disconnect notice cleans up.
    fn dispatch(&mut self, out: Vec<(Outbound, Message)>) {
        for (audience, message) in out {
            let payload = match message.to_bytes() {
                Ok(payload) => payload,
                Err(e) => {
                    error!("Failed to encode outbound message: {}", e);
                    continue;
                }
            };

            match audience {
                Outbound::All => {
                    for connection in self.connections.values() {
                        let _ = connection.sender.send(payload.clone());
                    }
                }
                Outbound::AllExcept(excluded) => {
                    for connection in self.connections.values() {
                        if connection.player_id == excluded {
                            continue;
                        }
                        let _ = connection.sender.send(payload.clone());
                    }
                }
                Outbound::To(player_id) => {
                    if let Some(connection) = self
                        .connections
                        .values()
                        .find(|connection| connection.player_id == player_id)
                    {
                        let _ = connection.sender.send(payload);
                    }
                }
            }
        }
    }
}
