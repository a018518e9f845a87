//! Client connection: framing, the inbound queue, and outbound sends.
//!
//! A reader task decodes frames off the socket into an unbounded queue;
//! the application drains the queue on its own schedule so a burst of
//! broadcasts never blocks the socket. Sends go straight out.

use log::{info, warn};
use shared::frame;
use shared::message::Message;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

/// One live connection to the session server.
pub struct ClientLink {
    write_half: OwnedWriteHalf,
    inbound: mpsc::UnboundedReceiver<Message>,
    closed: bool,
}

impl ClientLink {
    /// Connects and starts the reader task.
    pub async fn connect(addr: &str) -> std::io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        info!("Connected to server at {}", addr);

        let (read_half, write_half) = stream.into_split();
        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        Self::spawn_reader(read_half, inbound_tx);

        Ok(ClientLink {
            write_half,
            inbound,
            closed: false,
        })
    }

    fn spawn_reader(mut read_half: OwnedReadHalf, inbound_tx: mpsc::UnboundedSender<Message>) {
        tokio::spawn(async move {
            loop {
                match frame::read_frame(&mut read_half).await {
                    Ok(Some(payload)) => match Message::from_bytes(&payload) {
                        Ok(message) => {
                            if inbound_tx.send(message).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Dropping undecodable frame: {}", e);
                        }
                    },
                    Ok(None) => {
                        info!("Server closed the connection");
                        break;
                    }
                    Err(e) => {
                        warn!("Read error: {}", e);
                        break;
                    }
                }
            }
            // Dropping the sender lets drain() observe the close.
        });
    }

    /// Takes every message queued since the last drain, oldest first.
    /// After the server goes away this keeps returning what remains
    /// buffered, then nothing; check [`is_closed`](Self::is_closed).
    pub fn drain(&mut self) -> Vec<Message> {
        let mut messages = Vec::new();
        loop {
            match self.inbound.try_recv() {
                Ok(message) => messages.push(message),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
        messages
    }

    /// True once the reader task has observed the connection closing and
    /// the queue is fully drained.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Encodes and writes one message.
    pub async fn send(&mut self, message: &Message) -> std::io::Result<()> {
        let payload = message
            .to_bytes()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        frame::write_frame(&mut self.write_half, &payload).await
    }
}
