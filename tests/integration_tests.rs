//! Integration tests for the session server and client link.
//!
//! These tests run a real server on an ephemeral port and speak to it
//! over real TCP connections.

use server::network::{Server, ServerConfig};
use server::phase::PhaseTable;
use shared::frame;
use shared::message::Message;
use shared::{Group, Role};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

/// Starts a server with the given config and returns its address.
async fn spawn_server(config: ServerConfig) -> std::net::SocketAddr {
    let server = Server::new("127.0.0.1:0", config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

async fn read_message(stream: &mut TcpStream) -> Message {
    let payload = timeout(WAIT, frame::read_frame(stream))
        .await
        .expect("timed out waiting for a frame")
        .unwrap()
        .expect("connection closed unexpectedly");
    Message::from_bytes(&payload).unwrap()
}

/// Reads messages until one matches, dropping the rest.
async fn read_until<F, T>(stream: &mut TcpStream, mut pick: F) -> T
where
    F: FnMut(Message) -> Option<T>,
{
    loop {
        let message = read_message(stream).await;
        if let Some(found) = pick(message) {
            return found;
        }
    }
}

async fn send(stream: &mut TcpStream, message: &Message) {
    frame::write_frame(stream, &message.to_bytes().unwrap())
        .await
        .unwrap();
}

/// HANDSHAKE TESTS
mod handshake_tests {
    use super::*;

    #[tokio::test]
    async fn welcome_then_roster_on_connect() {
        let addr = spawn_server(ServerConfig::default()).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();

        match read_message(&mut stream).await {
            Message::Welcome { my_id } => assert_eq!(my_id, 0),
            other => panic!("expected WELCOME first, got {:?}", other),
        }
        match read_message(&mut stream).await {
            Message::PlayerList { participants } => {
                assert_eq!(participants.len(), 1);
                assert_eq!(participants[0].id, 0);
                assert_eq!(participants[0].name, "Player 1");
                assert_eq!(participants[0].role, Role::Citizen);
            }
            other => panic!("expected PLAYER_LIST second, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn ids_assigned_in_connection_order() {
        let addr = spawn_server(ServerConfig::default()).await;

        let mut first = TcpStream::connect(addr).await.unwrap();
        match read_message(&mut first).await {
            Message::Welcome { my_id } => assert_eq!(my_id, 0),
            other => panic!("unexpected {:?}", other),
        }

        let mut second = TcpStream::connect(addr).await.unwrap();
        match read_message(&mut second).await {
            Message::Welcome { my_id } => assert_eq!(my_id, 1),
            other => panic!("unexpected {:?}", other),
        }

        // The first client eventually sees both players in the roster.
        let roster = read_until(&mut first, |message| match message {
            Message::PlayerList { participants } if participants.len() == 2 => Some(participants),
            _ => None,
        })
        .await;
        assert_eq!(roster[1].id, 1);
    }

    #[tokio::test]
    async fn profile_update_renames_in_roster() {
        let addr = spawn_server(ServerConfig::default()).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        read_message(&mut stream).await; // WELCOME
        read_message(&mut stream).await; // initial roster

        send(
            &mut stream,
            &Message::UpdateProfile {
                name: "Ada".into(),
                custom: serde_json::json!({"hat": "straw"}),
            },
        )
        .await;

        let roster = read_until(&mut stream, |message| match message {
            Message::PlayerList { participants } => Some(participants),
            _ => None,
        })
        .await;
        assert_eq!(roster[0].name, "Ada");
        assert_eq!(roster[0].custom, Some(serde_json::json!({"hat": "straw"})));
    }
}

/// LOBBY AND GAME FLOW TESTS
mod game_flow_tests {
    use super::*;

    #[tokio::test]
    async fn start_game_distributes_roles() {
        let addr = spawn_server(ServerConfig::default()).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        read_message(&mut stream).await; // WELCOME
        read_message(&mut stream).await; // roster

        // A six-strong lobby: the human plus five bots, all on RANDOM.
        for i in 0..5 {
            send(
                &mut stream,
                &Message::AddBot {
                    name: format!("Bot {}", i + 1),
                    group: Group::Player,
                },
            )
            .await;
        }
        send(
            &mut stream,
            &Message::UpdateRole {
                id: None,
                role: Role::Random,
            },
        )
        .await;

        send(&mut stream, &Message::StartGame).await;

        let players = read_until(&mut stream, |message| match message {
            Message::GameStart { players } => Some(players),
            _ => None,
        })
        .await;

        assert_eq!(players.len(), 6);
        assert!(players.iter().all(|record| record.role != Role::Random));
        let mafia = players.iter().filter(|r| r.role == Role::Mafia).count();
        let police = players.iter().filter(|r| r.role == Role::Police).count();
        let doctor = players.iter().filter(|r| r.role == Role::Doctor).count();
        assert_eq!((mafia, police, doctor), (1, 1, 1));
    }

    #[tokio::test]
    async fn time_sync_flows_after_start() {
        let addr = spawn_server(ServerConfig {
            tick_rate: 50,
            phase_table: PhaseTable::new([0.2; 6]),
        })
        .await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        read_message(&mut stream).await;
        read_message(&mut stream).await;

        send(&mut stream, &Message::StartGame).await;
        read_until(&mut stream, |message| match message {
            Message::GameStart { .. } => Some(()),
            _ => None,
        })
        .await;

        // With 0.2s phases the clock crosses phases quickly; each crossing
        // carries an immediate TIME_SYNC.
        let (phase_idx, day) = read_until(&mut stream, |message| match message {
            Message::TimeSync { phase_idx, day, .. } => Some((phase_idx, day)),
            _ => None,
        })
        .await;
        assert!(phase_idx < 6);
        assert!(day >= 1);
    }

    #[tokio::test]
    async fn skip_phase_advances_immediately() {
        let addr = spawn_server(ServerConfig {
            tick_rate: 50,
            phase_table: PhaseTable::new([600.0; 6]),
        })
        .await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        read_message(&mut stream).await;
        read_message(&mut stream).await;

        send(&mut stream, &Message::StartGame).await;
        send(&mut stream, &Message::SkipPhase).await;

        // Ten-minute phases mean the only way off DAWN is the skip.
        let phase_idx = read_until(&mut stream, |message| match message {
            Message::TimeSync { phase_idx, .. } if phase_idx > 0 => Some(phase_idx),
            _ => None,
        })
        .await;
        assert_eq!(phase_idx, 1);
    }

    #[tokio::test]
    async fn death_appears_in_morning_news() {
        let addr = spawn_server(ServerConfig {
            tick_rate: 50,
            phase_table: PhaseTable::new([0.2; 6]),
        })
        .await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        read_message(&mut stream).await;
        read_message(&mut stream).await;

        send(
            &mut stream,
            &Message::UpdateProfile {
                name: "Victim".into(),
                custom: serde_json::Value::Null,
            },
        )
        .await;
        send(&mut stream, &Message::StartGame).await;
        send(
            &mut stream,
            &Message::EntityDied {
                victim: 0,
                reason: Some("a landslide".into()),
            },
        )
        .await;

        // The death may miss the first morning flush; wait for the digest
        // that carries it.
        let line = "Victim has died of a landslide.".to_string();
        read_until(&mut stream, |message| match message {
            Message::DailyNews { news } if news.contains(&line) => Some(()),
            _ => None,
        })
        .await;
    }
}

/// BROADCAST ROUTING TESTS
mod routing_tests {
    use super::*;

    #[tokio::test]
    async fn move_excludes_sender_but_reaches_others() {
        let addr = spawn_server(ServerConfig::default()).await;

        let mut mover = TcpStream::connect(addr).await.unwrap();
        read_message(&mut mover).await;
        let mut watcher = TcpStream::connect(addr).await.unwrap();
        read_message(&mut watcher).await;
        read_until(&mut watcher, |message| match message {
            Message::PlayerList { participants } if participants.len() == 2 => Some(()),
            _ => None,
        })
        .await;

        send(
            &mut mover,
            &Message::Move {
                id: None,
                x: 5.0,
                y: 6.0,
                is_moving: true,
                facing: Some("up".into()),
            },
        )
        .await;

        let (id, x) = read_until(&mut watcher, |message| match message {
            Message::Move { id, x, .. } => Some((id, x)),
            _ => None,
        })
        .await;
        assert_eq!(id, Some(0));
        assert_eq!(x, 5.0);

        // The mover hears chat but never its own MOVE echo.
        send(
            &mut mover,
            &Message::Chat {
                message: "done moving".into(),
                sender_name: None,
            },
        )
        .await;
        let first_after = read_until(&mut mover, |message| match message {
            Message::Move { .. } => panic!("MOVE echoed back to its sender"),
            Message::Chat { message, .. } => Some(message),
            _ => None,
        })
        .await;
        assert_eq!(first_after, "done moving");
    }

    #[tokio::test]
    async fn chat_stamped_with_sender_name() {
        let addr = spawn_server(ServerConfig::default()).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        read_message(&mut stream).await;
        read_message(&mut stream).await;

        send(
            &mut stream,
            &Message::Chat {
                message: "evening all".into(),
                sender_name: Some("Forged".into()),
            },
        )
        .await;

        let (text, name) = read_until(&mut stream, |message| match message {
            Message::Chat {
                message,
                sender_name,
            } => Some((message, sender_name)),
            _ => None,
        })
        .await;
        assert_eq!(text, "evening all");
        // The server overwrites whatever name the client claimed.
        assert_eq!(name.as_deref(), Some("Player 1"));
    }
}

/// CLIENT LINK TESTS
mod client_link_tests {
    use super::*;
    use client::network::ClientLink;
    use client::world::World;

    #[tokio::test]
    async fn world_mirror_converges_via_drain() {
        let addr = spawn_server(ServerConfig::default()).await;
        let mut link = ClientLink::connect(&addr.to_string()).await.unwrap();
        let mut world = World::new();

        link.send(&Message::UpdateProfile {
            name: "Mirror".into(),
            custom: serde_json::Value::Null,
        })
        .await
        .unwrap();

        // Drain on an interval until the rename lands.
        for _ in 0..50 {
            for message in link.drain() {
                world.apply(message);
            }
            if world.me().map(|me| me.name == "Mirror").unwrap_or(false) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        assert_eq!(world.my_id(), Some(0));
        assert_eq!(world.me().unwrap().name, "Mirror");
    }

    #[tokio::test]
    async fn game_start_reflected_in_mirror() {
        let addr = spawn_server(ServerConfig::default()).await;
        let mut link = ClientLink::connect(&addr.to_string()).await.unwrap();
        let mut world = World::new();

        link.send(&Message::StartGame).await.unwrap();

        for _ in 0..50 {
            for message in link.drain() {
                world.apply(message);
            }
            if world.started() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        assert!(world.started());
        assert!(world.me().unwrap().role != Role::Random);
    }
}
