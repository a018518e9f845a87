use clap::Parser;
use client::network::ClientLink;
use client::world::World;
use log::info;
use shared::message::Message;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, MissedTickBehavior};

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal client for the town game", long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:5000")]
    server: String,

    /// Display name announced to the server
    #[arg(short, long, default_value = "Wanderer")]
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    info!("Connecting to {}", args.server);
    let mut link = ClientLink::connect(&args.server).await?;
    let mut world = World::new();

    link.send(&Message::UpdateProfile {
        name: args.name.clone(),
        custom: serde_json::Value::Null,
    })
    .await?;

    println!(
        "Connected as '{}'. Type to chat; /start begins the game, /skip skips the phase, /who lists players.",
        args.name
    );

    let mut update_interval = interval(Duration::from_millis(100));
    update_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    let mut last_day = 0;
    let mut chat_seen = 0;

    loop {
        tokio::select! {
            _ = update_interval.tick() => {
                for message in link.drain() {
                    world.apply(message);
                }
                if link.is_closed() {
                    println!("Server closed the connection.");
                    break;
                }

                if world.day() != last_day {
                    last_day = world.day();
                    println!("--- Day {} ({}) ---", world.day(), world.phase_name());
                    for line in world.latest_news() {
                        println!("NEWS: {}", line);
                    }
                }
                for line in &world.chat_log()[chat_seen..] {
                    println!("[{}] {}", line.sender, line.text);
                }
                chat_seen = world.chat_log().len();

                if let Some(winner) = world.winner() {
                    println!("Game over: {} wins.", winner);
                    break;
                }
            },

            line = lines.next_line() => {
                match line? {
                    Some(text) if text.trim() == "/start" => {
                        link.send(&Message::StartGame).await?;
                    }
                    Some(text) if text.trim() == "/skip" => {
                        link.send(&Message::SkipPhase).await?;
                    }
                    Some(text) if text.trim() == "/who" => {
                        for record in world.roster() {
                            println!(
                                "  {:>3}  {:<16} {:?}{}",
                                record.id,
                                record.name,
                                record.group,
                                if record.alive { "" } else { "  (dead)" }
                            );
                        }
                    }
                    Some(text) if !text.trim().is_empty() => {
                        link.send(&Message::Chat {
                            message: text,
                            sender_name: None,
                        }).await?;
                    }
                    Some(_) => {}
                    None => break,
                }
            },
        }
    }

    Ok(())
}
