use clap::Parser;
use log::{error, info};
use server::network::{Server, ServerConfig};
use server::phase::PhaseTable;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Authoritative town game session server")]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Clock updates per second
    #[arg(short, long, default_value = "10")]
    tick_rate: u32,

    /// Multiplier applied to every phase duration
    #[arg(long, default_value = "1.0")]
    day_scale: f32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    let config = ServerConfig {
        tick_rate: args.tick_rate,
        phase_table: PhaseTable::default().scaled(args.day_scale),
    };

    info!(
        "Starting session server on {} at {} ticks/s",
        addr, args.tick_rate
    );

    let server = Server::new(&addr, config).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
