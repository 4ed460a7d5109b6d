use clap::Parser;
use server::network::{Server, ServerConfig};
use server::room::RoomConfig;

/// Command line arguments for the relay server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Tick rate (simulation updates per second)
    #[arg(short, long, default_value = "60")]
    tick_rate: u32,

    /// Maximum concurrent connections
    #[arg(long, default_value = "64")]
    max_clients: usize,

    /// Players per room
    #[arg(long, default_value = "4")]
    room_size: usize,

    /// Starting stocks per player
    #[arg(long, default_value = "3")]
    stocks: u32,

    /// Match time limit in seconds
    #[arg(long, default_value = "180")]
    time_limit: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let config = ServerConfig {
        tick_rate: args.tick_rate,
        max_clients: args.max_clients,
        room: RoomConfig {
            max_players: args.room_size,
            stock_count: args.stocks,
            time_limit: args.time_limit,
            ..RoomConfig::default()
        },
    };

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(&address, config).await?;
    server.run().await
}
