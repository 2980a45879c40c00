use clap::Parser;
use server::network::Server;
use std::time::Duration;

/// Main-method of the application.
/// Parses command-line arguments, binds the socket and runs the server loop.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value_t = shared::DEFAULT_PORT)]
        port: u16,
        /// Seconds of silence before an entity is evicted
        #[clap(long, default_value_t = shared::EXPIRY_WINDOW.as_secs())]
        expiry_secs: u64,
        /// Idle sleep between poll cycles, in milliseconds
        #[clap(long, default_value_t = shared::IDLE_INTERVAL.as_millis() as u64)]
        idle_ms: u64,
    }

    env_logger::init();

    // Parse command line arguments
    let args = Args::parse();

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(
        &address,
        Duration::from_secs(args.expiry_secs),
        Duration::from_millis(args.idle_ms),
    )
    .await?;

    // Handle shutdown gracefully
    tokio::select! {
        _ = server.run() => {}
        _ = tokio::signal::ctrl_c() => {
            println!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
