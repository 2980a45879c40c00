use shared::{parse_state, DEFAULT_PORT, MAX_DATAGRAM_SIZE};
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::time::{sleep, Duration};

/// Manual smoke-test client: walks an entity across the map against a
/// running server, pinging after each update and printing the replies.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Create local socket
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Client socket bound to {}", socket.local_addr()?);

    // Server address
    let server_addr = format!("127.0.0.1:{}", DEFAULT_PORT).parse::<SocketAddr>()?;
    println!("Talking to server at {}", server_addr);

    let mut buf = [0u8; MAX_DATAGRAM_SIZE];

    for step in 0..5 {
        // Report a new position
        let update = format!("demo entity {} {}", step * 10, step * 5);
        println!("Sending update: {}", update);
        socket.send_to(update.as_bytes(), server_addr).await?;

        // Ask for the full state
        socket.send_to(b"demo ping", server_addr).await?;

        let (len, addr) = socket.recv_from(&mut buf).await?;
        let reply = String::from_utf8_lossy(&buf[..len]);
        println!("Received {} bytes from {}: {}", len, addr, reply);

        match parse_state(&reply) {
            Some(entities) => {
                for (ident, position) in &entities {
                    println!("  Entity {}: x={}, y={}", ident, position.x, position.y);
                }
            }
            None => println!("Could not parse state reply"),
        }

        // Wait a second between updates
        sleep(Duration::from_secs(1)).await;
    }

    println!("Test client finished");
    Ok(())
}
