//! UDP server loop: drain pending datagrams, sweep stale entities, idle
//!
//! A single task owns the socket, the session store and the dispatcher, so
//! no locking is needed anywhere. Each cycle drains everything the socket
//! has buffered (a receive that would block means "no more data right
//! now", not an error), expires entities past the liveness window, then
//! sleeps briefly to yield the CPU.

use crate::dispatcher::Dispatcher;
use crate::session::SessionStore;
use log::{debug, info, warn};
use shared::MAX_DATAGRAM_SIZE;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;

/// The rendezvous server: socket, store and dispatcher under one owner
pub struct Server {
    socket: UdpSocket,
    store: SessionStore,
    dispatcher: Dispatcher,
    expiry_window: Duration,
    idle_interval: Duration,
}

impl Server {
    /// Binds the listening socket
    ///
    /// The bind is the only fatal error in the program; everything after
    /// it is best-effort.
    pub async fn new(
        addr: &str,
        expiry_window: Duration,
        idle_interval: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind(addr).await?;
        info!("Listening on {}", socket.local_addr()?);

        Ok(Server {
            socket,
            store: SessionStore::new(),
            dispatcher: Dispatcher::new(),
            expiry_window,
            idle_interval,
        })
    }

    /// Address the server actually bound, useful with port 0
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receives until the socket would block, dispatching each datagram
    ///
    /// Replies are fire-and-forget: a failed send is logged and dropped,
    /// never retried or surfaced.
    fn drain_datagrams(&mut self) {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];

        loop {
            match self.socket.try_recv_from(&mut buf) {
                Ok((len, sender)) => {
                    let now = Instant::now();
                    if let Some(reply) =
                        self.dispatcher
                            .dispatch(&mut self.store, &buf[..len], sender, now)
                    {
                        if let Err(e) = self.socket.try_send_to(&reply, sender) {
                            debug!("Failed to send reply to {}: {}", sender, e);
                        }
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!("Error receiving datagram: {}", e);
                    break;
                }
            }
        }
    }

    /// Expires every entity silent for the full liveness window
    fn sweep(&mut self, now: Instant) {
        let removed = self.store.expire_older_than(now, self.expiry_window);
        if removed > 0 {
            debug!("Swept {} stale entities", removed);
        }
    }

    /// Runs the drain/sweep/idle cycle until the task is dropped
    pub async fn run(&mut self) {
        info!("Server started");

        loop {
            self.drain_datagrams();
            self.sweep(Instant::now());
            tokio::time::sleep(self.idle_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{parse_state, Position, EXPIRY_WINDOW, IDLE_INTERVAL};
    use std::net::UdpSocket as StdUdpSocket;

    async fn test_server() -> Server {
        Server::new("127.0.0.1:0", EXPIRY_WINDOW, IDLE_INTERVAL)
            .await
            .expect("failed to bind test server")
    }

    fn client_for(server: &Server) -> (StdUdpSocket, SocketAddr) {
        let socket = StdUdpSocket::bind("127.0.0.1:0").expect("failed to bind client socket");
        socket
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        let addr = server.local_addr().unwrap();
        (socket, addr)
    }

    /// Loopback delivery is fast but not instant; give the kernel a moment
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_drain_applies_entity_updates() {
        let mut server = test_server().await;
        let (client, addr) = client_for(&server);

        client.send_to(b"p1 entity 10 20", addr).unwrap();
        settle().await;
        server.drain_datagrams();

        assert_eq!(
            server.store.get("p1").unwrap().position,
            Some(Position::new("10", "20"))
        );
    }

    #[tokio::test]
    async fn test_drain_stops_on_empty_socket() {
        let mut server = test_server().await;

        // nothing queued; must return without blocking
        server.drain_datagrams();
        assert!(server.store.is_empty());
    }

    #[tokio::test]
    async fn test_ping_reply_reaches_sender() {
        let mut server = test_server().await;
        let (client, addr) = client_for(&server);

        client.send_to(b"p1 entity 10 20", addr).unwrap();
        client.send_to(b"p1 ping", addr).unwrap();
        settle().await;
        server.drain_datagrams();

        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let (len, _) = client.recv_from(&mut buf).unwrap();
        let entities = parse_state(std::str::from_utf8(&buf[..len]).unwrap()).unwrap();

        assert_eq!(entities.get("p1"), Some(&Position::new("10", "20")));
    }

    #[tokio::test]
    async fn test_garbage_does_not_disturb_the_loop() {
        let mut server = test_server().await;
        let (client, addr) = client_for(&server);

        client.send_to(b"garbage", addr).unwrap();
        client.send_to(&[0xff, 0xfe], addr).unwrap();
        client.send_to(b"p1 entity 1 2", addr).unwrap();
        settle().await;
        server.drain_datagrams();

        // only the valid datagram left a trace
        assert_eq!(server.store.len(), 1);
        assert!(server.store.get("p1").is_some());
    }

    #[tokio::test]
    async fn test_sweep_uses_configured_window() {
        let mut server = Server::new("127.0.0.1:0", Duration::from_millis(50), IDLE_INTERVAL)
            .await
            .unwrap();

        let start = Instant::now();
        server.store.touch("p1", start);

        server.sweep(start + Duration::from_millis(49));
        assert_eq!(server.store.len(), 1);

        server.sweep(start + Duration::from_millis(50));
        assert!(server.store.is_empty());
    }
}
