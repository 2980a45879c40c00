//! # UDP Rendezvous Server Library
//!
//! This library implements a minimal rendezvous server over UDP. Clients
//! send short text commands identifying an entity and a payload; the
//! server keeps ephemeral per-entity state and, on request, sends the
//! full known state back to the requester. An entity stays known only
//! while its client keeps sending; silence beyond a fixed window evicts
//! its state automatically.
//!
//! ## Core Responsibilities
//!
//! ### Session Liveness
//! Every recognized datagram refreshes its sender's last-seen timestamp.
//! A periodic sweep removes entities whose timestamp has aged past the
//! expiry window, so the store cannot grow without bound when clients
//! disappear without saying goodbye.
//!
//! ### Command Dispatch
//! Inbound datagrams are parsed into (entity id, command, body) and
//! routed through a registry of named command handlers. Unknown commands
//! and malformed datagrams are dropped silently; nothing a client sends
//! can crash the server or provoke an error reply.
//!
//! ### State Broadcast
//! The `ping` command answers with a single-datagram snapshot of every
//! known entity position, serialized as a textual map literal.
//!
//! ## Architecture Design
//!
//! ### Single-Task Event Loop
//! One task owns the socket, the session store and the dispatcher. Each
//! cycle drains all currently pending datagrams, sweeps stale entities,
//! then idles briefly. There is no concurrent access to the store, so no
//! locking discipline is required.
//!
//! ### Best-Effort UDP
//! Datagrams are unauthenticated, unordered and unacknowledged. Replies
//! are fire-and-forget; send failures are logged and forgotten.
//!
//! ## Module Organization
//!
//! ### Session Module (`session`)
//! The authoritative entity store: position state, liveness timestamps
//! and the expiry sweep, all in one record per entity id.
//!
//! ### Dispatcher Module (`dispatcher`)
//! Wire-line parsing, the command handler trait and the built-in
//! `entity` and `ping` commands.
//!
//! ### Network Module (`network`)
//! Socket ownership and the drain/sweep/idle server loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Bind on the default port with a 3s liveness window, polling every 10ms
//!     let mut server = Server::new(
//!         "0.0.0.0:4242",
//!         Duration::from_secs(3),
//!         Duration::from_millis(10),
//!     )
//!     .await?;
//!
//!     // Runs the drain/sweep/idle cycle until the process is terminated
//!     server.run().await;
//!
//!     Ok(())
//! }
//! ```

pub mod dispatcher;
pub mod network;
pub mod session;
