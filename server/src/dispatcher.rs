//! Command dispatch for inbound datagrams
//!
//! Each datagram runs through parse, liveness touch and handler lookup.
//! Handlers are registered by name in an explicitly-constructed registry;
//! new commands are added with [`Dispatcher::register`] without changing
//! the dispatch loop. Malformed datagrams and unknown command names are
//! dropped silently: the protocol never sends errors back and nothing a
//! client sends can crash the server.

use crate::session::SessionStore;
use log::debug;
use shared::{format_state, Request};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;

/// A registered protocol command
///
/// Handlers receive the entity id, the raw command body and the sender's
/// address, plus mutable access to the store. The dispatch timestamp is
/// threaded through so handlers never read the clock themselves. Returned
/// bytes, if any, are sent back to the sender fire-and-forget.
pub trait Command: Send + Sync {
    fn execute(
        &self,
        store: &mut SessionStore,
        ident: &str,
        body: &str,
        sender: SocketAddr,
        now: Instant,
    ) -> Option<Vec<u8>>;
}

/// `entity <x> <y>` — records the sender's reported position
///
/// The first body token is x, the remainder of the line is y. A body with
/// no second token is tolerated: liveness was already touched, the
/// position just stays as it was.
pub struct EntityCommand;

impl Command for EntityCommand {
    fn execute(
        &self,
        store: &mut SessionStore,
        ident: &str,
        body: &str,
        _sender: SocketAddr,
        now: Instant,
    ) -> Option<Vec<u8>> {
        match body.split_once(' ') {
            Some((x, y)) => store.set_position(ident, x, y, now),
            None => debug!("Entity {} sent short position body {:?}", ident, body),
        }
        None
    }
}

/// `ping` — replies with a snapshot of every known entity position
pub struct PingCommand;

impl Command for PingCommand {
    fn execute(
        &self,
        store: &mut SessionStore,
        _ident: &str,
        _body: &str,
        _sender: SocketAddr,
        _now: Instant,
    ) -> Option<Vec<u8>> {
        Some(format_state(&store.snapshot()).into_bytes())
    }
}

/// Routes parsed datagrams to their registered command handlers
pub struct Dispatcher {
    commands: HashMap<&'static str, Box<dyn Command>>,
}

impl Dispatcher {
    /// Creates a dispatcher with the built-in `entity` and `ping` commands
    pub fn new() -> Self {
        let mut dispatcher = Self {
            commands: HashMap::new(),
        };
        dispatcher.register("entity", Box::new(EntityCommand));
        dispatcher.register("ping", Box::new(PingCommand));
        dispatcher
    }

    /// Registers a handler under a command name
    pub fn register(&mut self, name: &'static str, command: Box<dyn Command>) {
        self.commands.insert(name, command);
    }

    /// Runs one datagram through the parse/touch/handle pipeline
    ///
    /// Every well-formed datagram refreshes the sender entity's liveness,
    /// whatever its command. Returns the reply payload for the sender, if
    /// the handler produced one.
    pub fn dispatch(
        &self,
        store: &mut SessionStore,
        datagram: &[u8],
        sender: SocketAddr,
        now: Instant,
    ) -> Option<Vec<u8>> {
        let text = match std::str::from_utf8(datagram) {
            Ok(text) => text,
            Err(_) => {
                debug!("Dropping non-UTF-8 datagram from {}", sender);
                return None;
            }
        };

        let request = match Request::parse(text) {
            Some(request) => request,
            None => {
                debug!("Dropping malformed datagram from {}: {:?}", sender, text);
                return None;
            }
        };

        store.touch(request.ident, now);

        match self.commands.get(request.command) {
            Some(command) => command.execute(store, request.ident, request.body, sender, now),
            None => {
                debug!(
                    "Ignoring unknown command {:?} from entity {}",
                    request.command, request.ident
                );
                None
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
