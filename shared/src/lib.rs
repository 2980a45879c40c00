//! Wire protocol shared by the rendezvous server, the test client and the
//! integration tests.
//!
//! Everything on the wire is UTF-8 text, one message per datagram:
//!
//! - Request: `<entity-id> <command> <rest-of-line...>`
//! - `ping` reply: `state {[id1]={x=X1,y=Y1},[id2]={x=X2,y=Y2}}`
//!
//! Coordinates are carried verbatim as text. The server never interprets
//! them as numbers, it only echoes them back in `ping` replies.

use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 4242;
pub const EXPIRY_WINDOW: Duration = Duration::from_secs(3);
pub const IDLE_INTERVAL: Duration = Duration::from_millis(10);
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// Last reported coordinates of an entity, stored as the client sent them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub x: String,
    pub y: String,
}

impl Position {
    pub fn new(x: &str, y: &str) -> Self {
        Self {
            x: x.to_string(),
            y: y.to_string(),
        }
    }
}

/// One parsed request line.
///
/// Borrows from the datagram buffer; the dispatcher only needs it for the
/// duration of a single dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    pub ident: &'a str,
    pub command: &'a str,
    pub body: &'a str,
}

impl<'a> Request<'a> {
    /// Parses `<entity-id> <command> <rest-of-line...>`.
    ///
    /// The first space-delimited token is the entity id, the second is the
    /// command name, and everything after the second space is the body,
    /// embedded spaces included. The body may be empty (`p1 ping` is a
    /// complete message); id and command must not be. Returns `None` for
    /// anything else, which the caller treats as a silent drop.
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut parts = line.splitn(3, ' ');
        let ident = parts.next()?;
        let command = parts.next()?;
        let body = parts.next().unwrap_or("");

        if ident.is_empty() || command.is_empty() {
            return None;
        }

        Some(Request {
            ident,
            command,
            body,
        })
    }
}

/// Renders a snapshot as a `state {...}` reply, one entry per entity in
/// the order given.
pub fn format_state(entries: &[(String, Position)]) -> String {
    let entries: Vec<String> = entries
        .iter()
        .map(|(ident, position)| format!("[{}]={{x={},y={}}}", ident, position.x, position.y))
        .collect();
    format!("state {{{}}}", entries.join(","))
}

/// Parses a `state {...}` reply back into a map of entity positions.
///
/// Best-effort inverse of [`format_state`], used by the test client and the
/// integration tests to assert on replies without caring about entry order.
pub fn parse_state(reply: &str) -> Option<HashMap<String, Position>> {
    let inner = reply.strip_prefix("state {")?.strip_suffix('}')?;

    let mut entities = HashMap::new();
    if inner.is_empty() {
        return Some(entities);
    }

    for entry in inner.split("},") {
        let entry = entry.strip_suffix('}').unwrap_or(entry);
        let (ident, coords) = entry.split_once("]={")?;
        let ident = ident.strip_prefix('[')?;
        let (x, y) = coords.split_once(",y=")?;
        let x = x.strip_prefix("x=")?;
        entities.insert(ident.to_string(), Position::new(x, y));
    }

    Some(entities)
}
