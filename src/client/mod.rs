//! Client-side framing: responses, parsed with case-folded header names
//! plus the two synthetic `x-server-protocol`/`x-server-status-message`
//! entries (§3/§6).

use futures::Stream;
use std::io;
use std::sync::Arc;

pub use crate::frame::Config;
use crate::message::Message;
use crate::role::Client;

/// A stream of parsed HTTP responses, yielded in the order they arrived
/// on `input`.
///
/// Thin role-bound wrapper around `frame::parse::<Client, _>`; see
/// `crate::frame` for the state machine itself.
pub fn parse<S>(input: S, config: Arc<Config>) -> impl Stream<Item = Result<Message, crate::Error>>
where
    S: Stream<Item = io::Result<bytes::Bytes>> + Send + 'static,
{
    crate::frame::parse::<Client, S>(input, config)
}
