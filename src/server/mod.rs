//! Server-side framing: requests, parsed with the environment-style
//! header normalization CGI/WSGI-adjacent application layers expect.

use futures::Stream;
use std::io;
use std::sync::Arc;

pub use crate::frame::Config;
use crate::message::Message;
use crate::role::Server;

/// A stream of parsed HTTP requests, yielded in the order they arrived on
/// `input`.
///
/// Thin role-bound wrapper around `frame::parse::<Server, _>`; see
/// `crate::frame` for the state machine itself.
pub fn parse<S>(input: S, config: Arc<Config>) -> impl Stream<Item = Result<Message, crate::Error>>
where
    S: Stream<Item = io::Result<bytes::Bytes>> + Send + 'static,
{
    crate::frame::parse::<Server, S>(input, config)
}
