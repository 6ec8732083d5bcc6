//! An incremental, reactive HTTP/1.x message framer built on `tokio`.
//!
//! This crate turns an asynchronous stream of arbitrary-sized byte chunks
//! (as they arrive on a socket, in a file, or from any other transport)
//! into a stream of parsed HTTP messages, each carrying its own lazily
//! produced body stream. It supports keep-alive: message boundaries are
//! reframed across chunk splits without assuming any particular chunking
//! from the transport.
//!
//! The crate does not open sockets, write responses, or manage connection
//! lifecycle — it is the framing core two different callers (`server` and
//! `client`) build on.

pub mod accumulator;
pub mod body;
pub mod error;
pub mod frame;
pub mod head;
pub mod headers;
pub mod message;
pub mod role;
pub mod version;

pub mod client;
pub mod server;

pub use error::{Error, Result};
pub use message::{BodyStream, Message};
pub use version::Version;
