//! The frame parser: the `ExpectHead` / `ExpectBody` state machine (§4.2)
//! and the `parse` operation that turns a byte-chunk stream into a stream
//! of `Message`s.

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use log::{debug, trace};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::accumulator::ByteAccumulator;
use crate::body::{BodyDecoder, BodyFrame, ChunkedDecoder, FixedLengthDecoder, LeftoverBaton};
use crate::error::Error;
use crate::headers::{split_header_line, token_equals_ci, HeaderBlock};
use crate::message::{BodyStream, Message};
use crate::role::Role;

/// Resource-tuning knobs for a single parser instance.
///
/// Mirrors the teacher's builder-style `Config`: construct with `new()`,
/// adjust via chained setters, finalize with `done()`. `server::Config`
/// and `client::Config` are both this same type, since neither role
/// needs anything beyond these three fields.
#[derive(Debug, Clone)]
pub struct Config {
    debug: bool,
    message_channel_capacity: usize,
    body_channel_capacity: usize,
}

impl Config {
    pub fn new() -> Config {
        Config {
            debug: false,
            message_channel_capacity: 2,
            body_channel_capacity: 1,
        }
    }

    /// Emit internal state-transition traces at `log::Level::Debug`/`Trace`.
    /// Does not affect parsing semantics.
    pub fn debug(&mut self, value: bool) -> &mut Self {
        self.debug = value;
        self
    }

    /// Bounded capacity of the outer message stream.
    pub fn message_channel_capacity(&mut self, value: usize) -> &mut Self {
        self.message_channel_capacity = value;
        self
    }

    /// Bounded capacity of each message's body stream.
    pub fn body_channel_capacity(&mut self, value: usize) -> &mut Self {
        self.body_channel_capacity = value;
        self
    }

    pub fn done(&mut self) -> Arc<Config> {
        Arc::new(self.clone())
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}

/// Drive `input` through the frame parser for role `R`, returning a
/// stream of parsed messages.
///
/// Spawns one `tokio` task that owns the parser state exclusively; the
/// returned stream is the receiving end of a bounded channel, so dropping
/// it (or simply not polling it) applies backpressure and, if dropped
/// entirely, causes the driving task to stop at its next send and exit.
pub fn parse<R, S>(input: S, config: Arc<Config>) -> impl Stream<Item = Result<Message, Error>>
where
    R: Role + Send + 'static,
    S: Stream<Item = io::Result<Bytes>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.message_channel_capacity);
    tokio::spawn(drive::<R, S>(input, config, tx));
    ReceiverStream::new(rx)
}

async fn drive<R, S>(input: S, config: Arc<Config>, out: mpsc::Sender<Result<Message, Error>>)
where
    R: Role,
    S: Stream<Item = io::Result<Bytes>> + Send + 'static,
{
    tokio::pin!(input);
    let mut acc = ByteAccumulator::new();

    'connection: loop {
        let head = match read_head_line::<R, S>(input.as_mut(), &mut acc).await {
            Ok(Some(head)) => head,
            Ok(None) => return, // clean EOF between messages
            Err(e) => {
                let _ = out.send(Err(e)).await;
                return;
            }
        };
        if config.debug {
            debug!("parsed head line: {:?}", head);
        }

        let cl_key = R::normalize_header_name("Content-Length");
        let te_key = R::normalize_header_name("Transfer-Encoding");
        let trailer_key = R::normalize_header_name("Trailer");

        let mut headers = HeaderBlock::new();
        loop {
            let line = match read_line::<S>(input.as_mut(), &mut acc).await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    let _ = out.send(Err(R::bad("connection closed mid-headers"))).await;
                    return;
                }
                Err(e) => {
                    let _ = out.send(Err(e)).await;
                    return;
                }
            };
            if line.is_empty() {
                break;
            }
            if line.starts_with(' ') || line.starts_with('\t') {
                if !headers.fold_last(line.trim_start()) {
                    let _ = out.send(Err(R::bad("folded header with no prior header"))).await;
                    return;
                }
                continue;
            }
            let Some((name, value)) = split_header_line(&line) else {
                let _ = out.send(Err(R::bad("malformed header line"))).await;
                return;
            };
            let name = R::normalize_header_name(name.trim());
            if name == cl_key && headers.get(&name).is_some() {
                let _ = out.send(Err(R::bad("repeated Content-Length"))).await;
                return;
            }
            headers.insert_or_append(name, value);
        }

        R::inject_synthetic_headers(&head, &mut headers);

        let is_chunked = headers
            .get(&te_key)
            .map(|v| token_equals_ci(v.rsplit(',').next().unwrap_or(v), "chunked"))
            .unwrap_or(false);
        let trailer_announced = headers.get(&trailer_key).is_some();

        let decoder = if is_chunked {
            Some(BodyDecoder::Chunked(ChunkedDecoder::new(trailer_announced)))
        } else if let Some(raw) = headers.get(&cl_key) {
            match raw.parse::<u64>() {
                Ok(n) => Some(BodyDecoder::Fixed(FixedLengthDecoder::new(n))),
                Err(_) => {
                    let _ = out.send(Err(R::bad("malformed Content-Length"))).await;
                    return;
                }
            }
        } else {
            None
        };

        let Some(mut decoder) = decoder else {
            let (_tx, rx) = mpsc::channel::<Result<BodyFrame, Error>>(1);
            let message = Message {
                head,
                headers,
                body: BodyStream::new(ReceiverStream::new(rx)),
            };
            if out.send(Ok(message)).await.is_err() {
                return;
            }
            continue 'connection;
        };

        let (body_tx, body_rx) = mpsc::channel(config.body_channel_capacity);
        let mut baton = LeftoverBaton::new();

        // The Message (and the receiving end of body_tx) must reach the
        // consumer *before* the decoder is fed the seed bytes. A seed can
        // already hold the entire body — possibly several chunks' worth —
        // and `body_tx` is bounded, so feeding it first can block this
        // task on a full channel that only the consumer of `message.body`
        // can drain. Sending the message first lets that consumer start
        // draining concurrently while this task keeps feeding the decoder.
        let message = Message {
            head,
            headers,
            body: BodyStream::new(ReceiverStream::new(body_rx)),
        };
        if out.send(Ok(message)).await.is_err() {
            return;
        }

        let seed = acc.take_remaining();
        if let Err(e) = decoder.feed(seed, &body_tx, &mut baton, R::bad).await {
            let _ = body_tx.send(Err(e)).await;
            return;
        }

        if baton.is_fulfilled() {
            acc = ByteAccumulator::from_bytes(baton.take().unwrap());
            continue 'connection;
        }

        loop {
            match input.as_mut().next().await {
                Some(Ok(bytes)) => {
                    if config.debug {
                        trace!("feeding {} body bytes", bytes.len());
                    }
                    if let Err(e) = decoder.feed(bytes, &body_tx, &mut baton, R::bad).await {
                        let _ = body_tx.send(Err(e)).await;
                        return;
                    }
                    if baton.is_fulfilled() {
                        acc = ByteAccumulator::from_bytes(baton.take().unwrap());
                        continue 'connection;
                    }
                }
                Some(Err(e)) => {
                    let _ = body_tx.send(Err(Error::Io(e))).await;
                    return;
                }
                None => {
                    let _ = body_tx
                        .send(Err(R::bad("connection closed before body finished")))
                        .await;
                    return;
                }
            }
        }
    }
}

/// Read one line out of the accumulator for the header loop, pulling more
/// transport chunks as needed. Unlike `read_head_line`, any EOF here is
/// mid-message — there is no "clean" place to stop once a head line has
/// already been parsed — so the caller treats `Ok(None)` as an error
/// condition itself.
async fn read_line<S>(
    mut input: std::pin::Pin<&mut S>,
    acc: &mut ByteAccumulator,
) -> Result<Option<String>, Error>
where
    S: Stream<Item = io::Result<Bytes>>,
{
    loop {
        if let Some(line) = acc.try_consume_crlf_line() {
            return Ok(Some(line));
        }
        match input.as_mut().next().await {
            Some(Ok(bytes)) => acc.append(&bytes),
            Some(Err(e)) => return Err(Error::Io(e)),
            None => return Ok(None),
        }
    }
}

/// Read the request/status line. `Ok(None)` only means the transport
/// ended with nothing at all buffered — the legitimate place to stop
/// between keep-alive messages. A transport end with a partial line
/// already buffered is a framing error, not a clean stop.
async fn read_head_line<R, S>(
    mut input: std::pin::Pin<&mut S>,
    acc: &mut ByteAccumulator,
) -> Result<Option<crate::head::MessageHead>, Error>
where
    R: Role,
    S: Stream<Item = io::Result<Bytes>>,
{
    loop {
        if let Some(line) = acc.try_consume_crlf_line() {
            return R::parse_head_line(&line).map(Some);
        }
        match input.as_mut().next().await {
            Some(Ok(bytes)) => acc.append(&bytes),
            Some(Err(e)) => return Err(Error::Io(e)),
            None if acc.is_empty() => return Ok(None),
            None => return Err(R::bad("connection closed mid-request-line")),
        }
    }
}
