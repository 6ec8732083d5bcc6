//! The two body decoders (`Content-Length` and `chunked`, §4.3/§4.4) and
//! the leftover handoff between a body decoder and the frame parser.

use bytes::Bytes;
use httparse::{parse_chunk_size, Status as ChunkStatus};
use tokio::sync::mpsc::Sender;

use crate::accumulator::ByteAccumulator;
use crate::error::Error;
use crate::headers::{normalize_env_name, HeaderBlock};

/// One item produced on a message's body stream.
///
/// For a chunked body whose trailers are non-empty, `Trailers` is emitted
/// once, immediately before the stream completes; plain `Content-Length`
/// bodies and empty-trailer chunked bodies never emit it.
#[derive(Debug, Clone)]
pub enum BodyFrame {
    Chunk(Bytes),
    Trailers(HeaderBlock),
}

/// A single-assignment carrier for the bytes that arrived past the end of
/// the current message's body but logically belong to the next message.
///
/// The distilled spec describes this as an awaitable one-shot object
/// handed between the body decoder (producer) and the frame parser
/// (consumer). Since both live in the same cooperative task and the
/// decoder always fulfills the baton synchronously within `feed`, before
/// returning, there is no real cross-task suspension to model — see
/// DESIGN.md for the Open Question resolution that keeps this as a plain
/// `Option<Bytes>` wrapper instead of a channel.
#[derive(Debug, Default)]
pub struct LeftoverBaton(Option<Bytes>);

impl LeftoverBaton {
    pub fn new() -> LeftoverBaton {
        LeftoverBaton(None)
    }

    /// Fulfill the baton. Panics if it was already fulfilled: a body
    /// decoder only ever completes once.
    pub fn fulfill(&mut self, bytes: Bytes) {
        assert!(self.0.is_none(), "leftover baton fulfilled twice");
        self.0 = Some(bytes);
    }

    pub fn is_fulfilled(&self) -> bool {
        self.0.is_some()
    }

    /// Consume the fulfilled value. Intended to be called exactly once, by
    /// the frame parser, after it observes `is_fulfilled()`.
    pub fn take(&mut self) -> Option<Bytes> {
        self.0.take()
    }
}

/// `ExpectSize` / `ExpectChunkData` / `ExpectTrailer`, per §3.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChunkedState {
    ExpectSize,
    ExpectChunkData { remaining: usize },
    ExpectTrailer,
}

/// The `chunked` transfer-coding decoder.
#[derive(Debug)]
pub struct ChunkedDecoder {
    buf: ByteAccumulator,
    state: ChunkedState,
    trailer_announced: bool,
    trailers: HeaderBlock,
}

impl ChunkedDecoder {
    pub fn new(trailer_announced: bool) -> ChunkedDecoder {
        ChunkedDecoder {
            buf: ByteAccumulator::new(),
            state: ChunkedState::ExpectSize,
            trailer_announced,
            trailers: HeaderBlock::new(),
        }
    }

    /// Feed more transport bytes in, running the state machine until it
    /// either blocks for more data or the body completes (fulfilling
    /// `baton`). `bad` selects `BadRequest` vs `BadResponse` for the
    /// caller's role.
    pub async fn feed(
        &mut self,
        data: Bytes,
        tx: &Sender<Result<BodyFrame, Error>>,
        baton: &mut LeftoverBaton,
        bad: fn(&'static str) -> Error,
    ) -> Result<(), Error> {
        self.buf.append(&data);
        loop {
            match self.state {
                ChunkedState::ExpectSize => {
                    match parse_chunk_size(self.buf.as_slice()) {
                        Ok(ChunkStatus::Partial) => return Ok(()),
                        Err(_) => return Err(bad("invalid chunk size")),
                        Ok(ChunkStatus::Complete((consumed, size))) => {
                            self.buf.consume_prefix(consumed)
                                .expect("consumed <= buffered length");
                            if size == 0 {
                                if self.trailer_announced {
                                    self.state = ChunkedState::ExpectTrailer;
                                } else {
                                    self.complete(tx, baton).await;
                                    return Ok(());
                                }
                            } else {
                                self.state = ChunkedState::ExpectChunkData {
                                    remaining: size as usize,
                                };
                            }
                        }
                    }
                }
                ChunkedState::ExpectChunkData { remaining } => {
                    if self.buf.len() < remaining + 2 {
                        return Ok(());
                    }
                    let payload = self.buf.consume_prefix(remaining)
                        .expect("buffered length checked above");
                    // the trailing CRLF is not validated, matching the
                    // teacher's own chunked decoder
                    self.buf.consume_prefix(2).expect("checked above");
                    if tx.send(Ok(BodyFrame::Chunk(payload))).await.is_err() {
                        return Ok(());
                    }
                    self.state = ChunkedState::ExpectSize;
                }
                ChunkedState::ExpectTrailer => {
                    let Some(line) = self.buf.try_consume_crlf_line() else {
                        return Ok(());
                    };
                    if line.is_empty() {
                        self.complete(tx, baton).await;
                        return Ok(());
                    } else if line.starts_with(' ') || line.starts_with('\t')
                    {
                        if !self.trailers.fold_last(line.trim_start()) {
                            return Err(bad("folded trailer with no header"));
                        }
                    } else {
                        let (name, value) = crate::headers::split_header_line(&line)
                            .ok_or_else(|| bad("malformed trailer line"))?;
                        self.trailers
                            .insert_or_append(normalize_env_name(name), value);
                    }
                }
            }
        }
    }

    async fn complete(
        &mut self,
        tx: &Sender<Result<BodyFrame, Error>>,
        baton: &mut LeftoverBaton,
    ) {
        if !self.trailers.is_empty() {
            let trailers = std::mem::take(&mut self.trailers);
            let _ = tx.send(Ok(BodyFrame::Trailers(trailers))).await;
        }
        baton.fulfill(self.buf.take_remaining());
    }
}

/// The `Content-Length` decoder: counts bytes until exactly the announced
/// length has passed, then hands everything past that point to the
/// leftover baton.
#[derive(Debug)]
pub struct FixedLengthDecoder {
    bytes_read: u64,
    content_length: u64,
}

impl FixedLengthDecoder {
    pub fn new(content_length: u64) -> FixedLengthDecoder {
        FixedLengthDecoder { bytes_read: 0, content_length }
    }

    pub async fn feed(
        &mut self,
        data: Bytes,
        tx: &Sender<Result<BodyFrame, Error>>,
        baton: &mut LeftoverBaton,
    ) {
        let remaining_total = self.content_length - self.bytes_read;
        if (data.len() as u64) < remaining_total {
            self.bytes_read += data.len() as u64;
            if !data.is_empty() {
                let _ = tx.send(Ok(BodyFrame::Chunk(data))).await;
            }
        } else {
            let remaining = remaining_total as usize;
            if remaining > 0 {
                let _ = tx.send(Ok(BodyFrame::Chunk(data.slice(0..remaining)))).await;
            }
            self.bytes_read = self.content_length;
            baton.fulfill(data.slice(remaining..));
        }
    }
}

/// The sum type embedded directly in the frame parser's `ExpectBody`
/// state, per the distilled spec's design notes (a plain enum, not a
/// trait object, since there are exactly two variants and no plugin
/// surface for more).
#[derive(Debug)]
pub enum BodyDecoder {
    Fixed(FixedLengthDecoder),
    Chunked(ChunkedDecoder),
}

impl BodyDecoder {
    pub async fn feed(
        &mut self,
        data: Bytes,
        tx: &Sender<Result<BodyFrame, Error>>,
        baton: &mut LeftoverBaton,
        bad: fn(&'static str) -> Error,
    ) -> Result<(), Error> {
        match self {
            BodyDecoder::Fixed(d) => {
                d.feed(data, tx, baton).await;
                Ok(())
            }
            BodyDecoder::Chunked(d) => d.feed(data, tx, baton, bad).await,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::sync::mpsc;

    async fn drain(mut rx: mpsc::Receiver<Result<BodyFrame, Error>>) -> Vec<BodyFrame> {
        let mut out = Vec::new();
        while let Some(item) = rx.recv().await {
            out.push(item.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn fixed_length_splits_leftover() {
        let (tx, rx) = mpsc::channel(8);
        let mut dec = FixedLengthDecoder::new(5);
        let mut baton = LeftoverBaton::new();
        dec.feed(Bytes::from_static(b"hello WORLD"), &tx, &mut baton).await;
        drop(tx);
        assert!(baton.is_fulfilled());
        assert_eq!(baton.take().unwrap().as_ref(), b" WORLD");
        let frames = drain(rx).await;
        match &frames[..] {
            [BodyFrame::Chunk(b)] => assert_eq!(b.as_ref(), b"hello"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn fixed_length_zero_completes_immediately() {
        let (tx, rx) = mpsc::channel(8);
        let mut dec = FixedLengthDecoder::new(0);
        let mut baton = LeftoverBaton::new();
        dec.feed(Bytes::from_static(b"next request"), &tx, &mut baton).await;
        drop(tx);
        assert_eq!(baton.take().unwrap().as_ref(), b"next request");
        assert!(drain(rx).await.is_empty());
    }

    #[tokio::test]
    async fn chunked_basic_two_chunks() {
        let (tx, rx) = mpsc::channel(8);
        let mut dec = ChunkedDecoder::new(false);
        let mut baton = LeftoverBaton::new();
        dec.feed(
            Bytes::from_static(b"5\r\nHello\r\n6\r\n World\r\n0\r\n\r\n"),
            &tx,
            &mut baton,
            Error::BadRequest,
        )
        .await
        .unwrap();
        drop(tx);
        assert!(baton.is_fulfilled());
        let frames = drain(rx).await;
        match &frames[..] {
            [BodyFrame::Chunk(a), BodyFrame::Chunk(b)] => {
                assert_eq!(a.as_ref(), b"Hello");
                assert_eq!(b.as_ref(), b" World");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn chunked_across_arbitrary_splits() {
        let whole = b"3\r\nabc\r\n0\r\n\r\n";
        for split in 0..whole.len() {
            let (tx, rx) = mpsc::channel(8);
            let mut dec = ChunkedDecoder::new(false);
            let mut baton = LeftoverBaton::new();
            dec.feed(Bytes::copy_from_slice(&whole[..split]), &tx, &mut baton, Error::BadRequest)
                .await
                .unwrap();
            dec.feed(Bytes::copy_from_slice(&whole[split..]), &tx, &mut baton, Error::BadRequest)
                .await
                .unwrap();
            drop(tx);
            assert!(baton.is_fulfilled(), "split at {split}");
            let frames = drain(rx).await;
            match &frames[..] {
                [BodyFrame::Chunk(a)] => assert_eq!(a.as_ref(), b"abc"),
                other => panic!("split {split}: unexpected: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn chunked_with_trailer() {
        let (tx, rx) = mpsc::channel(8);
        let mut dec = ChunkedDecoder::new(true);
        let mut baton = LeftoverBaton::new();
        dec.feed(
            Bytes::from_static(b"3\r\nabc\r\n0\r\nX-Checksum: 42\r\n\r\n"),
            &tx,
            &mut baton,
            Error::BadRequest,
        )
        .await
        .unwrap();
        drop(tx);
        assert!(baton.is_fulfilled());
        let frames = drain(rx).await;
        match &frames[..] {
            [BodyFrame::Chunk(c), BodyFrame::Trailers(t)] => {
                assert_eq!(c.as_ref(), b"abc");
                assert_eq!(t.get("HTTP_X_CHECKSUM"), Some("42"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn chunk_extension_is_ignored() {
        let (tx, rx) = mpsc::channel(8);
        let mut dec = ChunkedDecoder::new(false);
        let mut baton = LeftoverBaton::new();
        dec.feed(
            Bytes::from_static(b"3;foo=bar\r\nabc\r\n0\r\n\r\n"),
            &tx,
            &mut baton,
            Error::BadRequest,
        )
        .await
        .unwrap();
        drop(tx);
        let frames = drain(rx).await;
        match &frames[..] {
            [BodyFrame::Chunk(c)] => assert_eq!(c.as_ref(), b"abc"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_hex_chunk_size_is_bad_request() {
        let (tx, _rx) = mpsc::channel(8);
        let mut dec = ChunkedDecoder::new(false);
        let mut baton = LeftoverBaton::new();
        let err = dec
            .feed(Bytes::from_static(b"zz\r\n"), &tx, &mut baton, Error::BadRequest)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[tokio::test]
    async fn leftover_past_terminator_is_preserved() {
        let (tx, rx) = mpsc::channel(8);
        let mut dec = ChunkedDecoder::new(false);
        let mut baton = LeftoverBaton::new();
        dec.feed(
            Bytes::from_static(b"0\r\n\r\nGET / HTTP/1.1\r\n"),
            &tx,
            &mut baton,
            Error::BadRequest,
        )
        .await
        .unwrap();
        drop(tx);
        drain(rx).await;
        assert_eq!(baton.take().unwrap().as_ref(), b"GET / HTTP/1.1\r\n");
    }
}
