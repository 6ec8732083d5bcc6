use std::io;

use quick_error::quick_error;

quick_error! {
    /// The error taxonomy for the framing core.
    ///
    /// Every variant is fatal for the connection's output stream: once
    /// emitted, the frame parser task stops polling the transport and the
    /// stream that carried the error is the last thing the consumer sees.
    #[derive(Debug)]
    pub enum Error {
        /// The request/status line names something that looks like an HTTP
        /// version (`HTTP/<digits>.<digits>`) other than `1.0`/`1.1`.
        ///
        /// `looks_http_ish` lets a caller fall back to another protocol
        /// handler on the same bytes when the line didn't look like HTTP at
        /// all (see `BadRequest`/`BadResponse` for that case instead).
        UnsupportedProtocol(looks_http_ish: bool) {
            display("unsupported HTTP version (looks_http_ish={})",
                    looks_http_ish)
        }
        /// Malformed request framing: bad request line, orphan header fold,
        /// unparsable `Content-Length`, non-hex chunk size, and so on.
        BadRequest(reason: &'static str) {
            display("bad request: {}", reason)
        }
        /// Malformed response framing, same conditions as `BadRequest` but
        /// encountered while parsing a response.
        BadResponse(reason: &'static str) {
            display("bad response: {}", reason)
        }
        /// A framing feature that is recognized but not implemented by this
        /// core (reserved for extensions such as `multipart/byteranges`;
        /// never raised by the `Content-Length`/`chunked` decoders).
        ServerError(reason: &'static str) {
            display("server error: {}", reason)
        }
        /// Failure reading the underlying byte-chunk stream itself, as
        /// opposed to a framing error in the bytes it produced.
        Io(err: io::Error) {
            display("I/O error: {}", err)
            from()
            source(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
