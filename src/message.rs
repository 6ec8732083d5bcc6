//! The public per-message value yielded by a `FrameParser`, and the body
//! stream attached to it.

use futures::Stream;
use tokio_stream::wrappers::ReceiverStream;

use crate::body::BodyFrame;
use crate::error::Error;
use crate::head::MessageHead;
use crate::headers::HeaderBlock;

/// A request or response's body, as an independent stream of
/// `BodyFrame`s.
///
/// Dropping a `BodyStream` before it completes closes the channel on the
/// producer side; the frame parser observes this the next time it tries
/// to send and stops decoding that body, per the cancellation contract
/// in §5.
pub struct BodyStream {
    inner: ReceiverStream<Result<BodyFrame, Error>>,
}

impl BodyStream {
    pub(crate) fn new(inner: ReceiverStream<Result<BodyFrame, Error>>) -> BodyStream {
        BodyStream { inner }
    }
}

impl Stream for BodyStream {
    type Item = Result<BodyFrame, Error>;

    fn poll_next(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        let this = self.get_mut();
        std::pin::Pin::new(&mut this.inner).poll_next(cx)
    }
}

/// One fully-framed message: its head, its headers (already normalized
/// and combined/folded per the active role), and the body stream that
/// will yield its `BodyFrame`s as they're decoded.
pub struct Message {
    pub head: MessageHead,
    pub headers: HeaderBlock,
    pub body: BodyStream,
}
