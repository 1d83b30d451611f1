use std::pin::Pin;
use std::task::{self, Poll};

use bytes::Bytes;

use crate::provider::ChatProviderError;

/// A streamed response from the advisor backend.
///
/// The response is an ordered sequence of raw byte chunks. Chunks carry
/// no framing guarantees: an event may be split across chunks, and a
/// chunk may even end in the middle of a multi-byte character.
///
/// Dropping the response releases the underlying stream.
pub trait ChatResponse: Sized + Send + 'static {
    /// The error type that may be returned by the provider.
    type Error: ChatProviderError;

    /// Attempts to pull out the next chunk from the response.
    ///
    /// # Return value
    ///
    /// There are several possible return values, each indicating a
    /// distinct response state:
    ///
    /// - `Poll::Pending` means that this response is still waiting for
    ///   the next chunk. Implementations will ensure that the current
    ///   task will be notified when the next chunk may be ready.
    /// - `Poll::Ready(Ok(Some(chunk)))` means the response has a chunk
    ///   to deliver, and may produce further chunks on subsequent
    ///   `poll_next_chunk` calls.
    /// - `Poll::Ready(Ok(None))` means the stream has been closed cleanly.
    /// - `Poll::Ready(Err(error))` means the transport failed while
    ///   reading the response.
    ///
    /// Chunks must be delivered in the order the backend sent them.
    /// Calling this method after completion should always return `None`.
    fn poll_next_chunk(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<Bytes>, Self::Error>>;
}
