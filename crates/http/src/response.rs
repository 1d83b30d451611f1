use std::fmt::{self, Debug};
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use course_advisor_model::{ChatResponse, ErrorKind};
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::{Chunks, ChunksError};

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextChunk = (Result<Option<Bytes>, ChunksError>, Chunks);

pin_project! {
    /// A streamed response from the advisor backend.
    pub struct AdvisorResponse {
        next_chunk_fut: Option<PinnedFuture<NextChunk>>,
    }
}

impl AdvisorResponse {
    #[inline]
    pub(crate) fn from_chunks(chunks: Chunks) -> Self {
        Self {
            next_chunk_fut: Some(next_chunk(chunks)),
        }
    }
}

impl Debug for AdvisorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvisorResponse")
            .field("finished", &self.next_chunk_fut.is_none())
            .finish_non_exhaustive()
    }
}

impl ChatResponse for AdvisorResponse {
    type Error = crate::Error;

    fn poll_next_chunk(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<Bytes>, Self::Error>> {
        let this = self.project();
        let Some(next_chunk_fut) = this.next_chunk_fut else {
            return Poll::Ready(Ok(None));
        };

        let (chunk_or_err, chunks) = ready!(next_chunk_fut.as_mut().poll(cx));
        match chunk_or_err {
            Ok(Some(chunk)) => {
                // The body may have more chunks, create a new future for
                // the next one.
                *this.next_chunk_fut = Some(next_chunk(chunks));
                Poll::Ready(Ok(Some(chunk)))
            }
            Ok(None) => {
                *this.next_chunk_fut = None;
                Poll::Ready(Ok(None))
            }
            Err(ChunksError(message)) => {
                *this.next_chunk_fut = None;
                Poll::Ready(Err(Error::new(message, ErrorKind::Transport)))
            }
        }
    }
}

fn next_chunk(mut chunks: Chunks) -> PinnedFuture<NextChunk> {
    Box::pin(async move {
        let chunk_or_err = chunks.next_chunk().await;
        (chunk_or_err, chunks)
    })
}
