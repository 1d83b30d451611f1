use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use bytes::Bytes;
use course_advisor_model::{
    AdvisorContext, ChatProvider, ChatProviderError, ChatRequest,
    ChatResponse, ErrorKind,
};
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct FakeProviderError(ErrorKind);

impl Display for FakeProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeProviderError {}

impl ChatProviderError for FakeProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Echoes the input back, one word per chunk.
#[derive(Debug)]
struct FakeResponse {
    fake_chunks: VecDeque<Bytes>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl FakeResponse {
    fn new(input: &str) -> Self {
        let fake_chunks = format!("You said {}", input)
            .split(' ')
            .map(|word| Bytes::from(word.to_owned()))
            .collect();
        Self {
            fake_chunks,
            sleep: None,
        }
    }
}

impl ChatResponse for FakeResponse {
    type Error = FakeProviderError;

    fn poll_next_chunk(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<Bytes>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };
        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;
            return Poll::Ready(Ok(this.fake_chunks.pop_front()));
        }
        this.sleep = Some(Box::pin(sleep(Duration::from_millis(1))));
        Pin::new(this).poll_next_chunk(cx)
    }
}

struct FakeProvider;

impl ChatProvider for FakeProvider {
    type Error = FakeProviderError;
    type Response = FakeResponse;

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let result = if req.user_input.is_empty() {
            Err(FakeProviderError(ErrorKind::SessionExpired))
        } else {
            Ok(FakeResponse::new(&req.user_input))
        };
        ready(result)
    }
}

mod tests {
    use std::future::poll_fn;

    use super::*;

    #[tokio::test]
    async fn test_chunks_in_order() {
        let provider = FakeProvider;
        let req = ChatRequest::new("Good morning", &AdvisorContext::default());
        let mut resp = provider.send_request(&req).await.unwrap();

        let mut words = vec![];
        loop {
            let chunk_fut =
                poll_fn(|cx| Pin::new(&mut resp).poll_next_chunk(cx));
            match chunk_fut.await {
                Ok(Some(chunk)) => {
                    words.push(String::from_utf8(chunk.to_vec()).unwrap());
                }
                Ok(None) => break,
                Err(err) => unreachable!("unexpected error: {err:?}"),
            }
        }

        assert_eq!(words.join(" "), "You said Good morning");
    }

    #[tokio::test]
    async fn test_error() {
        let provider = FakeProvider;
        let req = ChatRequest::new("", &AdvisorContext::default());
        let result = provider.send_request(&req).await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionExpired);
    }
}
