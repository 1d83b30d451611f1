use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use course_advisor_model::{
    ChatProvider, ChatProviderError, ChatRequest, ChatResponse,
};
use tracing::Instrument;

use crate::assembler::{StreamAssembler, Termination};

type SendRequestResult = Result<ChatReply, Box<dyn ChatProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ChatRequest, Box<dyn Fn(&str) + Send + 'static>)
        -> BoxedSendRequestFuture + Send + Sync
>;

/// A wrapper around a chat provider that drives its responses through a
/// [`StreamAssembler`] and provides a type-erased interface for the
/// other modules.
#[derive(Clone)]
pub struct ChatClient {
    handler_fn: HandlerFn,
}

impl ChatClient {
    /// Creates a client backed by `provider`.
    #[inline]
    pub fn new<P: ChatProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ChatClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req, on_partial| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    let resp_or_err = fut.await;
                    handle_response::<P>(resp_or_err, on_partial).await
                }
                .instrument(trace_span!("chat client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and assembles the streamed reply.
    ///
    /// `on_partial` receives the reply accumulated so far, every time a
    /// chunk adds content to it.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stream is released when
    /// this operation is cancelled.
    #[inline]
    pub async fn send_request(
        &self,
        req: ChatRequest,
        on_partial: impl Fn(&str) + Send + 'static,
    ) -> SendRequestResult {
        (self.handler_fn)(req, Box::new(on_partial)).await
    }
}

/// A completely received reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatReply {
    /// The reply text.
    pub text: String,
    /// How the stream ended.
    pub termination: Termination,
}

async fn handle_response<P: ChatProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
    on_partial: Box<dyn Fn(&str) + Send + 'static>,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err:?}");
            return Err(Box::new(err));
        }
    };

    let mut assembler = StreamAssembler::new();

    trace!("start receiving chunks");

    let mut pinned_resp = pin!(resp);
    loop {
        let chunk_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_chunk(cx)).await;
        let chunk = match chunk_or_err {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(err) => {
                // The partial reply is dropped together with the assembler.
                error!("got an error: {err:?}");
                return Err(Box::new(err));
            }
        };
        trace!("got a chunk of {} bytes", chunk.len());

        let progress = assembler.push_chunk(&chunk);
        if !progress.delta.is_empty() {
            on_partial(assembler.buffer());
        }
        if progress.completed {
            // Stop reading, the rest of the stream is discarded.
            break;
        }
    }

    let completion = assembler.finish();

    trace!("finished a request");

    Ok(ChatReply {
        text: completion.text,
        termination: completion.termination,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use course_advisor_model::{AdvisorContext, ErrorKind};
    use course_advisor_test_provider::{
        PresetFailure, PresetResponse, TestProvider,
    };

    use super::*;

    fn request(input: &str) -> ChatRequest {
        ChatRequest::new(input, &AdvisorContext::default())
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut provider = TestProvider::default();
        provider.add_response(PresetResponse::with_chunks([
            "data: {\"content\":\"Hel",
            "lo\"}\n\n",
            "data: {\"content\":\" world\"}\n\ndata: [DONE]\n\n",
        ]));
        let chat_client = ChatClient::new(provider);

        let partials = Arc::new(Mutex::new(vec![]));
        let reply = chat_client
            .send_request(request("Hi"), {
                let partials = Arc::clone(&partials);
                move |text: &str| partials.lock().unwrap().push(text.to_owned())
            })
            .await
            .unwrap();
        assert_eq!(reply.text, "Hello world");
        assert_eq!(reply.termination, Termination::Sentinel);
        assert_eq!(*partials.lock().unwrap(), ["Hello", "Hello world"]);
    }

    #[tokio::test]
    async fn test_stops_reading_after_sentinel() {
        let mut provider = TestProvider::default();
        provider.add_response(
            PresetResponse::with_chunks([
                "data: {\"content\":\"done\"}\n\ndata: [DONE]\n\n",
                "data: {\"content\":\" not read\"}\n\n",
            ])
            .with_failure(PresetFailure::AfterChunks {
                chunks: 1,
                kind: ErrorKind::Transport,
            }),
        );
        let chat_client = ChatClient::new(provider);
        let reply = chat_client
            .send_request(request("Hi"), |_| {})
            .await
            .unwrap();
        assert_eq!(reply.text, "done");
    }

    #[tokio::test]
    async fn test_clean_close_finalizes_partial_reply() {
        let mut provider = TestProvider::default();
        provider.add_response(PresetResponse::with_chunks([
            "data: {\"content\":\"cut \"}\n\n",
            "data: {\"content\":\"short\"}\n\n",
        ]));
        let chat_client = ChatClient::new(provider);
        let reply = chat_client
            .send_request(request("Hi"), |_| {})
            .await
            .unwrap();
        assert_eq!(reply.text, "cut short");
        assert_eq!(reply.termination, Termination::EndOfStream);
    }

    #[tokio::test]
    async fn test_transport_failure_mid_stream() {
        let mut provider = TestProvider::default();
        provider.add_response(
            PresetResponse::with_chunks([
                "data: {\"content\":\"lost\"}\n\n",
                "data: [DONE]\n\n",
            ])
            .with_failure(PresetFailure::AfterChunks {
                chunks: 1,
                kind: ErrorKind::Transport,
            }),
        );
        let chat_client = ChatClient::new(provider);
        let err = chat_client
            .send_request(request("Hi"), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_request_failure() {
        let mut provider = TestProvider::default();
        provider.add_response(PresetResponse::failing(
            ErrorKind::SessionExpired,
        ));
        let chat_client = ChatClient::new(provider);
        let err = chat_client
            .send_request(request("Hi"), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionExpired);
    }
}
