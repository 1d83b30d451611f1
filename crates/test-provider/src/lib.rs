//! A local fake chat provider for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use bytes::Bytes;
use course_advisor_model::{
    ChatProvider, ChatProviderError, ChatRequest, ChatResponse, ErrorKind,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    #[allow(dead_code)]
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl ChatProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestResponse {
    chunks: VecDeque<Bytes>,
    fail_after: Option<(usize, ErrorKind)>,
    delivered: usize,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
    dropped: Arc<AtomicUsize>,
}

impl Drop for TestResponse {
    fn drop(&mut self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

impl ChatResponse for TestResponse {
    type Error = crate::Error;

    fn poll_next_chunk(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<Bytes>, Self::Error>> {
        let this = self.get_mut();

        let delay = this.delay;
        let sleep = this.sleep.get_or_insert_with(|| Box::pin(sleep(delay)));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;

        if let Some((chunks, kind)) = this.fail_after {
            // Runs out of chunks early, the failure comes right away.
            if this.delivered >= chunks || this.chunks.is_empty() {
                return Poll::Ready(Err(Error {
                    message: "preset stream failure",
                    kind,
                }));
            }
        }

        let chunk = this.chunks.pop_front();
        if chunk.is_some() {
            this.delivered += 1;
        }
        Poll::Ready(Ok(chunk))
    }
}

#[derive(Default)]
struct Script {
    responses: VecDeque<PresetResponse>,
    requests: Vec<ChatRequest>,
}

/// A local fake chat provider for testing purpose.
///
/// Before sending requests, you need to queue the responses, one for each
/// request in order. If there are no responses left, the request fails.
///
/// Clones share the same script, so a test can keep one clone to inspect
/// the received requests after handing the provider over.
#[derive(Clone, Default)]
pub struct TestProvider {
    script: Arc<Mutex<Script>>,
    dropped: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl TestProvider {
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.lock_script().responses.push_back(preset);
    }

    /// Sets the delay before each chunk is delivered.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns the requests received so far.
    #[inline]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.lock_script().requests.clone()
    }

    /// Returns how many responses have been dropped so far.
    #[inline]
    pub fn dropped_responses(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, Script> {
        // A panicking test may poison the lock, the script is still usable.
        self.script.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl ChatProvider for TestProvider {
    type Error = crate::Error;
    type Response = TestResponse;

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let mut script = self.lock_script();
        script.requests.push(req.clone());

        let result = 'blk: {
            let Some(preset) = script.responses.pop_front() else {
                break 'blk Err(Error {
                    message: "no enough responses",
                    kind: ErrorKind::Other,
                });
            };

            let fail_after = match preset.failure {
                Some(PresetFailure::Request { kind }) => {
                    break 'blk Err(Error {
                        message: "preset request failure",
                        kind,
                    });
                }
                Some(PresetFailure::AfterChunks { chunks, kind }) => {
                    Some((chunks, kind))
                }
                None => None,
            };

            Ok(TestResponse {
                chunks: preset.chunks.into_iter().map(Bytes::from).collect(),
                fail_after,
                delivered: 0,
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                sleep: None,
                dropped: Arc::clone(&self.dropped),
            })
        };
        ready(result)
    }
}
