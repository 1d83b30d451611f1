//! A chat provider for the course advisor's HTTP backend.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use course_advisor_model::{
    ChatProvider, ChatProviderError, ChatRequest, ErrorKind,
};
use mime::Mime;
use reqwest::{Client, StatusCode, header};

pub use config::{AdvisorConfig, AdvisorConfigBuilder};
use io::Chunks;
pub use response::AdvisorResponse;

/// Error type for [`AdvisorProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ChatProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Provider that posts chat requests to the backend's `/chat` endpoint.
#[derive(Clone, Debug)]
pub struct AdvisorProvider {
    client: Client,
    config: Arc<AdvisorConfig>,
}

impl AdvisorProvider {
    /// Creates a new `AdvisorProvider` with the given configuration.
    #[inline]
    pub fn new(config: AdvisorConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ChatProvider for AdvisorProvider {
    type Error = Error;
    type Response = AdvisorResponse;

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let mut req_builder = self
            .client
            .post(self.config.chat_url())
            .header(header::ACCEPT, "text/event-stream")
            .json(req);
        if let Some(cookie) = &self.config.session_cookie {
            req_builder = req_builder.header(header::COOKIE, cookie.as_str());
        }
        let resp_fut = req_builder.send();

        async move {
            let resp = match resp_fut.await {
                Ok(resp) => resp,
                Err(err) => {
                    return Err(Error::new(
                        format!("{err}"),
                        ErrorKind::Transport,
                    ));
                }
            };

            let status = resp.status();
            if !status.is_success() {
                return Err(Error::new(
                    format!("unexpected status: {status}"),
                    error_kind_for_status(status),
                ));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_event_stream = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype().as_str() == "event-stream")
                .unwrap_or(false);
            if !is_event_stream {
                // The backend doesn't always label the stream, read it anyway.
                warn!("unexpected content type: {content_type:?}");
            }

            // Here we got a successful response.
            Ok(AdvisorResponse::from_chunks(Chunks::from_response(resp)))
        }
    }
}

#[inline]
fn error_kind_for_status(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ErrorKind::SessionExpired
        }
        _ => ErrorKind::Transport,
    }
}
