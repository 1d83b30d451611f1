use std::fmt::Debug;

const DEFAULT_SERVER_URL: &str = "http://localhost:3002";

/// Builder for [`AdvisorConfig`].
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct AdvisorConfigBuilder {
    server_url: Option<String>,
    session_cookie: Option<String>,
}

impl AdvisorConfigBuilder {
    /// Creates a builder with the given backend URL.
    #[inline]
    pub fn with_server_url<S: Into<String>>(server_url: S) -> Self {
        Self {
            server_url: Some(server_url.into()),
            session_cookie: None,
        }
    }

    /// Sets the cookie that authenticates the user with the backend,
    /// e.g. `token=...`.
    #[inline]
    pub fn with_session_cookie<S: Into<String>>(mut self, cookie: S) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> AdvisorConfig {
        let server_url = self
            .server_url
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_owned());
        AdvisorConfig {
            server_url: server_url.trim_end_matches('/').to_owned(),
            session_cookie: self.session_cookie,
        }
    }
}

impl Debug for AdvisorConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisorConfigBuilder")
            .field("server_url", &self.server_url)
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Configuration for the advisor backend.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AdvisorConfig {
    pub(crate) server_url: String,
    pub(crate) session_cookie: Option<String>,
}

impl AdvisorConfig {
    /// Returns the URL of the chat endpoint.
    #[inline]
    pub fn chat_url(&self) -> String {
        format!("{}/chat", self.server_url)
    }
}

impl Debug for AdvisorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisorConfig")
            .field("server_url", &self.server_url)
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
