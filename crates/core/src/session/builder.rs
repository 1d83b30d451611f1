use course_advisor_model::{AdvisorContext, ChatProvider};

use super::Session;
use super::state::Callbacks;
use crate::chat_client::ChatClient;
use crate::conversation::ConversationMessage;

/// [`Session`] builder.
pub struct SessionBuilder {
    pub(crate) chat_client: ChatClient,
    pub(crate) context: AdvisorContext,
    pub(crate) callbacks: Callbacks,
}

impl SessionBuilder {
    /// Creates a new builder with the specified chat provider.
    #[inline]
    pub fn with_provider<P: ChatProvider + 'static>(provider: P) -> Self {
        Self {
            chat_client: ChatClient::new(provider),
            context: Default::default(),
            callbacks: Default::default(),
        }
    }

    /// Sets the user profile and course list sent along with each message.
    #[inline]
    pub fn with_context(mut self, context: AdvisorContext) -> Self {
        self.context = context;
        self
    }

    /// Attaches a callback to be invoked when a message is appended to
    /// the conversation.
    #[inline]
    pub fn on_message(
        mut self,
        on_message: impl Fn(&ConversationMessage) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_message = Some(Box::new(on_message));
        self
    }

    /// Attaches a callback to be invoked with the partial reply while it
    /// is being streamed.
    #[inline]
    pub fn on_partial(
        mut self,
        on_partial: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_partial = Some(Box::new(on_partial));
        self
    }

    /// Attaches a callback to be invoked when an exchange fails and the
    /// user should be asked to log in again.
    #[inline]
    pub fn on_session_expired(
        mut self,
        on_session_expired: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_session_expired = Some(Box::new(on_session_expired));
        self
    }

    /// Attaches a callback to be invoked when the session is idle.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_idle = Some(Box::new(on_idle));
        self
    }

    /// Builds the session.
    ///
    /// This must be called within a Tokio runtime.
    #[inline]
    pub fn build(self) -> Session {
        Session::spawn_from_builder(self)
    }
}
