mod builder;
mod state;

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use tokio::select;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::Instrument;

pub use builder::SessionBuilder;
use state::{Command, SessionState};

use crate::conversation::ConversationMessage;

/// A type of error which can be returned whenever commands are sent to a
/// session that has ended.
pub struct SessionClosedError;

impl fmt::Debug for SessionClosedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClosedError").finish()
    }
}

impl fmt::Display for SessionClosedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "the session has ended".fmt(f)
    }
}

impl Error for SessionClosedError {}

/// A chat session with the course advisor.
///
/// The session owns the conversation log and runs at most one exchange
/// with the backend at a time. Messages sent while an exchange is in
/// flight are queued and handled in order once it ends.
///
/// Commands are handled by a background task. The task ends when
/// [`shutdown`](Self::shutdown) is called or every handle to the session
/// has been dropped, aborting any exchange in flight.
#[derive(Clone)]
pub struct Session {
    cmd_tx: mpsc::UnboundedSender<Command>,
    kill_tx: Arc<watch::Sender<bool>>,
}

impl Session {
    fn spawn_from_builder(builder: SessionBuilder) -> Self {
        let SessionBuilder {
            chat_client,
            context,
            callbacks,
        } = builder;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (kill_tx, kill_rx) = watch::channel(false);
        let state =
            SessionState::new(chat_client, context, callbacks, cmd_tx.clone());
        tokio::spawn(
            run_session(state, cmd_rx, kill_rx)
                .instrument(trace_span!("session")),
        );
        Self {
            cmd_tx,
            kill_tx: Arc::new(kill_tx),
        }
    }

    /// Sends a user message to the advisor.
    ///
    /// Blank messages are ignored.
    #[inline]
    pub fn send_message<S: Into<String>>(
        &self,
        message: S,
    ) -> Result<(), SessionClosedError> {
        self.send(Command::SendMessage(message.into()))
    }

    /// Cancels the exchange in flight, if any.
    ///
    /// The response stream is released and nothing is appended to the
    /// conversation for the cancelled exchange.
    #[inline]
    pub fn cancel(&self) -> Result<(), SessionClosedError> {
        self.send(Command::Cancel)
    }

    /// Returns a snapshot of the conversation.
    pub async fn conversation(
        &self,
    ) -> Result<Vec<ConversationMessage>, SessionClosedError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| SessionClosedError)
    }

    /// Ends the session.
    ///
    /// The session is not guaranteed to end immediately, but it will stop
    /// handling further commands and quit soon.
    #[inline]
    pub fn shutdown(&self) {
        self.kill_tx.send(true).ok();
    }

    #[inline]
    fn send(&self, cmd: Command) -> Result<(), SessionClosedError> {
        self.cmd_tx.send(cmd).map_err(|_| SessionClosedError)
    }
}

async fn run_session(
    mut state: SessionState,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    mut kill_rx: watch::Receiver<bool>,
) {
    debug!("started");
    loop {
        let cmd = select! {
            biased;

            // Also fires when every handle has been dropped.
            _ = kill_rx.changed() => {
                break;
            }
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    break;
                };
                cmd
            }
        };
        trace!("received command: {cmd:?}");

        let proc_span = trace_span!("proc cmd");
        proc_span.in_scope(|| {
            state.handle(cmd);
            trace!("finished");
        });
    }
    state.abort_exchange();
    debug!("will terminate");
}
