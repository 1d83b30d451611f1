use std::collections::VecDeque;
use std::fmt::{self, Debug};
use std::mem;
use course_advisor_model::{AdvisorContext, ChatProviderError, ChatRequest};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::assembler::Termination;
use crate::chat_client::{ChatClient, ChatReply};
use crate::conversation::{
    Conversation, ConversationMessage, FALLBACK_REPLY, Role,
};

#[derive(Default)]
pub struct Callbacks {
    pub on_message: Option<Box<dyn Fn(&ConversationMessage) + Send + Sync>>,
    pub on_partial: Option<Box<dyn Fn(&str) + Send + Sync>>,
    pub on_session_expired: Option<Box<dyn Fn() + Send + Sync>>,
    pub on_idle: Option<Box<dyn Fn() + Send + Sync>>,
}

#[derive(Default)]
enum SessionStage {
    #[default]
    Idle,
    Streaming {
        exchange_id: u64,
        task: JoinHandle<()>,
    },
}

pub enum Command {
    SendMessage(String),
    Cancel,
    Snapshot(oneshot::Sender<Vec<ConversationMessage>>),
    PartialReply {
        exchange_id: u64,
        text: String,
    },
    ExchangeFinished {
        exchange_id: u64,
        result: Result<ChatReply, Box<dyn ChatProviderError>>,
    },
}

impl Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SendMessage(msg) => {
                f.debug_tuple("SendMessage").field(msg).finish()
            }
            Command::Cancel => f.write_str("Cancel"),
            Command::Snapshot(_) => f.write_str("Snapshot"),
            Command::PartialReply { exchange_id, text } => f
                .debug_struct("PartialReply")
                .field("exchange_id", exchange_id)
                .field("text", text)
                .finish(),
            Command::ExchangeFinished {
                exchange_id,
                result,
            } => f
                .debug_struct("ExchangeFinished")
                .field("exchange_id", exchange_id)
                .field("result", result)
                .finish(),
        }
    }
}

pub struct SessionState {
    chat_client: ChatClient,
    context: AdvisorContext,
    callbacks: Callbacks,
    conversation: Conversation,
    stage: SessionStage,
    pending_inputs: VecDeque<String>,
    next_exchange_id: u64,
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl SessionState {
    pub fn new(
        chat_client: ChatClient,
        context: AdvisorContext,
        callbacks: Callbacks,
        cmd_tx: mpsc::UnboundedSender<Command>,
    ) -> Self {
        Self {
            chat_client,
            context,
            callbacks,
            conversation: Conversation::new(),
            stage: SessionStage::Idle,
            pending_inputs: Default::default(),
            next_exchange_id: 1,
            cmd_tx,
        }
    }

    pub fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::SendMessage(input) => self.enqueue_user_input(input),
            Command::Cancel => self.cancel_exchange(),
            Command::Snapshot(tx) => {
                tx.send(self.conversation.messages().to_vec()).ok();
            }
            Command::PartialReply { exchange_id, text } => {
                self.update_partial(exchange_id, &text)
            }
            Command::ExchangeFinished {
                exchange_id,
                result,
            } => self.finish_exchange(exchange_id, result),
        }
    }

    /// Aborts the exchange in flight without touching the conversation.
    pub fn abort_exchange(&mut self) -> bool {
        let SessionStage::Streaming { exchange_id, task } =
            mem::take(&mut self.stage)
        else {
            return false;
        };
        // Aborting drops the response stream held by the task.
        task.abort();
        debug!("aborted exchange {exchange_id}");
        true
    }

    #[inline]
    fn is_idle(&self) -> bool {
        matches!(self.stage, SessionStage::Idle)
    }

    #[inline]
    fn current_exchange_id(&self) -> Option<u64> {
        match &self.stage {
            SessionStage::Idle => None,
            SessionStage::Streaming { exchange_id, .. } => Some(*exchange_id),
        }
    }

    fn enqueue_user_input(&mut self, input: String) {
        if input.trim().is_empty() {
            debug!("ignoring blank input");
            return;
        }
        if !self.is_idle() {
            // One exchange at a time, this input waits for its turn.
            self.pending_inputs.push_back(input);
            return;
        }
        self.start_exchange(input);
    }

    fn process_next_input(&mut self) {
        if !self.is_idle() {
            return;
        }
        if let Some(input) = self.pending_inputs.pop_front() {
            self.start_exchange(input);
        } else if let Some(on_idle) = &self.callbacks.on_idle {
            on_idle();
        }
    }

    /// Appends the user message and starts streaming the reply, assuming
    /// the stage is checked.
    fn start_exchange(&mut self, input: String) {
        let request = ChatRequest::new(input.as_str(), &self.context);
        self.append_message(Role::User, input);

        let exchange_id = self.next_exchange_id;
        self.next_exchange_id += 1;

        let chat_client = self.chat_client.clone();
        let partial_tx = self
            .callbacks
            .on_partial
            .as_ref()
            .map(|_| self.cmd_tx.clone());
        let cmd_tx = self.cmd_tx.clone();
        let task = tokio::spawn(
            async move {
                let result = chat_client
                    .send_request(request, move |partial| {
                        if let Some(partial_tx) = &partial_tx {
                            partial_tx
                                .send(Command::PartialReply {
                                    exchange_id,
                                    text: partial.to_owned(),
                                })
                                .ok();
                        }
                    })
                    .await;
                cmd_tx
                    .send(Command::ExchangeFinished {
                        exchange_id,
                        result,
                    })
                    .ok();
            }
            .instrument(debug_span!("exchange", id = exchange_id)),
        );
        self.stage = SessionStage::Streaming { exchange_id, task };
    }

    fn finish_exchange(
        &mut self,
        exchange_id: u64,
        result: Result<ChatReply, Box<dyn ChatProviderError>>,
    ) {
        if self.current_exchange_id() != Some(exchange_id) {
            // The exchange has been cancelled, but its result was already
            // on the way.
            debug!("discarding result of exchange {exchange_id}");
            return;
        }
        self.stage = SessionStage::Idle;

        match result {
            Ok(reply) => {
                if reply.termination == Termination::EndOfStream {
                    info!("exchange {exchange_id} ended without sentinel");
                }
                self.append_message(Role::Bot, reply.text);
            }
            Err(err) => {
                error!("exchange {exchange_id} failed: {err}");
                self.append_message(Role::Bot, FALLBACK_REPLY);
                if let Some(on_session_expired) =
                    &self.callbacks.on_session_expired
                {
                    on_session_expired();
                }
            }
        }

        self.process_next_input();
    }

    fn update_partial(&self, exchange_id: u64, text: &str) {
        if self.current_exchange_id() != Some(exchange_id) {
            trace!("discarding partial reply of exchange {exchange_id}");
            return;
        }
        if let Some(on_partial) = &self.callbacks.on_partial {
            on_partial(text);
        }
    }

    fn cancel_exchange(&mut self) {
        if self.abort_exchange() {
            self.process_next_input();
        }
    }

    fn append_message<S: Into<String>>(&mut self, role: Role, text: S) {
        let msg = self.conversation.append(role, text);
        if let Some(on_message) = &self.callbacks.on_message {
            on_message(msg);
        }
    }
}
