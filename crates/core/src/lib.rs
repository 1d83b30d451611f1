//! Core logic of the course advisor chat: stream assembly, conversation
//! log and chat sessions.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod assembler;
mod chat_client;
pub mod conversation;
mod session;

pub use chat_client::{ChatClient, ChatReply};
pub use session::{Session, SessionBuilder, SessionClosedError};
