//! Shared types for talking to the course advisor backend.
//!
//! This crate establishes the protocol between the chat session and the
//! transport that carries a chat request to the backend. A provider turns
//! a [`ChatRequest`] into a [`ChatResponse`], which is nothing more than
//! an ordered stream of raw byte chunks. Interpreting those chunks is the
//! job of the core crate.
//!
//! The domain records (user profile, course offers) are also defined
//! here, since they travel inside every chat request.

#![deny(missing_docs)]

mod error;
mod provider;
mod records;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use records::*;
pub use request::*;
pub use response::*;
