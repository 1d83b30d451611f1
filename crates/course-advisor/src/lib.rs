//! An out-of-the-box course advisor client that wires the HTTP provider
//! into a chat session.
//!
//! The crate includes a CLI tool for chatting with the advisor in the
//! terminal. You can also use it as a library to bring the advisor into
//! your own host apps.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod context;

use course_advisor_core::SessionBuilder;
use course_advisor_http::{AdvisorConfig, AdvisorProvider};

pub use context::{ContextError, load_context};

/// Re-exports of [`course_advisor_core`] crate.
pub mod core {
    pub use course_advisor_core::*;
}

/// Re-exports of [`course_advisor_http`] crate.
pub mod http {
    pub use course_advisor_http::*;
}

/// Re-exports of [`course_advisor_model`] crate.
pub mod model {
    pub use course_advisor_model::*;
}

/// Creates a session builder talking to the backend described by `config`.
#[inline]
pub fn session_builder(config: AdvisorConfig) -> SessionBuilder {
    debug!("using backend: {config:?}");
    SessionBuilder::with_provider(AdvisorProvider::new(config))
}
