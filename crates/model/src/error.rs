use serde::{Deserialize, Serialize};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The backend rejected the session, the user needs to log in again.
    SessionExpired,
    /// The connection failed or the response body could not be read.
    Transport,
    /// Any other errors.
    Other,
}
