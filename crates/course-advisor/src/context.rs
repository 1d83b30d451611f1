use std::error::Error;
use std::fmt::{self, Display};
use std::fs;
use std::path::{Path, PathBuf};

use course_advisor_model::AdvisorContext;

/// Error returned by [`load_context`].
#[derive(Debug)]
pub enum ContextError {
    /// The file could not be read.
    Io(PathBuf, std::io::Error),
    /// The file is not a valid context document.
    Parse(PathBuf, serde_json::Error),
}

impl Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::Io(path, err) => {
                write!(f, "cannot read {}: {err}", path.display())
            }
            ContextError::Parse(path, err) => {
                write!(f, "invalid context in {}: {err}", path.display())
            }
        }
    }
}

impl Error for ContextError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ContextError::Io(_, err) => Some(err),
            ContextError::Parse(_, err) => Some(err),
        }
    }
}

/// Loads an [`AdvisorContext`] from a JSON file.
///
/// The file holds an object with optional `userProfile` and `courses`
/// keys, the same shape the backend uses.
pub fn load_context<P: AsRef<Path>>(
    path: P,
) -> Result<AdvisorContext, ContextError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|err| ContextError::Io(path.to_owned(), err))?;
    let context = serde_json::from_str(&text)
        .map_err(|err| ContextError::Parse(path.to_owned(), err))?;
    debug!("loaded context from {}", path.display());
    Ok(context)
}
