use course_advisor_model::ErrorKind;
use serde::{Deserialize, Serialize};

/// How a preset response fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresetFailure {
    /// The request itself fails, no response is returned.
    Request {
        /// Kind of the returned error.
        kind: ErrorKind,
    },
    /// The stream fails after delivering `chunks` chunks, or once every
    /// scripted chunk has been delivered if there are fewer.
    AfterChunks {
        /// Number of chunks delivered before the failure.
        chunks: usize,
        /// Kind of the returned error.
        kind: ErrorKind,
    },
}

/// The preset response for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Raw chunks in this response, delivered in order.
    pub chunks: Vec<Vec<u8>>,
    /// If set, the response fails as described.
    #[serde(default)]
    pub failure: Option<PresetFailure>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified raw chunks.
    #[inline]
    pub fn with_chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            failure: None,
        }
    }

    /// Creates a well-formed response streaming each content fragment as
    /// its own event in its own chunk, followed by the done sentinel.
    pub fn with_contents<'a>(contents: impl IntoIterator<Item = &'a str>) -> Self {
        let mut chunks: Vec<Vec<u8>> = contents
            .into_iter()
            .map(|content| {
                let payload = serde_json::json!({ "content": content });
                format!("data: {payload}\n\n").into_bytes()
            })
            .collect();
        chunks.push(b"data: [DONE]\n\n".to_vec());
        Self {
            chunks,
            failure: None,
        }
    }

    /// Creates a response whose request fails with `kind`.
    #[inline]
    pub fn failing(kind: ErrorKind) -> Self {
        Self {
            chunks: vec![],
            failure: Some(PresetFailure::Request { kind }),
        }
    }

    /// Sets how this response fails.
    #[inline]
    pub fn with_failure(mut self, failure: PresetFailure) -> Self {
        self.failure = Some(failure);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response = PresetResponse::with_contents(["Take ", "CS5500."])
            .with_failure(PresetFailure::AfterChunks {
                chunks: 1,
                kind: ErrorKind::Transport,
            });

        let serialized = serde_json::to_string(&response).unwrap();
        let deserialized: PresetResponse =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(response, deserialized);
    }

    #[test]
    fn test_with_contents() {
        let response = PresetResponse::with_contents(["a\"b"]);
        assert_eq!(
            response.chunks,
            [
                b"data: {\"content\":\"a\\\"b\"}\n\n".to_vec(),
                b"data: [DONE]\n\n".to_vec(),
            ]
        );
    }
}
