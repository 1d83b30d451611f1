//! Assembly of streamed advisor replies.
//!
//! The backend streams its reply as text events separated by a blank
//! line. Each meaningful event starts with `data: ` followed by either a
//! JSON object carrying a `content` fragment, or the `[DONE]` sentinel:
//!
//! ```text
//! data: {"content":"Hel"}
//!
//! data: {"content":"lo"}
//!
//! data: [DONE]
//!
//! ```
//!
//! [`StreamAssembler`] consumes raw chunks in arrival order and folds the
//! fragments into one message. Chunk boundaries are arbitrary, they may
//! split an event or even a multi-byte character.

use std::{mem, str};

use serde::Deserialize;

const EVENT_DELIMITER: &str = "\n\n";
const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// One delimiter-separated unit of the stream.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StreamEvent {
    /// A data event with its trimmed payload.
    Data(String),
    /// The termination sentinel.
    Done,
    /// A segment without the `data: ` prefix.
    Malformed(String),
}

impl StreamEvent {
    /// Classifies a segment of decoded text (without its delimiter).
    pub fn parse(segment: &str) -> Self {
        let Some(payload) = segment.strip_prefix(DATA_PREFIX) else {
            return StreamEvent::Malformed(segment.to_owned());
        };
        let payload = payload.trim();
        if payload == DONE_SENTINEL {
            StreamEvent::Done
        } else {
            StreamEvent::Data(payload.to_owned())
        }
    }
}

#[derive(Deserialize)]
struct ContentPayload {
    content: Option<String>,
}

/// The content received so far for one reply. It only ever grows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseAccumulator {
    buffer: String,
}

impl ResponseAccumulator {
    #[inline]
    fn append(&mut self, fragment: &str) {
        self.buffer.push_str(fragment);
    }

    /// Returns the accumulated text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Consumes the accumulator and returns the accumulated text.
    #[inline]
    pub fn into_string(self) -> String {
        self.buffer
    }
}

/// How the stream ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Termination {
    /// The `[DONE]` sentinel was received.
    Sentinel,
    /// The transport closed cleanly without sending the sentinel.
    EndOfStream,
}

/// What a single chunk contributed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    /// Content appended by this chunk, in order.
    pub delta: String,
    /// Whether the sentinel has been seen.
    pub completed: bool,
}

/// The final result of an assembled stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    /// The full reply text.
    pub text: String,
    /// How the stream ended.
    pub termination: Termination,
}

/// Decodes UTF-8 across chunk boundaries.
///
/// An incomplete sequence at the end of a chunk is carried over to the
/// next one. Invalid sequences decode to U+FFFD.
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn decode(&mut self, chunk: &[u8], out: &mut String) {
        let joined;
        let mut input = if self.pending.is_empty() {
            chunk
        } else {
            self.pending.extend_from_slice(chunk);
            joined = mem::take(&mut self.pending);
            &joined[..]
        };

        loop {
            match str::from_utf8(input) {
                Ok(s) => {
                    out.push_str(s);
                    return;
                }
                Err(err) => {
                    let (valid, rest) = input.split_at(err.valid_up_to());
                    out.push_str(str::from_utf8(valid).unwrap_or_default());
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[len..];
                        }
                        None => {
                            self.pending.extend_from_slice(rest);
                            return;
                        }
                    }
                }
            }
        }
    }

    fn flush(&mut self, out: &mut String) {
        if !self.pending.is_empty() {
            self.pending.clear();
            out.push(char::REPLACEMENT_CHARACTER);
        }
    }
}

/// Turns a chunked event stream into one reply.
///
/// Feed every chunk with [`push_chunk`](Self::push_chunk) in arrival
/// order, then call [`finish`](Self::finish) once the sentinel has been
/// seen or the transport has closed. Chunks pushed after the sentinel are
/// ignored.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    decoder: Utf8Decoder,
    // Decoded text that doesn't form a complete event yet.
    text: String,
    // Offset in `text` before which no delimiter starts.
    scanned: usize,
    accumulator: ResponseAccumulator,
    completed: bool,
}

impl StreamAssembler {
    /// Creates an empty assembler.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the sentinel has been seen.
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Returns the content accumulated so far.
    #[inline]
    pub fn buffer(&self) -> &str {
        self.accumulator.as_str()
    }

    /// Consumes one raw chunk.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Progress {
        let mut delta = String::new();
        if !self.completed {
            self.decoder.decode(chunk, &mut self.text);
            self.drain_events(&mut delta);
        }
        Progress {
            delta,
            completed: self.completed,
        }
    }

    /// Finalizes the reply.
    ///
    /// If the sentinel never arrived, whatever is left in the decode
    /// buffer is processed as a last event and the partial content is
    /// returned with [`Termination::EndOfStream`].
    pub fn finish(mut self) -> Completion {
        if !self.completed {
            self.decoder.flush(&mut self.text);
            let tail = mem::take(&mut self.text);
            let mut delta = String::new();
            self.completed =
                fold_event(&tail, &mut self.accumulator, &mut delta);
        }

        let termination = if self.completed {
            Termination::Sentinel
        } else {
            warn!("stream closed without the done sentinel");
            Termination::EndOfStream
        };
        Completion {
            text: self.accumulator.into_string(),
            termination,
        }
    }

    fn drain_events(&mut self, delta: &mut String) {
        let mut consumed = 0;
        let mut search_from = self.scanned;
        while let Some(idx) = find_delimiter(&self.text.as_bytes()[search_from..])
        {
            let end = search_from + idx;
            let segment = &self.text[consumed..end];
            consumed = end + EVENT_DELIMITER.len();
            search_from = consumed;
            if fold_event(segment, &mut self.accumulator, delta) {
                self.completed = true;
                break;
            }
        }

        if self.completed {
            // Nothing after the sentinel matters.
            self.text = String::new();
            self.scanned = 0;
        } else {
            self.text.drain(..consumed);
            // The retained tail may hold the first half of a delimiter.
            self.scanned = self
                .text
                .len()
                .saturating_sub(EVENT_DELIMITER.len() - 1);
        }
    }
}

#[inline]
fn find_delimiter(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(EVENT_DELIMITER.len())
        .position(|window| window == EVENT_DELIMITER.as_bytes())
}

/// Folds one segment into the accumulator, returns `true` on the sentinel.
fn fold_event(
    segment: &str,
    accumulator: &mut ResponseAccumulator,
    delta: &mut String,
) -> bool {
    if segment.is_empty() {
        return false;
    }

    let payload = match StreamEvent::parse(segment) {
        StreamEvent::Done => return true,
        StreamEvent::Malformed(raw) => {
            debug!("ignoring event without data prefix: {raw:?}");
            return false;
        }
        StreamEvent::Data(payload) => payload,
    };

    match serde_json::from_str::<ContentPayload>(&payload) {
        Ok(ContentPayload {
            content: Some(content),
        }) => {
            accumulator.append(&content);
            delta.push_str(&content);
        }
        Ok(_) => trace!("event has no content: {payload}"),
        Err(err) => warn!("error parsing event {payload:?}: {err}"),
    }
    false
}
