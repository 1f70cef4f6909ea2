//! Source — JSON-lines reader yielding raw payloads.

use std::io::{BufRead, Read};

use serde_json::Value;
use thiserror::Error;

use crate::parser::{RawPayload, MAX_LINE_SIZE};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Iterator over the JSON objects of a JSON-lines stream.
///
/// Blank lines are ignored. Lines that are not valid JSON, are valid JSON
/// but not an object, or exceed [`MAX_LINE_SIZE`] are logged with their
/// 1-based line number and skipped; they never reach the caller. Only I/O
/// failures are surfaced.
pub struct JsonlSource<R> {
    reader: R,
    buf: Vec<u8>,
    line: usize,
    skipped: u64,
}

impl<R: BufRead> JsonlSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line: 0,
            skipped: 0,
        }
    }

    /// Lines dropped as malformed, non-object or oversized so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Lines read so far, including blank and skipped ones.
    pub fn lines_read(&self) -> usize {
        self.line
    }

    /// Consume input up to and including the next newline.
    fn discard_rest_of_line(&mut self) -> std::io::Result<()> {
        loop {
            let available = self.reader.fill_buf()?;
            if available.is_empty() {
                return Ok(());
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    self.reader.consume(pos + 1);
                    return Ok(());
                }
                None => {
                    let len = available.len();
                    self.reader.consume(len);
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for JsonlSource<R> {
    type Item = Result<RawPayload, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            // One byte past the limit tells an oversized line from a full one
            let mut bounded = self.reader.by_ref().take(MAX_LINE_SIZE as u64 + 1);
            match bounded.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => self.line += 1,
                Err(source) => {
                    return Some(Err(SourceError::Read {
                        line: self.line + 1,
                        source,
                    }))
                }
            }

            if self.buf.len() > MAX_LINE_SIZE && self.buf.last() != Some(&b'\n') {
                if let Err(source) = self.discard_rest_of_line() {
                    return Some(Err(SourceError::Read {
                        line: self.line,
                        source,
                    }));
                }
                self.skipped += 1;
                tracing::warn!(line = self.line, max = MAX_LINE_SIZE, "Skipping oversized line");
                continue;
            }

            let text = match std::str::from_utf8(&self.buf) {
                Ok(text) => text.trim(),
                Err(e) => {
                    self.skipped += 1;
                    tracing::warn!(line = self.line, error = %e, "Skipping non-UTF8 line");
                    continue;
                }
            };
            if text.is_empty() {
                continue;
            }

            match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => return Some(Ok(map)),
                Ok(other) => {
                    self.skipped += 1;
                    tracing::warn!(
                        line = self.line,
                        kind = json_kind(&other),
                        "Skipping non-object JSON line"
                    );
                }
                Err(e) => {
                    self.skipped += 1;
                    tracing::warn!(line = self.line, error = %e, "Skipping malformed JSON line");
                }
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
