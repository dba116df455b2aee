//! Blocking input sources for the input instruction when suspension is not requested.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use tracing::warn;

use crate::config::INPUT_PROMPT;
use crate::error::Fault;
use crate::types::Value;

/// Source of raw responses for the interactive input fallback.
pub trait InputSource {
    /// Next raw response, or `None` once the source is closed.
    fn read_response(&mut self) -> Option<String>;
}

/// Pull responses until one parses as an integer. Malformed responses are discarded.
pub fn acquire_integer(source: &mut dyn InputSource) -> Result<Value, Fault> {
    loop {
        let Some(response) = source.read_response() else {
            return Err(Fault::InputClosed);
        };
        match response.trim().parse::<Value>() {
            Ok(value) => return Ok(value),
            Err(_) => warn!(response = %response.trim(), "discarding non-integer input"),
        }
    }
}

/// Prompts on `W` and reads one line per response from `R`.
pub struct LineSource<R, W> {
    reader: R,
    prompt: W,
}

impl<R: BufRead, W: Write> LineSource<R, W> {
    pub fn new(reader: R, prompt: W) -> Self {
        Self { reader, prompt }
    }
}

impl LineSource<io::StdinLock<'static>, io::Stdout> {
    /// Process stdin, prompting on stdout.
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> InputSource for LineSource<R, W> {
    fn read_response(&mut self) -> Option<String> {
        // A broken prompt stream does not stop us from reading.
        let _ = self.prompt.write_all(INPUT_PROMPT.as_bytes());
        let _ = self.prompt.flush();
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    }
}

/// Replays canned responses, then reports closed.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    responses: VecDeque<String>,
}

impl ScriptedSource {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.responses.len()
    }
}

impl InputSource for ScriptedSource {
    fn read_response(&mut self) -> Option<String> {
        self.responses.pop_front()
    }
}

/// Never answers. Used when the caller wants a missing input to be an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClosedSource;

impl InputSource for ClosedSource {
    fn read_response(&mut self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_responses_are_discarded() {
        let mut source = ScriptedSource::new(["abc", "", "4.5", " -17 \n", "3"]);
        assert_eq!(acquire_integer(&mut source), Ok(Value::from(-17)));
        assert_eq!(source.remaining(), 1);
    }

    #[test]
    fn closed_source_is_a_fault() {
        let mut source = ScriptedSource::new(["nope"]);
        assert_eq!(acquire_integer(&mut source), Err(Fault::InputClosed));
        assert_eq!(acquire_integer(&mut ClosedSource), Err(Fault::InputClosed));
    }

    #[test]
    fn line_source_prompts_for_each_response() {
        let reader = io::Cursor::new(b"x\n123456789012345678901234567890\n".to_vec());
        let mut prompt = Vec::new();
        let mut source = LineSource::new(reader, &mut prompt);
        let value = acquire_integer(&mut source).expect("integer");
        assert_eq!(value.to_string(), "123456789012345678901234567890");
        drop(source);
        assert_eq!(String::from_utf8(prompt).unwrap(), INPUT_PROMPT.repeat(2));
    }
}
