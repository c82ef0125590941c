//! Injected I/O, mirrored from the donor's pattern of passing explicit
//! sinks instead of reaching for ambient `stdin`/`stdout`: tests get a
//! deterministic, in-memory `CoolIo`, and only a thin `StdIo` wrapper at
//! the very edge touches the real terminal.

use std::io::{self, BufRead, Write};

/// What `out_string`/`out_int`/`in_string`/`in_int` run against.
pub trait CoolIo {
    fn write_str(&mut self, s: &str);

    /// Reads one line, stripping the trailing newline. `None` on EOF.
    fn read_line(&mut self) -> Option<String>;
}

/// The real terminal, used by `cool::run` outside of tests.
pub struct StdIo {
    stdin: io::Stdin,
}

impl StdIo {
    pub fn new() -> StdIo {
        StdIo { stdin: io::stdin() }
    }
}

impl Default for StdIo {
    fn default() -> Self {
        StdIo::new()
    }
}

impl CoolIo for StdIo {
    fn write_str(&mut self, s: &str) {
        print!("{s}");
        let _ = io::stdout().flush();
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        let n = self.stdin.lock().read_line(&mut line).unwrap_or(0);
        if n == 0 {
            return None;
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Some(line)
    }
}

/// An in-memory `CoolIo` for deterministic tests: `out_string`/`out_int`
/// append to a buffer, `in_string`/`in_int` read queued lines.
#[derive(Debug, Default)]
pub struct MockIo {
    pub output: String,
    input: std::collections::VecDeque<String>,
}

impl MockIo {
    pub fn with_input(lines: impl IntoIterator<Item = impl Into<String>>) -> MockIo {
        MockIo {
            output: String::new(),
            input: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl CoolIo for MockIo {
    fn write_str(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn read_line(&mut self) -> Option<String> {
        self.input.pop_front()
    }
}
