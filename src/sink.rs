//! Console output with an in-place progress line.
//!
//! [`SinkWriter`] routes formatted lines to the standard or error stream and
//! keeps a single progress line which is overwritten rather than appended on
//! interactive streams.

use std::io::{self, IsTerminal, Write};

use log::warn;

use crate::level::LogLevel;

/// Which part of the current line [`OutputStream::clear_line`] erases.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearLine {
    /// From the cursor to the end of the line.
    Right,
    /// The entire line.
    Whole,
}

impl ClearLine {
    fn escape(self) -> &'static str {
        match self {
            ClearLine::Right => "\u{1b}[0K",
            ClearLine::Whole => "\u{1b}[2K",
        }
    }
}

/// A text destination, optionally supporting cursor control.
pub trait OutputStream: Send {
    fn write_str(&mut self, text: &str) -> io::Result<()>;

    /// Whether the stream accepts cursor movement.
    fn is_interactive(&self) -> bool;

    /// Move the cursor to the zero-based `column`.
    fn cursor_to(&mut self, column: usize) -> io::Result<()> {
        self.write_str(&format!("\u{1b}[{}G", column + 1))
    }

    fn clear_line(&mut self, dir: ClearLine) -> io::Result<()> {
        self.write_str(dir.escape())
    }
}

/// [`OutputStream`] over any `io::Write`.
pub struct WriterStream<W> {
    writer: W,
    interactive: bool,
}

impl<W: Write + Send> WriterStream<W> {
    pub fn new(writer: W, interactive: bool) -> Self {
        Self {
            writer,
            interactive,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterStream<io::Stdout> {
    /// Process stdout, interactive when attached to a terminal.
    pub fn stdout() -> Self {
        let out = io::stdout();
        let interactive = out.is_terminal();
        Self::new(out, interactive)
    }
}

impl WriterStream<io::Stderr> {
    /// Process stderr, interactive when attached to a terminal.
    pub fn stderr() -> Self {
        let err = io::stderr();
        let interactive = err.is_terminal();
        Self::new(err, interactive)
    }
}

impl<W: Write + Send> OutputStream for WriterStream<W> {
    fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.writer
            .write_all(text.as_bytes())
            .and_then(|_| self.writer.flush())
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// The currently displayed progress line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressState {
    pub message: String,
    pub persist: bool,
}

/// Writes formatted lines to a pair of streams.
pub struct SinkWriter {
    stdout: Box<dyn OutputStream>,
    stderr: Box<dyn OutputStream>,
    progress: Option<ProgressState>,
}

impl SinkWriter {
    pub fn new(stdout: Box<dyn OutputStream>, stderr: Box<dyn OutputStream>) -> Self {
        Self {
            stdout,
            stderr,
            progress: None,
        }
    }

    /// Writer over the process stdout and stderr.
    pub fn stdio() -> Self {
        Self::new(
            Box::new(WriterStream::stdout()),
            Box::new(WriterStream::stderr()),
        )
    }

    pub fn progress(&self) -> Option<&ProgressState> {
        self.progress.as_ref()
    }

    /// Write `line` followed by a newline. `info` goes to stdout, every other
    /// level to stderr.
    ///
    /// A progress line shown on an interactive stdout is erased first, then
    /// redrawn if it persists; a non-persistent progress line is forgotten.
    pub fn emit(&mut self, level: LogLevel, line: &str) {
        let redraw = self.stdout.is_interactive() && self.progress.is_some();
        if redraw {
            report(
                self.stdout
                    .cursor_to(0)
                    .and_then(|_| self.stdout.clear_line(ClearLine::Whole)),
            );
        }

        let target = if level == LogLevel::Info {
            &mut self.stdout
        } else {
            &mut self.stderr
        };
        report(target.write_str(&format!("{line}\n")));

        match &self.progress {
            Some(progress) if progress.persist => {
                if redraw {
                    report(self.stdout.write_str(&progress.message));
                }
            }
            _ => self.progress = None,
        }
    }

    /// Display `message` as the progress line, or clear it with `None`.
    ///
    /// Interactive streams redraw in place without a trailing newline. Other
    /// streams cannot overwrite, so each message is written on its own line.
    pub fn show_progress(&mut self, message: Option<String>, persist: bool) {
        if self.stdout.is_interactive() {
            let mut result = self.stdout.cursor_to(0);
            if let Some(msg) = &message {
                result = result.and_then(|_| self.stdout.write_str(msg));
            }
            report(result.and_then(|_| self.stdout.clear_line(ClearLine::Right)));
        } else if let Some(msg) = &message {
            report(self.stdout.write_str(&format!("{msg}\n")));
        }

        self.progress = message.map(|message| ProgressState { message, persist });
    }
}

fn report(result: io::Result<()>) {
    if let Err(err) = result {
        warn!("SinkWriter write error: {err}");
    }
}
