//! Fixtures providing a [`Logger`] whose output lands in in-memory buffers, so
//! tests can assert on exactly what would reach stdout and stderr.

use percy_utils::test_utils::SharedBuf;
use percy_utils::{Color, Logger, LoggerConfig, SinkWriter, WriterStream};
use rstest::fixture;

/// A logger together with the buffers standing in for stdout and stderr.
pub struct Captured {
    pub logger: Logger,
    pub stdout: SharedBuf,
    pub stderr: SharedBuf,
}

/// Build a [`Captured`] logger with the given configuration.
pub fn captured_with(config: LoggerConfig) -> Captured {
    let stdout = SharedBuf::default();
    let stderr = SharedBuf::default();
    let sink = SinkWriter::new(
        Box::new(WriterStream::new(stdout.clone(), false)),
        Box::new(WriterStream::new(stderr.clone(), false)),
    );
    Captured {
        logger: Logger::with_sink(config, sink),
        stdout,
        stderr,
    }
}

/// A [`Captured`] logger with default configuration.
#[fixture]
pub fn captured() -> Captured {
    captured_with(LoggerConfig::new())
}

/// The `[percy]` label as printed outside debug mode, or with `ns` appended.
#[allow(dead_code)]
pub fn label(ns: Option<&str>) -> String {
    let text = match ns {
        Some(ns) => format!("percy:{ns}"),
        None => "percy".to_owned(),
    };
    format!("[{}]", Color::Magenta.paint(&text))
}
