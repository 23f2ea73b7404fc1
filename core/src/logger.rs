//! Debug sinks for the client's request/response tracing.
//!
//! The client only calls into its logger while debug logging is enabled, so
//! a logger never has to check a level itself.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

pub trait Logger: Send + Sync {
    fn debug(&self, args: fmt::Arguments<'_>);
}

/// Discards everything. Installed by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn debug(&self, _args: fmt::Arguments<'_>) {}
}

/// Forwards lines to the `tracing` facade at DEBUG level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(target: "graphql_core", "{}", args);
    }
}

/// Writes `"{prefix}DEBUG {message}"` lines to any writer.
pub struct WriterLogger<W> {
    prefix: String,
    out: Mutex<W>,
}

impl<W: Write + Send> WriterLogger<W> {
    pub fn new(out: W, prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W> fmt::Debug for WriterLogger<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterLogger")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl<W: Write + Send> Logger for WriterLogger<W> {
    fn debug(&self, args: fmt::Arguments<'_>) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Logging must never fail a request.
        let _ = writeln!(out, "{}DEBUG {}", self.prefix, args);
    }
}

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn debug(&self, args: fmt::Arguments<'_>) {
        (**self).debug(args)
    }
}

impl<L: Logger + ?Sized> Logger for Box<L> {
    fn debug(&self, args: fmt::Arguments<'_>) {
        (**self).debug(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_logger_tags_lines_with_level_and_prefix() {
        let logger = WriterLogger::new(Vec::new(), "[gql] ");
        logger.debug(format_args!("query: {}", "{ a }"));
        logger.debug(format_args!("num of files: {}", 2));
        let out = String::from_utf8(logger.into_inner()).unwrap();
        assert_eq!(out, "[gql] DEBUG query: { a }\n[gql] DEBUG num of files: 2\n");
    }

    #[test]
    fn shared_logger_writes_through_arc() {
        let logger = Arc::new(WriterLogger::new(Vec::new(), ""));
        let shared: Arc<dyn Logger> = logger.clone();
        shared.debug(format_args!("hello"));
        drop(shared);
        let out = Arc::try_unwrap(logger).unwrap().into_inner();
        assert_eq!(out, b"DEBUG hello\n");
    }

    /// Shared buffer handed to the fmt subscriber as its writer.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn tracing_logger_emits_debug_event_under_crate_target() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            TracingLogger.debug(format_args!("response body: {{}}"));
        });

        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("DEBUG"), "{out}");
        assert!(out.contains("graphql_core"), "{out}");
        assert!(out.contains("response body: {}"), "{out}");
    }

    #[test]
    fn noop_logger_accepts_anything() {
        NoopLogger.debug(format_args!("{}", "ignored"));
    }
}
