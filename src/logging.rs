use std::io;
use std::sync::{Arc, Mutex};

use syslog::{Facility, Formatter3164, LoggerBackend, Severity};
use tracing::{Level, Metadata};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LogTarget;
use crate::error::LoggingError;

const SYSLOG_PROCESS: &str = "mailpush";

type SyslogLogger = syslog::Logger<LoggerBackend, Formatter3164>;

pub fn init(target: LogTarget, directive: &str) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(directive).map_err(|source| LoggingError::Filter {
        directive: directive.to_string(),
        source,
    })?;

    match target {
        LogTarget::Stderr => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .try_init()?,
        LogTarget::Syslog => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(Syslog::connect()?)
                    .with_ansi(false)
                    .without_time(),
            )
            .try_init()?,
    }
    Ok(())
}

fn severity(level: &Level) -> Severity {
    match *level {
        Level::ERROR => Severity::LOG_ERR,
        Level::WARN => Severity::LOG_WARNING,
        Level::INFO => Severity::LOG_NOTICE,
        _ => Severity::LOG_DEBUG,
    }
}

/// Formatted event text without its trailing newline, or `None` if blank.
fn event_message(buf: &[u8]) -> Option<String> {
    let text = buf.strip_suffix(b"\n").unwrap_or(buf);
    if text.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(text).into_owned())
}

/// Routes each formatted event to the local syslog daemon, facility MAIL.
#[derive(Clone)]
struct Syslog {
    logger: Arc<Mutex<SyslogLogger>>,
}

impl Syslog {
    fn connect() -> Result<Self, LoggingError> {
        let formatter = Formatter3164 {
            facility: Facility::LOG_MAIL,
            hostname: None,
            process: SYSLOG_PROCESS.to_string(),
            pid: std::process::id(),
        };
        let logger =
            syslog::unix(formatter).map_err(|err| LoggingError::Syslog(err.to_string()))?;
        Ok(Self {
            logger: Arc::new(Mutex::new(logger)),
        })
    }
}

impl<'a> MakeWriter<'a> for Syslog {
    type Writer = SyslogLine;

    fn make_writer(&'a self) -> Self::Writer {
        SyslogLine::new(Arc::clone(&self.logger), Severity::LOG_NOTICE)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        SyslogLine::new(Arc::clone(&self.logger), severity(meta.level()))
    }
}

/// Buffers one event and sends it when dropped.
struct SyslogLine {
    logger: Arc<Mutex<SyslogLogger>>,
    severity: Severity,
    buf: Vec<u8>,
}

impl SyslogLine {
    fn new(logger: Arc<Mutex<SyslogLogger>>, severity: Severity) -> Self {
        Self {
            logger,
            severity,
            buf: Vec::new(),
        }
    }
}

impl io::Write for SyslogLine {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SyslogLine {
    fn drop(&mut self) {
        let Some(message) = event_message(&self.buf) else {
            return;
        };
        let Ok(mut logger) = self.logger.lock() else {
            return;
        };
        // Nowhere left to report a failed log write.
        let _ = match self.severity {
            Severity::LOG_ERR => logger.err(message),
            Severity::LOG_WARNING => logger.warning(message),
            Severity::LOG_NOTICE => logger.notice(message),
            _ => logger.debug(message),
        };
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn severity__should_map_levels_to_syslog() {
        assert!(matches!(severity(&Level::ERROR), Severity::LOG_ERR));
        assert!(matches!(severity(&Level::WARN), Severity::LOG_WARNING));
        assert!(matches!(severity(&Level::INFO), Severity::LOG_NOTICE));
        assert!(matches!(severity(&Level::DEBUG), Severity::LOG_DEBUG));
    }

    #[test]
    fn event_message__should_strip_trailing_newline() {
        let message = event_message(b" INFO push requested\n");

        assert_eq!(message.as_deref(), Some(" INFO push requested"));
    }

    #[test]
    fn event_message__should_skip_empty_events() {
        assert!(event_message(b"\n").is_none());
        assert!(event_message(b"").is_none());
    }

    #[test]
    fn init__should_reject_invalid_filter() {
        let result = init(LogTarget::Stderr, "mailpush=notalevel");

        assert!(matches!(result, Err(LoggingError::Filter { .. })));
    }
}
