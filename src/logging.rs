//! Level-filtered logging to the host's event log.
//!
//! Messages are written through [`HostProxy::write_to_log`] as
//! `"<LEVEL> | <plugin>: <message>"` with a per-level colour tag. The
//! current level is persisted as a host text variable so it survives across
//! invocations within a host session.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::core::HostProxy;

/// Colour tags the host understands, indexed by level ordinal.
const LOG_COLOUR: [&str; 5] = ["red", "yellow", "green", "blue", "gray"];

/// Error raised when log level text cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid log level '{0}'")]
pub struct InvalidLevel(pub String);

/// Log levels, ordered from most to least severe.
///
/// A message is emitted when its level is at or above the severity of the
/// current level; with the level at [`Warn`](LogLevel::Warn), notices and
/// below are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Errors cause execution of the current event to abort.
    Error,
    /// Warnings are recoverable but noteworthy problems.
    Warn,
    /// Notices are noteworthy regular events. The default level.
    Notice,
    /// Informational messages.
    Info,
    /// Messages useful only for debugging.
    Debug,
}

impl LogLevel {
    /// The colour tag used when writing at this level.
    pub fn colour(self) -> &'static str {
        LOG_COLOUR[self as usize]
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Notice => "NOTICE",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        };
        write!(f, "{name}")
    }
}

impl FromStr for LogLevel {
    type Err = InvalidLevel;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.to_uppercase().as_str() {
            "ERROR" => Ok(LogLevel::Error),
            "WARN" => Ok(LogLevel::Warn),
            "NOTICE" => Ok(LogLevel::Notice),
            "INFO" => Ok(LogLevel::Info),
            "DEBUG" => Ok(LogLevel::Debug),
            _ => Err(InvalidLevel(text.to_string())),
        }
    }
}

/// Writes level-filtered messages to the host's event log.
///
/// The plugin owns one sink; handlers reach it through
/// [`EventContext::log`](crate::core::EventContext::log).
pub struct LogSink {
    id: String,
    level: Option<LogLevel>,
}

impl LogSink {
    /// Create a sink that prefixes messages with the given plugin id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            level: None,
        }
    }

    /// The current level; [`LogLevel::Notice`] until changed.
    pub fn level(&self) -> LogLevel {
        self.level.unwrap_or(LogLevel::Notice)
    }

    /// The host text variable the level is persisted under.
    pub fn level_variable(&self) -> String {
        format!("{}.loglevel#", self.id)
    }

    /// Write a message at the given level, if the current level lets it
    /// through.
    pub fn log(&self, proxy: &mut dyn HostProxy, level: LogLevel, message: &str) {
        if level <= self.level() {
            proxy.write_to_log(&format!("{level} | {}: {message}", self.id), level.colour());
        }
    }

    /// Log at [`LogLevel::Error`].
    pub fn error(&self, proxy: &mut dyn HostProxy, message: &str) {
        self.log(proxy, LogLevel::Error, message);
    }

    /// Log at [`LogLevel::Warn`].
    pub fn warn(&self, proxy: &mut dyn HostProxy, message: &str) {
        self.log(proxy, LogLevel::Warn, message);
    }

    /// Log at [`LogLevel::Notice`].
    pub fn notice(&self, proxy: &mut dyn HostProxy, message: &str) {
        self.log(proxy, LogLevel::Notice, message);
    }

    /// Log at [`LogLevel::Info`].
    pub fn info(&self, proxy: &mut dyn HostProxy, message: &str) {
        self.log(proxy, LogLevel::Info, message);
    }

    /// Log at [`LogLevel::Debug`].
    pub fn debug(&self, proxy: &mut dyn HostProxy, message: &str) {
        self.log(proxy, LogLevel::Debug, message);
    }

    /// Change the current level from its textual form.
    ///
    /// `None` resets to the default. Unrecognized text fails without
    /// mutating the level. On an actual change the new value is persisted
    /// to the host and a notice announcing it is logged.
    pub fn set_level(
        &mut self,
        proxy: &mut dyn HostProxy,
        text: Option<&str>,
    ) -> Result<(), InvalidLevel> {
        let parsed = text.map(LogLevel::from_str).transpose()?;
        self.apply_level(proxy, parsed);
        Ok(())
    }

    fn apply_level(&mut self, proxy: &mut dyn HostProxy, value: Option<LogLevel>) {
        if value != self.level {
            self.level = value;
            let effective = self.level();
            proxy.set_text(
                &self.level_variable(),
                Some(&effective.to_string().to_lowercase()),
            );
            self.notice(proxy, &format!("Log level set to {effective}."));
        }
    }
}

/// Handler-facing logging handle, bundling the sink with the proxy borrow.
pub struct LogHandle<'a> {
    sink: &'a LogSink,
    proxy: &'a mut dyn HostProxy,
}

impl<'a> LogHandle<'a> {
    pub(crate) fn new(sink: &'a LogSink, proxy: &'a mut dyn HostProxy) -> Self {
        Self { sink, proxy }
    }

    /// The current level.
    pub fn level(&self) -> LogLevel {
        self.sink.level()
    }

    /// Write at an explicit level.
    pub fn write(&mut self, level: LogLevel, message: &str) {
        self.sink.log(self.proxy, level, message);
    }

    /// Log at [`LogLevel::Error`].
    pub fn error(&mut self, message: &str) {
        self.write(LogLevel::Error, message);
    }

    /// Log at [`LogLevel::Warn`].
    pub fn warn(&mut self, message: &str) {
        self.write(LogLevel::Warn, message);
    }

    /// Log at [`LogLevel::Notice`].
    pub fn notice(&mut self, message: &str) {
        self.write(LogLevel::Notice, message);
    }

    /// Log at [`LogLevel::Info`].
    pub fn info(&mut self, message: &str) {
        self.write(LogLevel::Info, message);
    }

    /// Log at [`LogLevel::Debug`].
    pub fn debug(&mut self, message: &str) {
        self.write(LogLevel::Debug, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fake::FakeProxy;

    #[test]
    fn test_default_level_filters_info_and_debug() {
        let mut proxy = FakeProxy::new();
        let sink = LogSink::new("Test");

        sink.error(&mut proxy, "e");
        sink.warn(&mut proxy, "w");
        sink.notice(&mut proxy, "n");
        sink.info(&mut proxy, "i");
        sink.debug(&mut proxy, "d");

        let messages: Vec<_> = proxy.log_lines.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(
            messages,
            vec!["ERROR | Test: e", "WARN | Test: w", "NOTICE | Test: n"]
        );
    }

    #[test]
    fn test_colours_follow_level() {
        let mut proxy = FakeProxy::new();
        let sink = LogSink::new("Test");

        sink.error(&mut proxy, "e");
        sink.warn(&mut proxy, "w");

        assert_eq!(proxy.log_lines[0].1, "red");
        assert_eq!(proxy.log_lines[1].1, "yellow");
    }

    #[test]
    fn test_set_level_persists_and_announces() {
        let mut proxy = FakeProxy::new();
        let mut sink = LogSink::new("Test");

        sink.set_level(&mut proxy, Some("DEBUG")).unwrap();

        assert_eq!(sink.level(), LogLevel::Debug);
        assert_eq!(proxy.texts.get("Test.loglevel#"), Some(&"debug".to_string()));
        assert!(proxy.logged("Log level set to DEBUG."));
    }

    #[test]
    fn test_set_level_is_case_insensitive() {
        let mut proxy = FakeProxy::new();
        let mut sink = LogSink::new("Test");

        sink.set_level(&mut proxy, Some("wArN")).unwrap();
        assert_eq!(sink.level(), LogLevel::Warn);
    }

    #[test]
    fn test_invalid_level_keeps_state() {
        let mut proxy = FakeProxy::new();
        let mut sink = LogSink::new("Test");

        sink.set_level(&mut proxy, Some("debug")).unwrap();
        let err = sink.set_level(&mut proxy, Some("bogus")).unwrap_err();

        assert_eq!(err, InvalidLevel("bogus".to_string()));
        assert_eq!(sink.level(), LogLevel::Debug);
    }

    #[test]
    fn test_set_level_none_resets_to_default() {
        let mut proxy = FakeProxy::new();
        let mut sink = LogSink::new("Test");

        sink.set_level(&mut proxy, Some("debug")).unwrap();
        sink.set_level(&mut proxy, None).unwrap();
        assert_eq!(sink.level(), LogLevel::Notice);
    }

    #[test]
    fn test_unchanged_level_is_quiet() {
        let mut proxy = FakeProxy::new();
        let mut sink = LogSink::new("Test");

        sink.set_level(&mut proxy, Some("debug")).unwrap();
        let lines = proxy.log_lines.len();

        sink.set_level(&mut proxy, Some("debug")).unwrap();
        assert_eq!(proxy.log_lines.len(), lines);
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Notice < LogLevel::Debug);
    }
}
