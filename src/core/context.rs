//! The single argument handlers receive.
//!
//! [`EventContext`] bundles the host proxy borrow with the plugin's log sink
//! and command runner, so handler code never touches a host-specific type
//! directly.

use thiserror::Error;

use super::commands::CommandRunner;
use super::proxy::HostProxy;
use super::variables::{ProxyExt, VarValue};
use crate::logging::{LogHandle, LogSink};

/// What a handler returns.
pub type HandlerResult = Result<(), HandlerError>;

/// A failure inside a single handler.
///
/// Failures are isolated per handler: the dispatch loop logs them and moves
/// on to the next matching handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A required event parameter was not set by the invoking command.
    #[error("missing parameter '{0}'")]
    MissingParameter(String),
    /// Any other failure, described by its message.
    #[error("{0}")]
    Message(String),
}

impl HandlerError {
    /// Shorthand for [`HandlerError::MissingParameter`].
    pub fn missing(name: impl Into<String>) -> Self {
        HandlerError::MissingParameter(name.into())
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        HandlerError::Message(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        HandlerError::Message(message.to_string())
    }
}

/// Per-invocation view of the host passed to every handler.
pub struct EventContext<'a> {
    proxy: &'a mut dyn HostProxy,
    log: &'a LogSink,
}

impl<'a> EventContext<'a> {
    pub(crate) fn new(proxy: &'a mut dyn HostProxy, log: &'a LogSink) -> Self {
        Self { proxy, log }
    }

    /// Direct access to the host proxy.
    pub fn proxy(&mut self) -> &mut dyn HostProxy {
        &mut *self.proxy
    }

    /// Read the named host variable as type `T`.
    pub fn get<T: VarValue>(&self, name: &str) -> Option<T> {
        self.proxy.get(name)
    }

    /// Read a required variable, failing with
    /// [`HandlerError::MissingParameter`] when it is unset.
    pub fn require<T: VarValue>(&self, name: &str) -> Result<T, HandlerError> {
        self.get(name).ok_or_else(|| HandlerError::missing(name))
    }

    /// Write the named host variable; `None` clears it.
    pub fn set<T: VarValue>(&mut self, name: &str, value: Option<T>) {
        self.proxy.set(name, value);
    }

    /// Clear the named host variable's slot for type `T`.
    pub fn unset<T: VarValue>(&mut self, name: &str) {
        self.proxy.unset::<T>(name);
    }

    /// Level-filtered logging to the host's event log.
    pub fn log(&mut self) -> LogHandle<'_> {
        LogHandle::new(self.log, &mut *self.proxy)
    }

    /// Run named host commands.
    pub fn commands(&mut self) -> CommandRunner<'_> {
        CommandRunner::new(&mut *self.proxy, self.log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::proxy::fake::FakeProxy;
    use crate::logging::LogLevel;

    #[test]
    fn test_variable_access() {
        let mut proxy = FakeProxy::new();
        let log = LogSink::new("Test");
        let mut ctx = EventContext::new(&mut proxy, &log);

        ctx.set::<i32>("count", Some(3));
        assert_eq!(ctx.get::<i32>("count"), Some(3));

        ctx.unset::<i32>("count");
        assert_eq!(ctx.get::<i32>("count"), None);
    }

    #[test]
    fn test_require_missing() {
        let mut proxy = FakeProxy::new();
        let log = LogSink::new("Test");
        let ctx = EventContext::new(&mut proxy, &log);

        let err = ctx.require::<String>("~test").unwrap_err();
        assert!(matches!(err, HandlerError::MissingParameter(name) if name == "~test"));
    }

    #[test]
    fn test_log_handle_writes_through_sink() {
        let mut proxy = FakeProxy::new();
        let log = LogSink::new("Test");

        {
            let mut ctx = EventContext::new(&mut proxy, &log);
            ctx.log().notice("hello");
            ctx.log().debug("hidden at default level");
            assert_eq!(ctx.log().level(), LogLevel::Notice);
        }

        assert!(proxy.logged("NOTICE | Test: hello"));
        assert!(!proxy.logged("hidden"));
    }
}
