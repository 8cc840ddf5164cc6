//! A declarative handler registry and dispatch framework for
//! VoiceAttack-style plugin hosts.
//!
//! The host raises two kinds of events: named invocation contexts
//! (string-tagged commands) and typed variable change notifications. This
//! crate routes each incoming event to every registered handler whose
//! patterns match, isolates handler failures from one another and from the
//! host, and gives handlers typed access to host state:
//!
//! - **[`Pattern`]**: exact (case-insensitive) or `^`-prefixed regex match
//!   rules for event keys
//! - **[`HandlerRegistry`]**: ordered per-kind routing tables with
//!   add/remove support
//! - **[`ProxyExt`]**: generic get/set/unset over the host's six variable
//!   types
//! - **[`LogSink`]**: level-filtered logging to the host's event log, with
//!   a host-persisted level
//!
//! # Quick Start
//!
//! ```
//! use vaplug::prelude::*;
//!
//! let plugin = Plugin::builder("Example Plugin", "0.1.0")
//!     .info("Handles example contexts")
//!     .on_init(|ctx: &mut EventContext<'_>| {
//!         ctx.log().notice("ready");
//!         Ok(())
//!     })
//!     .on_context(&["test", "different test"], |ctx: &mut EventContext<'_>, key: &str| {
//!         let value: String = ctx.require("~test")?;
//!         ctx.log().notice(&format!("'{key}' invoked with '{value}'"));
//!         Ok(())
//!     })
//!     .on_context(&["^foo.*"], |ctx: &mut EventContext<'_>, key: &str| {
//!         ctx.log().info(&format!("regex context '{key}'"));
//!         Ok(())
//!     })
//!     .build()?;
//!
//! assert_eq!(plugin.display_name(), "Example Plugin v0.1.0");
//! # Ok::<(), vaplug::core::PatternError>(())
//! ```
//!
//! The surrounding host glue forwards its lifecycle callbacks to
//! [`Plugin::on_init`], [`Plugin::on_event`], [`Plugin::on_exit`],
//! [`Plugin::on_stop`] and [`Plugin::on_variable_changed`], adapting the
//! real host object to the [`HostProxy`] trait. Dispatch is synchronous and
//! single-threaded; the host serializes all entry points.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

// Core module (host-agnostic building blocks)
pub mod core;

pub mod logging;

// Tracing capture (feature-gated)
#[cfg(feature = "bridge")]
pub mod bridge;

// Re-export core types at crate root for convenience
pub use core::{
    ChangeHandler, ChangeValue, CommandInvocation, CommandParams, CommandRunner, ContextHandler,
    EventContext, EventKind, HandlerEntry, HandlerError, HandlerId, HandlerList, HandlerRegistry,
    HandlerResult, HostProxy, LifecycleHandler, MATCH_ALL, Pattern, PatternError, ProxyExt,
    RunOptions, StopHandler, VarChange, VarKind, VarScalar, VarValue,
};
pub use logging::{InvalidLevel, LogHandle, LogLevel, LogSink};

#[cfg(feature = "bridge")]
pub use bridge::{LogBridge, LogBridgeLayer};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::core::{
        CommandParams, EventContext, EventKind, HandlerError, HandlerId, HandlerResult, HostProxy,
        ProxyExt, RunOptions, VarChange, VarKind, VarValue,
    };
    pub use crate::logging::{LogLevel, LogSink};
    pub use crate::{Plugin, PluginBuilder};
}

/// Reserved context keys routed to the log sink, most severe first.
const LOG_CONTEXTS: [&str; 5] = [
    "log.error",
    "log.warn",
    "log.notice",
    "log.info",
    "log.debug",
];

/// Internal handler behind the reserved `log.*` contexts.
///
/// Reads the message from the `~message` text parameter and writes it at
/// the level named by the key suffix.
fn handle_log_context(ctx: &mut EventContext<'_>, key: &str) -> HandlerResult {
    let message: String = ctx.require("~message")?;
    let level = key
        .strip_prefix("log.")
        .and_then(|name| name.parse::<LogLevel>().ok())
        .unwrap_or(LogLevel::Info);
    ctx.log().write(level, &message);
    Ok(())
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run one handler, keeping its failure away from the rest of the batch.
///
/// A missing-parameter failure gets its own message; anything else,
/// including a panic, is reported as an unhandled exception for the event.
fn invoke_isolated<F>(log: &LogSink, proxy: &mut dyn HostProxy, key: &str, run: F)
where
    F: FnOnce(&mut EventContext<'_>) -> HandlerResult,
{
    let outcome = {
        let mut ctx = EventContext::new(&mut *proxy, log);
        catch_unwind(AssertUnwindSafe(|| run(&mut ctx)))
    };
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(HandlerError::MissingParameter(name))) => {
            log.error(proxy, &format!("missing parameter '{name}' for event '{key}'"));
        }
        Ok(Err(error)) => {
            log.error(
                proxy,
                &format!("unhandled exception while executing event '{key}': {error}"),
            );
        }
        Err(payload) => {
            log.error(
                proxy,
                &format!(
                    "unhandled exception while executing event '{key}': {}",
                    panic_message(&payload)
                ),
            );
        }
    }
}

/// A plugin: metadata, routing tables and the dispatch engine.
///
/// Built once via [`Plugin::builder`]; lives for the process lifetime. The
/// host glue calls the `on_*` entry operations; everything else happens in
/// registered handlers.
pub struct Plugin {
    name: String,
    version: String,
    info: String,
    guid: String,
    handlers: HandlerRegistry,
    log: LogSink,
    #[cfg(feature = "bridge")]
    bridge: Option<LogBridge>,
}

impl Plugin {
    /// Start building a plugin with the given name and version.
    pub fn builder(name: impl Into<String>, version: impl Into<String>) -> PluginBuilder {
        PluginBuilder::new(name, version)
    }

    /// Create a plugin with no declaratively registered handlers.
    ///
    /// Handlers can still be attached through
    /// [`handlers_mut`](Plugin::handlers_mut).
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        PluginBuilder::new(name, version).into_plugin()
    }

    /// The plugin's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The plugin's version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The plugin's description.
    pub fn info(&self) -> &str {
        &self.info
    }

    /// The plugin's unique id, as given to the builder.
    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// The display name the host shows: `"<name> v<version>"`.
    pub fn display_name(&self) -> String {
        format!("{} v{}", self.name, self.version)
    }

    /// The routing tables.
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Mutable routing tables, for programmatic registration and removal.
    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.handlers
    }

    /// The current log level.
    pub fn log_level(&self) -> LogLevel {
        self.log.level()
    }

    /// Change the log level from its textual form; `None` resets to the
    /// default. See [`LogSink::set_level`].
    pub fn set_log_level(
        &mut self,
        proxy: &mut dyn HostProxy,
        text: Option<&str>,
    ) -> Result<(), InvalidLevel> {
        self.log.set_level(proxy, text)
    }

    /// Capture `tracing` events into the host log.
    ///
    /// Install the returned layer into the subscriber the plugin's process
    /// uses; captured events are written to the host log at the end of each
    /// entry point.
    #[cfg(feature = "bridge")]
    pub fn install_log_bridge(&mut self) -> LogBridgeLayer {
        let bridge = LogBridge::new();
        let layer = bridge.layer();
        self.bridge = Some(bridge);
        layer
    }

    /// Entry point: the host finished loading the plugin.
    ///
    /// Restores the persisted log level, then runs every init handler in
    /// registration order.
    pub fn on_init(&mut self, proxy: &mut dyn HostProxy) {
        if let Some(saved) = proxy.get_text(&self.log.level_variable()) {
            if let Err(error) = self.log.set_level(proxy, Some(&saved)) {
                self.log.error(proxy, &error.to_string());
            }
        }
        for entry in self.handlers.inits().iter() {
            invoke_isolated(&self.log, proxy, "init", |ctx| (entry.handler())(ctx));
        }
        self.drain_bridge(proxy);
    }

    /// Entry point: the host invoked the plugin with a context key.
    ///
    /// The key is lower-cased, then every context handler with at least one
    /// matching pattern fires exactly once, in registration order. A key
    /// nothing matches is reported as an error in the host log; it never
    /// escalates past the plugin boundary.
    pub fn on_event(&mut self, proxy: &mut dyn HostProxy, key: &str) {
        let key = key.to_lowercase();
        let mut matched = 0usize;
        for entry in self.handlers.contexts().iter() {
            if entry.matches(&key) {
                matched += 1;
                invoke_isolated(&self.log, proxy, &key, |ctx| (entry.handler())(ctx, &key));
            }
        }
        if matched == 0 {
            self.log.error(proxy, &format!("invalid event key '{key}'"));
        } else {
            tracing::debug!(key = %key, handlers = matched, "dispatched context event");
        }
        self.drain_bridge(proxy);
    }

    /// Entry point: the host is shutting down.
    pub fn on_exit(&mut self, proxy: &mut dyn HostProxy) {
        for entry in self.handlers.exits().iter() {
            invoke_isolated(&self.log, proxy, "exit", |ctx| (entry.handler())(ctx));
        }
        self.drain_bridge(proxy);
    }

    /// Entry point: the host stopped all commands.
    ///
    /// The host passes no proxy here, so handler failures surface through
    /// `tracing` only.
    pub fn on_stop(&mut self) {
        for entry in self.handlers.stops().iter() {
            let outcome = catch_unwind(AssertUnwindSafe(|| (entry.handler())()));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(error)) => tracing::error!("stop handler failed: {error}"),
                Err(payload) => {
                    tracing::error!("stop handler panicked: {}", panic_message(&payload));
                }
            }
        }
    }

    /// Entry point: a host variable of type `T` changed.
    ///
    /// Unmatched changes are ignored silently. For text variables, a change
    /// of the reserved `"<name>.loglevel#"` variable adjusts the log level
    /// first (reporting an invalid value as an error) and then still reaches
    /// any text handlers registered against that name.
    pub fn on_variable_changed<T: ChangeValue>(
        &mut self,
        proxy: &mut dyn HostProxy,
        name: &str,
        from: Option<T>,
        to: Option<T>,
    ) {
        if T::KIND == VarKind::Text && name.eq_ignore_ascii_case(&self.log.level_variable()) {
            let text = to.as_ref().and_then(|value| T::level_text(value));
            if let Err(error) = self.log.set_level(proxy, text) {
                self.log.error(proxy, &error.to_string());
            }
        }

        let key = name.to_lowercase();
        let change = VarChange::new(name, from, to);
        let mut matched = 0usize;
        for entry in T::list(&self.handlers).iter() {
            if entry.matches(&key) {
                matched += 1;
                invoke_isolated(&self.log, proxy, &key, |ctx| (entry.handler())(ctx, &change));
            }
        }
        if matched > 0 {
            tracing::debug!(
                name = %key,
                kind = ?T::change_kind(),
                handlers = matched,
                "dispatched variable change"
            );
        }
        self.drain_bridge(proxy);
    }

    #[cfg(feature = "bridge")]
    fn drain_bridge(&self, proxy: &mut dyn HostProxy) {
        if let Some(bridge) = &self.bridge {
            bridge.drain(&self.log, proxy);
        }
    }

    #[cfg(not(feature = "bridge"))]
    fn drain_bridge(&self, _proxy: &mut dyn HostProxy) {}
}

/// Builds a [`Plugin`], collecting handlers together with their kinds and
/// patterns.
///
/// Pattern problems are surfaced by [`build`](PluginBuilder::build); the
/// first bad pattern fails the whole registration rather than being skipped.
pub struct PluginBuilder {
    name: String,
    version: String,
    info: String,
    guid: String,
    handlers: HandlerRegistry,
    error: Option<PatternError>,
}

impl PluginBuilder {
    fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let mut handlers = HandlerRegistry::new();
        // The reserved logging contexts sit at the head of the dispatch
        // order, so basic logging works without any declared handler.
        let patterns = LOG_CONTEXTS
            .iter()
            .map(|key| Pattern::Exact((*key).to_string()))
            .collect();
        handlers.add_context_compiled(patterns, handle_log_context);

        Self {
            name: name.into(),
            version: version.into(),
            info: String::new(),
            guid: String::new(),
            handlers,
            error: None,
        }
    }

    /// Set the plugin description.
    pub fn info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }

    /// Set the plugin's unique id. Kept opaque; the host glue parses it.
    pub fn guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = guid.into();
        self
    }

    /// Register a context handler for the given patterns.
    pub fn on_context<F>(mut self, patterns: &[&str], handler: F) -> Self
    where
        F: Fn(&mut EventContext<'_>, &str) -> HandlerResult + Send + Sync + 'static,
    {
        if self.error.is_none() {
            if let Err(error) = self.handlers.add_context(patterns, handler) {
                self.error = Some(error);
            }
        }
        self
    }

    fn changed<T, F>(mut self, patterns: &[&str], handler: F) -> Self
    where
        T: ChangeValue,
        F: Fn(&mut EventContext<'_>, &VarChange<T>) -> HandlerResult + Send + Sync + 'static,
    {
        if self.error.is_none() {
            if let Err(error) = self.handlers.add_changed(patterns, handler) {
                self.error = Some(error);
            }
        }
        self
    }

    /// Register a handler for boolean variable changes.
    pub fn on_bool_changed<F>(self, patterns: &[&str], handler: F) -> Self
    where
        F: Fn(&mut EventContext<'_>, &VarChange<bool>) -> HandlerResult + Send + Sync + 'static,
    {
        self.changed(patterns, handler)
    }

    /// Register a handler for integer variable changes.
    pub fn on_int_changed<F>(self, patterns: &[&str], handler: F) -> Self
    where
        F: Fn(&mut EventContext<'_>, &VarChange<i32>) -> HandlerResult + Send + Sync + 'static,
    {
        self.changed(patterns, handler)
    }

    /// Register a handler for decimal variable changes.
    pub fn on_decimal_changed<F>(self, patterns: &[&str], handler: F) -> Self
    where
        F: Fn(&mut EventContext<'_>, &VarChange<f64>) -> HandlerResult + Send + Sync + 'static,
    {
        self.changed(patterns, handler)
    }

    /// Register a handler for date/time variable changes.
    pub fn on_date_changed<F>(self, patterns: &[&str], handler: F) -> Self
    where
        F: Fn(&mut EventContext<'_>, &VarChange<chrono::NaiveDateTime>) -> HandlerResult
            + Send
            + Sync
            + 'static,
    {
        self.changed(patterns, handler)
    }

    /// Register a handler for text variable changes.
    pub fn on_text_changed<F>(self, patterns: &[&str], handler: F) -> Self
    where
        F: Fn(&mut EventContext<'_>, &VarChange<String>) -> HandlerResult + Send + Sync + 'static,
    {
        self.changed(patterns, handler)
    }

    /// Register an init handler.
    pub fn on_init<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut EventContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.handlers.add_init(handler);
        self
    }

    /// Register an exit handler.
    pub fn on_exit<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut EventContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.handlers.add_exit(handler);
        self
    }

    /// Register a stop handler.
    pub fn on_stop<F>(mut self, handler: F) -> Self
    where
        F: Fn() -> HandlerResult + Send + Sync + 'static,
    {
        self.handlers.add_stop(handler);
        self
    }

    /// Finish building. Fails on the first pattern that did not compile.
    pub fn build(mut self) -> Result<Plugin, PatternError> {
        match self.error.take() {
            Some(error) => Err(error),
            None => Ok(self.into_plugin()),
        }
    }

    fn into_plugin(self) -> Plugin {
        let log = LogSink::new(self.name.clone());
        Plugin {
            name: self.name,
            version: self.version,
            info: self.info,
            guid: self.guid,
            handlers: self.handlers,
            log,
            #[cfg(feature = "bridge")]
            bridge: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::core::fake::FakeProxy;

    fn counting_handler(
        counter: &Arc<AtomicUsize>,
    ) -> impl Fn(&mut EventContext<'_>, &str) -> HandlerResult + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move |_ctx: &mut EventContext<'_>, _key: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_display_metadata() {
        let plugin = Plugin::builder("Example Plugin", "0.0.1")
            .info("This is a description")
            .guid("{76FE674F-F729-45FD-A1DD-E53E9E66B360}")
            .build()
            .unwrap();

        assert_eq!(plugin.display_name(), "Example Plugin v0.0.1");
        assert_eq!(plugin.info(), "This is a description");
        assert_eq!(plugin.guid(), "{76FE674F-F729-45FD-A1DD-E53E9E66B360}");
    }

    #[test]
    fn test_context_dispatch_is_case_insensitive() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut plugin = Plugin::builder("Test", "1.0.0")
            .on_context(&["test", "different test"], counting_handler(&counter))
            .build()
            .unwrap();
        let mut proxy = FakeProxy::new();

        plugin.on_event(&mut proxy, "Different Test");

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(proxy.log_lines.is_empty());
    }

    #[test]
    fn test_handler_fires_once_when_several_patterns_match() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut plugin = Plugin::builder("Test", "1.0.0")
            .on_context(&["test", "^te.*", ""], counting_handler(&counter))
            .build()
            .unwrap();
        let mut proxy = FakeProxy::new();

        plugin.on_event(&mut proxy, "test");

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_regex_context_routing() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut plugin = Plugin::builder("Test", "1.0.0")
            .on_context(&["^foo.*"], counting_handler(&counter))
            .build()
            .unwrap();
        let mut proxy = FakeProxy::new();

        plugin.on_event(&mut proxy, "foobar");
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        plugin.on_event(&mut proxy, "barfoo");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(proxy.logged("invalid event key 'barfoo'"));
    }

    #[test]
    fn test_unmatched_key_logs_exactly_one_error() {
        let mut plugin = Plugin::builder("Test", "1.0.0").build().unwrap();
        let mut proxy = FakeProxy::new();

        plugin.on_event(&mut proxy, "nonexistent");

        assert_eq!(proxy.logged_count("nonexistent"), 1);
        assert!(proxy.logged("ERROR | Test: invalid event key 'nonexistent'"));
    }

    #[test]
    fn test_failing_handler_does_not_stop_the_batch() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut plugin = Plugin::builder("Test", "1.0.0")
            .on_context(&["both"], |_ctx: &mut EventContext<'_>, _key: &str| {
                Err("boom".into())
            })
            .on_context(&["both"], counting_handler(&counter))
            .build()
            .unwrap();
        let mut proxy = FakeProxy::new();

        plugin.on_event(&mut proxy, "both");

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(proxy.logged("unhandled exception while executing event 'both': boom"));
    }

    #[test]
    fn test_panicking_handler_is_isolated() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut plugin = Plugin::builder("Test", "1.0.0")
            .on_context(&["both"], |_ctx: &mut EventContext<'_>, _key: &str| {
                panic!("handler exploded")
            })
            .on_context(&["both"], counting_handler(&counter))
            .build()
            .unwrap();
        let mut proxy = FakeProxy::new();

        plugin.on_event(&mut proxy, "both");

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(proxy.logged("unhandled exception while executing event 'both': handler exploded"));
    }

    #[test]
    fn test_missing_parameter_message() {
        let mut plugin = Plugin::builder("Test", "1.0.0")
            .on_context(&["test"], |ctx: &mut EventContext<'_>, _key: &str| {
                let _value: String = ctx.require("~test")?;
                Ok(())
            })
            .build()
            .unwrap();
        let mut proxy = FakeProxy::new();

        plugin.on_event(&mut proxy, "test");

        assert!(proxy.logged("missing parameter '~test' for event 'test'"));
    }

    #[test]
    fn test_reserved_log_context() {
        let mut plugin = Plugin::builder("Test", "1.0.0").build().unwrap();
        let mut proxy = FakeProxy::new();
        proxy.texts.insert("~message".to_string(), "hello there".to_string());

        plugin.on_event(&mut proxy, "Log.Notice");

        assert!(proxy.logged("NOTICE | Test: hello there"));
    }

    #[test]
    fn test_reserved_log_context_honours_level_filter() {
        let mut plugin = Plugin::builder("Test", "1.0.0").build().unwrap();
        let mut proxy = FakeProxy::new();
        proxy.texts.insert("~message".to_string(), "noisy".to_string());

        plugin.on_event(&mut proxy, "log.debug");

        assert!(!proxy.logged("noisy"));
    }

    #[test]
    fn test_reserved_log_context_requires_message() {
        let mut plugin = Plugin::builder("Test", "1.0.0").build().unwrap();
        let mut proxy = FakeProxy::new();

        plugin.on_event(&mut proxy, "log.error");

        assert!(proxy.logged("missing parameter '~message' for event 'log.error'"));
    }

    #[test]
    fn test_loglevel_variable_change_sets_level() {
        let mut plugin = Plugin::builder("Test", "1.0.0").build().unwrap();
        let mut proxy = FakeProxy::new();

        plugin.on_variable_changed::<String>(
            &mut proxy,
            "Test.loglevel#",
            None,
            Some("debug".to_string()),
        );

        assert_eq!(plugin.log_level(), LogLevel::Debug);
        assert!(proxy.logged("Log level set to DEBUG."));
        assert_eq!(proxy.texts.get("Test.loglevel#"), Some(&"debug".to_string()));
    }

    #[test]
    fn test_rejected_loglevel_keeps_state_and_logs_error() {
        let mut plugin = Plugin::builder("Test", "1.0.0").build().unwrap();
        let mut proxy = FakeProxy::new();

        plugin.on_variable_changed::<String>(
            &mut proxy,
            "Test.loglevel#",
            None,
            Some("debug".to_string()),
        );
        plugin.on_variable_changed::<String>(
            &mut proxy,
            "Test.loglevel#",
            Some("debug".to_string()),
            Some("bogus".to_string()),
        );

        assert_eq!(plugin.log_level(), LogLevel::Debug);
        assert!(proxy.logged("invalid log level 'bogus'"));
    }

    #[test]
    fn test_loglevel_variable_still_reaches_text_handlers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_handler = Arc::clone(&seen);
        let mut plugin = Plugin::builder("Test", "1.0.0")
            .on_text_changed(
                &["test.loglevel#"],
                move |_ctx: &mut EventContext<'_>, change: &VarChange<String>| {
                    seen_in_handler.lock().unwrap().push(change.to.clone());
                    Ok(())
                },
            )
            .build()
            .unwrap();
        let mut proxy = FakeProxy::new();

        plugin.on_variable_changed::<String>(
            &mut proxy,
            "Test.loglevel#",
            None,
            Some("info".to_string()),
        );

        assert_eq!(*seen.lock().unwrap(), vec![Some("info".to_string())]);
        assert_eq!(plugin.log_level(), LogLevel::Info);
    }

    #[test]
    fn test_unmatched_variable_change_is_silent() {
        let mut plugin = Plugin::builder("Test", "1.0.0").build().unwrap();
        let mut proxy = FakeProxy::new();

        plugin.on_variable_changed::<bool>(&mut proxy, "somevar", Some(false), Some(true));

        assert!(proxy.log_lines.is_empty());
    }

    #[test]
    fn test_variable_change_payload() {
        let seen = Arc::new(Mutex::new(None));
        let seen_in_handler = Arc::clone(&seen);
        let mut plugin = Plugin::builder("Test", "1.0.0")
            .on_int_changed(
                &["altitude"],
                move |_ctx: &mut EventContext<'_>, change: &VarChange<i32>| {
                    *seen_in_handler.lock().unwrap() = Some(change.clone());
                    Ok(())
                },
            )
            .build()
            .unwrap();
        let mut proxy = FakeProxy::new();

        plugin.on_variable_changed::<i32>(&mut proxy, "Altitude", Some(100), Some(250));
        plugin.on_variable_changed::<i32>(&mut proxy, "heading", Some(1), Some(2));

        let change = seen.lock().unwrap().clone().unwrap();
        assert_eq!(change.name, "Altitude");
        assert_eq!(change.from, Some(100));
        assert_eq!(change.to, Some(250));
    }

    #[test]
    fn test_lifecycle_handlers_run_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let first = Arc::clone(&order);
        let second = Arc::clone(&order);
        let stopped = Arc::clone(&order);
        let mut plugin = Plugin::builder("Test", "1.0.0")
            .on_init(move |_ctx: &mut EventContext<'_>| {
                first.lock().unwrap().push("init one");
                Ok(())
            })
            .on_init(move |_ctx: &mut EventContext<'_>| {
                second.lock().unwrap().push("init two");
                Ok(())
            })
            .on_stop(move || {
                stopped.lock().unwrap().push("stop");
                Ok(())
            })
            .build()
            .unwrap();
        let mut proxy = FakeProxy::new();

        plugin.on_init(&mut proxy);
        plugin.on_stop();

        assert_eq!(*order.lock().unwrap(), vec!["init one", "init two", "stop"]);
    }

    #[test]
    fn test_init_restores_persisted_level() {
        let mut plugin = Plugin::builder("Test", "1.0.0").build().unwrap();
        let mut proxy = FakeProxy::new();
        proxy
            .texts
            .insert("Test.loglevel#".to_string(), "debug".to_string());

        plugin.on_init(&mut proxy);

        assert_eq!(plugin.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_failing_stop_handler_is_contained() {
        let counter = Arc::new(AtomicUsize::new(0));
        let after = Arc::clone(&counter);
        let mut plugin = Plugin::builder("Test", "1.0.0")
            .on_stop(|| Err("no proxy here".into()))
            .on_stop(move || {
                after.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build()
            .unwrap();

        plugin.on_stop();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_programmatic_add_and_remove() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut plugin = Plugin::builder("Test", "1.0.0").build().unwrap();
        let mut proxy = FakeProxy::new();

        let id = plugin
            .handlers_mut()
            .add_context(&["dynamic"], counting_handler(&counter))
            .unwrap();

        plugin.on_event(&mut proxy, "dynamic");
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        assert!(plugin.handlers_mut().remove(id));
        plugin.on_event(&mut proxy, "dynamic");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(proxy.logged("invalid event key 'dynamic'"));
    }

    #[test]
    fn test_bad_pattern_fails_build() {
        let result = Plugin::builder("Test", "1.0.0")
            .on_context(&["^unclosed("], |_ctx: &mut EventContext<'_>, _key: &str| Ok(()))
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_handlers_can_run_host_commands() {
        let mut plugin = Plugin::builder("Test", "1.0.0")
            .on_context(&["dock"], |ctx: &mut EventContext<'_>, _key: &str| {
                ctx.commands().run("dock request");
                Ok(())
            })
            .build()
            .unwrap();
        let mut proxy = FakeProxy::new();
        proxy.known_commands.push("dock request".to_string());

        plugin.on_event(&mut proxy, "dock");

        assert_eq!(proxy.executed.len(), 1);
        assert_eq!(proxy.executed[0].name, "dock request");
    }

    #[cfg(feature = "bridge")]
    #[test]
    fn test_bridge_drains_after_dispatch() {
        use tracing_subscriber::layer::SubscriberExt;

        let mut plugin = Plugin::builder("Test", "1.0.0")
            .on_context(&["noisy"], |_ctx: &mut EventContext<'_>, _key: &str| {
                tracing::warn!(target: "plugin", "sensor glitch");
                Ok(())
            })
            .build()
            .unwrap();
        let layer = plugin.install_log_bridge();
        let subscriber = tracing_subscriber::registry().with(layer);
        let mut proxy = FakeProxy::new();

        tracing::subscriber::with_default(subscriber, || {
            plugin.on_event(&mut proxy, "noisy");
        });

        assert!(proxy.logged("WARN | Test: sensor glitch"));
    }
}
