//! Forwarding `tracing` events into the host's event log.
//!
//! Handler code often already uses `tracing` macros. [`LogBridgeLayer`]
//! captures those events into a channel; the plugin drains the channel
//! through the leveled sink at the end of every host entry point, so the
//! output lands in the host log with the usual prefix and level filter.

use std::sync::mpsc;

use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::field::Visit;
use tracing_subscriber::registry::LookupSpan;

use crate::core::HostProxy;
use crate::logging::{LogLevel, LogSink};

/// A captured `tracing` event awaiting transfer to the host log.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    /// The event's message field.
    pub message: String,
    /// The host log level the event maps to.
    pub level: LogLevel,
    /// The `tracing` target the event was emitted under.
    pub target: &'static str,
}

/// Receiving end of the capture channel, owned by the plugin.
pub struct LogBridge {
    sender: mpsc::Sender<CapturedEvent>,
    receiver: mpsc::Receiver<CapturedEvent>,
}

impl LogBridge {
    /// Create a new bridge.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    /// A layer for the plugin author's subscriber that feeds this bridge.
    pub fn layer(&self) -> LogBridgeLayer {
        LogBridgeLayer {
            sender: self.sender.clone(),
        }
    }

    /// Write all captured events to the host log, in emission order.
    pub fn drain(&self, log: &LogSink, proxy: &mut dyn HostProxy) {
        for event in self.receiver.try_iter() {
            log.log(proxy, event.level, &event.message);
        }
    }
}

impl Default for LogBridge {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`Layer`] that captures log events and sends them to a [`LogBridge`].
pub struct LogBridgeLayer {
    sender: mpsc::Sender<CapturedEvent>,
}

fn map_level(level: tracing::Level) -> LogLevel {
    if level == tracing::Level::ERROR {
        LogLevel::Error
    } else if level == tracing::Level::WARN {
        LogLevel::Warn
    } else if level == tracing::Level::INFO {
        LogLevel::Info
    } else {
        LogLevel::Debug
    }
}

impl<S: Subscriber + for<'a> LookupSpan<'a>> Layer<S> for LogBridgeLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        // The framework's own diagnostics stay out of the host log.
        let target = metadata.target();
        if target == env!("CARGO_PKG_NAME")
            || target.starts_with(concat!(env!("CARGO_PKG_NAME"), "::"))
        {
            return;
        }

        let mut message = None;
        event.record(&mut MessageVisitor(&mut message));
        if let Some(message) = message {
            let _ = self.sender.send(CapturedEvent {
                message,
                level: map_level(*metadata.level()),
                target: metadata.target(),
            });
        }
    }
}

/// A [`Visit`]or that records an event's message field.
struct MessageVisitor<'a>(&'a mut Option<String>);

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.0 = Some(format!("{value:?}"));
        }
    }
}
