//! Core dispatch types with no host-specific dependencies.
//!
//! This module provides the fundamental building blocks:
//! - [`Pattern`] - Exact and regex match rules for event keys
//! - [`HandlerRegistry`] - Per-kind routing tables with ordered handler lists
//! - [`HostProxy`] - The capability interface the host glue implements
//! - [`VarValue`] / [`ProxyExt`] - Typed access to host variables
//! - [`EventContext`] - The per-invocation view handlers receive
//! - [`CommandRunner`] - Running named host commands

mod commands;
mod context;
mod events;
mod pattern;
mod proxy;
mod registry;
mod variables;

pub use commands::{CommandInvocation, CommandParams, CommandRunner, RunOptions};
pub use context::{EventContext, HandlerError, HandlerResult};
pub use events::{EventKind, VarChange};
pub use pattern::{MATCH_ALL, Pattern, PatternError};
pub use proxy::HostProxy;
pub use registry::{
    ChangeHandler, ChangeValue, ContextHandler, HandlerEntry, HandlerId, HandlerList,
    HandlerRegistry, LifecycleHandler, StopHandler,
};
pub use variables::{ProxyExt, VarKind, VarScalar, VarValue};

#[cfg(test)]
pub(crate) use proxy::fake;
