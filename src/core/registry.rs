//! Handler registration and routing tables.
//!
//! Handlers are grouped by event kind into ordered lists; insertion order is
//! firing order and stays stable across runs. Keyed kinds (contexts and the
//! five variable-change kinds) carry compiled patterns; init, exit and stop
//! are plain multicast lists.

use chrono::NaiveDateTime;

use super::context::{EventContext, HandlerResult};
use super::events::{EventKind, VarChange};
use super::pattern::{Pattern, PatternError};
use super::variables::VarValue;

/// Handler for a context event; receives the (lower-cased) event key.
pub type ContextHandler =
    Box<dyn Fn(&mut EventContext<'_>, &str) -> HandlerResult + Send + Sync>;

/// Handler for a variable change of type `T`.
pub type ChangeHandler<T> =
    Box<dyn Fn(&mut EventContext<'_>, &VarChange<T>) -> HandlerResult + Send + Sync>;

/// Handler for the init and exit lifecycle events.
pub type LifecycleHandler = Box<dyn Fn(&mut EventContext<'_>) -> HandlerResult + Send + Sync>;

/// Handler for the stop event. The host passes no proxy here.
pub type StopHandler = Box<dyn Fn() -> HandlerResult + Send + Sync>;

/// Identifies a registered handler for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// A registered handler together with its match patterns.
///
/// A handler fires at most once per event, even when several of its patterns
/// match the incoming key.
pub struct HandlerEntry<H> {
    id: HandlerId,
    patterns: Vec<Pattern>,
    handler: H,
}

impl<H> HandlerEntry<H> {
    /// The entry's removal id.
    #[inline]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// The entry's compiled patterns. Empty for unkeyed kinds.
    #[inline]
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// The registered handler.
    #[inline]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Check whether any of this entry's patterns matches the key.
    pub fn matches(&self, key: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(key))
    }
}

/// An ordered, growable list of handlers for one event kind.
pub struct HandlerList<H> {
    entries: Vec<HandlerEntry<H>>,
}

impl<H> Default for HandlerList<H> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<H> HandlerList<H> {
    fn push(&mut self, id: HandlerId, patterns: Vec<Pattern>, handler: H) {
        self.entries.push(HandlerEntry {
            id,
            patterns,
            handler,
        });
    }

    /// Detach the handler with the given id. Returns `false` if it was not
    /// in this list.
    pub fn remove(&mut self, id: HandlerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Iterate over entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &HandlerEntry<H>> {
        self.entries.iter()
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A variable type whose changes the host notifies about.
///
/// The host raises change events for five of the six variable types; small
/// integers are read/write only, so `i16` deliberately does not implement
/// this trait.
pub trait ChangeValue: VarValue {
    /// The routing table list for this type.
    fn list(registry: &HandlerRegistry) -> &HandlerList<ChangeHandler<Self>>;

    /// Mutable access to the routing table list for this type.
    fn list_mut(registry: &mut HandlerRegistry) -> &mut HandlerList<ChangeHandler<Self>>;

    /// The change event kind for this type.
    fn change_kind() -> EventKind;

    /// For text values, the value as potential log level text. Used by the
    /// dispatch engine's reserved log-level variable handling.
    fn level_text(value: &Self) -> Option<&str> {
        let _ = value;
        None
    }
}

macro_rules! impl_change_value {
    ($type:ty, $field:ident, $kind:expr) => {
        impl ChangeValue for $type {
            fn list(registry: &HandlerRegistry) -> &HandlerList<ChangeHandler<Self>> {
                &registry.$field
            }

            fn list_mut(registry: &mut HandlerRegistry) -> &mut HandlerList<ChangeHandler<Self>> {
                &mut registry.$field
            }

            fn change_kind() -> EventKind {
                $kind
            }
        }
    };
}

impl_change_value!(bool, booleans, EventKind::BoolChanged);
impl_change_value!(i32, integers, EventKind::IntChanged);
impl_change_value!(f64, decimals, EventKind::DecimalChanged);
impl_change_value!(NaiveDateTime, dates, EventKind::DateTimeChanged);

impl ChangeValue for String {
    fn list(registry: &HandlerRegistry) -> &HandlerList<ChangeHandler<Self>> {
        &registry.texts
    }

    fn list_mut(registry: &mut HandlerRegistry) -> &mut HandlerList<ChangeHandler<Self>> {
        &mut registry.texts
    }

    fn change_kind() -> EventKind {
        EventKind::TextChanged
    }

    fn level_text(value: &Self) -> Option<&str> {
        Some(value)
    }
}

/// The routing tables for every event kind.
///
/// Built once when the plugin is constructed and read-mostly afterwards;
/// `add_*` and [`remove`](HandlerRegistry::remove) cover programmatic
/// registration outside declarative setup.
#[derive(Default)]
pub struct HandlerRegistry {
    next_id: u64,
    contexts: HandlerList<ContextHandler>,
    booleans: HandlerList<ChangeHandler<bool>>,
    integers: HandlerList<ChangeHandler<i32>>,
    decimals: HandlerList<ChangeHandler<f64>>,
    dates: HandlerList<ChangeHandler<NaiveDateTime>>,
    texts: HandlerList<ChangeHandler<String>>,
    inits: HandlerList<LifecycleHandler>,
    exits: HandlerList<LifecycleHandler>,
    stops: HandlerList<StopHandler>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> HandlerId {
        self.next_id += 1;
        HandlerId(self.next_id)
    }

    fn compile(patterns: &[&str]) -> Result<Vec<Pattern>, PatternError> {
        patterns.iter().map(|text| Pattern::parse(text)).collect()
    }

    /// Register a context handler for the given patterns.
    ///
    /// Fails fast when a pattern does not compile.
    pub fn add_context<F>(&mut self, patterns: &[&str], handler: F) -> Result<HandlerId, PatternError>
    where
        F: Fn(&mut EventContext<'_>, &str) -> HandlerResult + Send + Sync + 'static,
    {
        let patterns = Self::compile(patterns)?;
        Ok(self.add_context_compiled(patterns, handler))
    }

    /// Register a context handler with already-compiled patterns.
    pub(crate) fn add_context_compiled<F>(&mut self, patterns: Vec<Pattern>, handler: F) -> HandlerId
    where
        F: Fn(&mut EventContext<'_>, &str) -> HandlerResult + Send + Sync + 'static,
    {
        let id = self.next();
        self.contexts.push(id, patterns, Box::new(handler));
        id
    }

    /// Register a change handler for variables of type `T` matching the
    /// given name patterns.
    pub fn add_changed<T, F>(&mut self, patterns: &[&str], handler: F) -> Result<HandlerId, PatternError>
    where
        T: ChangeValue,
        F: Fn(&mut EventContext<'_>, &VarChange<T>) -> HandlerResult + Send + Sync + 'static,
    {
        let patterns = Self::compile(patterns)?;
        let id = self.next();
        T::list_mut(self).push(id, patterns, Box::new(handler));
        Ok(id)
    }

    /// Register an init handler.
    pub fn add_init<F>(&mut self, handler: F) -> HandlerId
    where
        F: Fn(&mut EventContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        let id = self.next();
        self.inits.push(id, Vec::new(), Box::new(handler));
        id
    }

    /// Register an exit handler.
    pub fn add_exit<F>(&mut self, handler: F) -> HandlerId
    where
        F: Fn(&mut EventContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        let id = self.next();
        self.exits.push(id, Vec::new(), Box::new(handler));
        id
    }

    /// Register a stop handler.
    pub fn add_stop<F>(&mut self, handler: F) -> HandlerId
    where
        F: Fn() -> HandlerResult + Send + Sync + 'static,
    {
        let id = self.next();
        self.stops.push(id, Vec::new(), Box::new(handler));
        id
    }

    /// Detach a handler by id, whichever kind it was registered for.
    ///
    /// Returns `false` if no handler with that id is registered.
    pub fn remove(&mut self, id: HandlerId) -> bool {
        self.contexts.remove(id)
            || self.booleans.remove(id)
            || self.integers.remove(id)
            || self.decimals.remove(id)
            || self.dates.remove(id)
            || self.texts.remove(id)
            || self.inits.remove(id)
            || self.exits.remove(id)
            || self.stops.remove(id)
    }

    /// The context handler list.
    pub fn contexts(&self) -> &HandlerList<ContextHandler> {
        &self.contexts
    }

    /// The init handler list.
    pub fn inits(&self) -> &HandlerList<LifecycleHandler> {
        &self.inits
    }

    /// The exit handler list.
    pub fn exits(&self) -> &HandlerList<LifecycleHandler> {
        &self.exits
    }

    /// The stop handler list.
    pub fn stops(&self) -> &HandlerList<StopHandler> {
        &self.stops
    }

    /// Number of handlers registered for an event kind.
    pub fn count(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::Context => self.contexts.len(),
            EventKind::BoolChanged => self.booleans.len(),
            EventKind::IntChanged => self.integers.len(),
            EventKind::DecimalChanged => self.decimals.len(),
            EventKind::DateTimeChanged => self.dates.len(),
            EventKind::TextChanged => self.texts.len(),
            EventKind::Init => self.inits.len(),
            EventKind::Exit => self.exits.len(),
            EventKind::Stop => self.stops.len(),
        }
    }
}
