//! Event kinds and payload shapes.

/// The kinds of events a handler can be registered for.
///
/// Context events carry a key and route through patterns; the five change
/// kinds carry a variable name plus old and new values; init, exit and stop
/// are unkeyed multicasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A named invocation context.
    Context,
    /// A boolean variable changed.
    BoolChanged,
    /// An integer variable changed.
    IntChanged,
    /// A decimal variable changed.
    DecimalChanged,
    /// A date/time variable changed.
    DateTimeChanged,
    /// A text variable changed.
    TextChanged,
    /// Plugin initialization.
    Init,
    /// Host shutdown.
    Exit,
    /// All host commands stopped.
    Stop,
}

/// Payload of a variable change notification.
///
/// `from` and `to` are `None` when the respective slot was unset.
#[derive(Debug, Clone, PartialEq)]
pub struct VarChange<T> {
    /// The variable's name, as reported by the host.
    pub name: String,
    /// The previous value.
    pub from: Option<T>,
    /// The new value.
    pub to: Option<T>,
}

impl<T> VarChange<T> {
    /// Create a new change payload.
    pub fn new(name: impl Into<String>, from: Option<T>, to: Option<T>) -> Self {
        Self {
            name: name.into(),
            from,
            to,
        }
    }

    /// True if the variable was just unset.
    pub fn is_cleared(&self) -> bool {
        self.from.is_some() && self.to.is_none()
    }
}
