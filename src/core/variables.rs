//! Typed access to host variables.
//!
//! The host keeps one independently-typed slot per name and type, so reads
//! and writes must be dispatched on the type the *caller* asks for. The
//! [`VarValue`] trait closes over exactly the six types the host supports;
//! it is sealed, so an unsupported type is a compile error rather than a
//! runtime one.

use chrono::NaiveDateTime;

use super::proxy::HostProxy;

mod sealed {
    pub trait Sealed {}

    impl Sealed for bool {}
    impl Sealed for i32 {}
    impl Sealed for i16 {}
    impl Sealed for f64 {}
    impl Sealed for chrono::NaiveDateTime {}
    impl Sealed for String {}
}

/// Discriminant for the host's variable types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    /// A boolean variable.
    Boolean,
    /// A 32-bit integer variable.
    Integer,
    /// A 16-bit integer variable.
    SmallInteger,
    /// A decimal variable.
    Decimal,
    /// A date/time variable.
    DateTime,
    /// A text variable.
    Text,
}

impl VarKind {
    /// Human-readable name of the kind.
    pub fn name(self) -> &'static str {
        match self {
            VarKind::Boolean => "boolean",
            VarKind::Integer => "integer",
            VarKind::SmallInteger => "small integer",
            VarKind::Decimal => "decimal",
            VarKind::DateTime => "date/time",
            VarKind::Text => "text",
        }
    }
}

/// A host variable value with its type tag; each variant can be unset.
///
/// This is the dynamic counterpart to [`VarValue`], for callers that only
/// know the kind at runtime. Instances are ephemeral, built per call.
#[derive(Debug, Clone, PartialEq)]
pub enum VarScalar {
    /// A boolean value or an unset boolean slot.
    Boolean(Option<bool>),
    /// An integer value or an unset integer slot.
    Integer(Option<i32>),
    /// A small integer value or an unset small integer slot.
    SmallInteger(Option<i16>),
    /// A decimal value or an unset decimal slot.
    Decimal(Option<f64>),
    /// A date/time value or an unset date/time slot.
    DateTime(Option<NaiveDateTime>),
    /// A text value or an unset text slot.
    Text(Option<String>),
}

impl VarScalar {
    /// The kind of this value.
    pub fn kind(&self) -> VarKind {
        match self {
            VarScalar::Boolean(_) => VarKind::Boolean,
            VarScalar::Integer(_) => VarKind::Integer,
            VarScalar::SmallInteger(_) => VarKind::SmallInteger,
            VarScalar::Decimal(_) => VarKind::Decimal,
            VarScalar::DateTime(_) => VarKind::DateTime,
            VarScalar::Text(_) => VarKind::Text,
        }
    }

    /// True if this value represents an unset slot.
    pub fn is_unset(&self) -> bool {
        match self {
            VarScalar::Boolean(value) => value.is_none(),
            VarScalar::Integer(value) => value.is_none(),
            VarScalar::SmallInteger(value) => value.is_none(),
            VarScalar::Decimal(value) => value.is_none(),
            VarScalar::DateTime(value) => value.is_none(),
            VarScalar::Text(value) => value.is_none(),
        }
    }

    /// Read the named variable's slot of the given kind.
    pub fn read<P: HostProxy + ?Sized>(proxy: &P, kind: VarKind, name: &str) -> VarScalar {
        match kind {
            VarKind::Boolean => VarScalar::Boolean(proxy.get_boolean(name)),
            VarKind::Integer => VarScalar::Integer(proxy.get_int(name)),
            VarKind::SmallInteger => VarScalar::SmallInteger(proxy.get_small_int(name)),
            VarKind::Decimal => VarScalar::Decimal(proxy.get_decimal(name)),
            VarKind::DateTime => VarScalar::DateTime(proxy.get_date(name)),
            VarKind::Text => VarScalar::Text(proxy.get_text(name)),
        }
    }

    /// Write this value (or clear the slot, for unset variants).
    pub fn write<P: HostProxy + ?Sized>(self, proxy: &mut P, name: &str) {
        match self {
            VarScalar::Boolean(value) => proxy.set_boolean(name, value),
            VarScalar::Integer(value) => proxy.set_int(name, value),
            VarScalar::SmallInteger(value) => proxy.set_small_int(name, value),
            VarScalar::Decimal(value) => proxy.set_decimal(name, value),
            VarScalar::DateTime(value) => proxy.set_date(name, value),
            VarScalar::Text(value) => proxy.set_text(name, value.as_deref()),
        }
    }
}

/// A type the host can store in a variable.
///
/// Implemented for `bool`, `i32`, `i16`, `f64`, [`NaiveDateTime`] and
/// `String`; no other implementations are possible.
pub trait VarValue: Clone + Send + Sync + sealed::Sealed + 'static {
    /// The kind tag for this type.
    const KIND: VarKind;

    /// Read the named variable through the proxy accessor for this type.
    fn read<P: HostProxy + ?Sized>(proxy: &P, name: &str) -> Option<Self>;

    /// Write (or clear, for `None`) the named variable through the proxy
    /// accessor for this type.
    fn write<P: HostProxy + ?Sized>(proxy: &mut P, name: &str, value: Option<Self>);
}

impl VarValue for bool {
    const KIND: VarKind = VarKind::Boolean;

    fn read<P: HostProxy + ?Sized>(proxy: &P, name: &str) -> Option<Self> {
        proxy.get_boolean(name)
    }

    fn write<P: HostProxy + ?Sized>(proxy: &mut P, name: &str, value: Option<Self>) {
        proxy.set_boolean(name, value);
    }
}

impl VarValue for i32 {
    const KIND: VarKind = VarKind::Integer;

    fn read<P: HostProxy + ?Sized>(proxy: &P, name: &str) -> Option<Self> {
        proxy.get_int(name)
    }

    fn write<P: HostProxy + ?Sized>(proxy: &mut P, name: &str, value: Option<Self>) {
        proxy.set_int(name, value);
    }
}

impl VarValue for i16 {
    const KIND: VarKind = VarKind::SmallInteger;

    fn read<P: HostProxy + ?Sized>(proxy: &P, name: &str) -> Option<Self> {
        proxy.get_small_int(name)
    }

    fn write<P: HostProxy + ?Sized>(proxy: &mut P, name: &str, value: Option<Self>) {
        proxy.set_small_int(name, value);
    }
}

impl VarValue for f64 {
    const KIND: VarKind = VarKind::Decimal;

    fn read<P: HostProxy + ?Sized>(proxy: &P, name: &str) -> Option<Self> {
        proxy.get_decimal(name)
    }

    fn write<P: HostProxy + ?Sized>(proxy: &mut P, name: &str, value: Option<Self>) {
        proxy.set_decimal(name, value);
    }
}

impl VarValue for NaiveDateTime {
    const KIND: VarKind = VarKind::DateTime;

    fn read<P: HostProxy + ?Sized>(proxy: &P, name: &str) -> Option<Self> {
        proxy.get_date(name)
    }

    fn write<P: HostProxy + ?Sized>(proxy: &mut P, name: &str, value: Option<Self>) {
        proxy.set_date(name, value);
    }
}

impl VarValue for String {
    const KIND: VarKind = VarKind::Text;

    fn read<P: HostProxy + ?Sized>(proxy: &P, name: &str) -> Option<Self> {
        proxy.get_text(name)
    }

    fn write<P: HostProxy + ?Sized>(proxy: &mut P, name: &str, value: Option<Self>) {
        proxy.set_text(name, value.as_deref());
    }
}

/// Generic variable access over any [`HostProxy`].
///
/// # Examples
///
/// ```ignore
/// use vaplug::core::ProxyExt;
///
/// proxy.set::<String>("greeting", Some("hello".to_string()));
/// let greeting: Option<String> = proxy.get("greeting");
/// proxy.unset::<String>("greeting");
/// ```
pub trait ProxyExt {
    /// Read the named variable as type `T`.
    fn get<T: VarValue>(&self, name: &str) -> Option<T>;

    /// Write the named variable. `None` clears the slot, same as
    /// [`unset`](ProxyExt::unset).
    fn set<T: VarValue>(&mut self, name: &str, value: Option<T>);

    /// Clear the named variable's slot for type `T`.
    fn unset<T: VarValue>(&mut self, name: &str);
}

impl<P: HostProxy + ?Sized> ProxyExt for P {
    fn get<T: VarValue>(&self, name: &str) -> Option<T> {
        T::read(self, name)
    }

    fn set<T: VarValue>(&mut self, name: &str, value: Option<T>) {
        T::write(self, name, value);
    }

    fn unset<T: VarValue>(&mut self, name: &str) {
        T::write(self, name, None);
    }
}
