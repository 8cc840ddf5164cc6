//! The capability interface the framework needs from its host.
//!
//! The host stores variables in independently-typed namespaces: a boolean
//! named `x` and a text named `x` are different slots, which is why every
//! accessor here is typed. The plugin-glue layer adapts the real host object
//! to this trait; everything above it stays host-agnostic and can be tested
//! with an in-memory fake.

use chrono::NaiveDateTime;

use super::commands::CommandInvocation;

/// Narrow interface to the host environment.
///
/// Setters take `None` to clear the variable's slot for that type.
pub trait HostProxy {
    /// Read a boolean variable.
    fn get_boolean(&self, name: &str) -> Option<bool>;
    /// Read an integer variable.
    fn get_int(&self, name: &str) -> Option<i32>;
    /// Read a small (16-bit) integer variable.
    fn get_small_int(&self, name: &str) -> Option<i16>;
    /// Read a decimal variable.
    fn get_decimal(&self, name: &str) -> Option<f64>;
    /// Read a date/time variable.
    fn get_date(&self, name: &str) -> Option<NaiveDateTime>;
    /// Read a text variable.
    fn get_text(&self, name: &str) -> Option<String>;

    /// Write or clear a boolean variable.
    fn set_boolean(&mut self, name: &str, value: Option<bool>);
    /// Write or clear an integer variable.
    fn set_int(&mut self, name: &str, value: Option<i32>);
    /// Write or clear a small integer variable.
    fn set_small_int(&mut self, name: &str, value: Option<i16>);
    /// Write or clear a decimal variable.
    fn set_decimal(&mut self, name: &str, value: Option<f64>);
    /// Write or clear a date/time variable.
    fn set_date(&mut self, name: &str, value: Option<NaiveDateTime>);
    /// Write or clear a text variable.
    fn set_text(&mut self, name: &str, value: Option<&str>);

    /// Append a line to the host's event log with the given colour tag.
    fn write_to_log(&mut self, message: &str, colour: &str);

    /// Check whether a named host command exists in the current profile.
    fn command_exists(&self, name: &str) -> bool;

    /// Execute a named host command with positional typed parameters.
    fn execute_command(&mut self, invocation: CommandInvocation);
}
