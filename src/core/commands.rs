//! Running named host commands from a plugin.

use chrono::NaiveDateTime;

use super::proxy::HostProxy;
use crate::logging::LogSink;

/// Positional typed parameter arrays passed to a host command.
///
/// The host exposes one positional array per variable type; each is
/// optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandParams {
    /// Text parameters.
    pub text: Option<Vec<String>>,
    /// Integer parameters.
    pub integers: Option<Vec<i32>>,
    /// Decimal parameters.
    pub decimals: Option<Vec<f64>>,
    /// Boolean parameters.
    pub booleans: Option<Vec<bool>>,
    /// Date/time parameters.
    pub dates: Option<Vec<NaiveDateTime>>,
}

impl CommandParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text parameters.
    pub fn text<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Set the integer parameters.
    pub fn integers(mut self, values: impl IntoIterator<Item = i32>) -> Self {
        self.integers = Some(values.into_iter().collect());
        self
    }

    /// Set the decimal parameters.
    pub fn decimals(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.decimals = Some(values.into_iter().collect());
        self
    }

    /// Set the boolean parameters.
    pub fn booleans(mut self, values: impl IntoIterator<Item = bool>) -> Self {
        self.booleans = Some(values.into_iter().collect());
        self
    }

    /// Set the date/time parameters.
    pub fn dates(mut self, values: impl IntoIterator<Item = NaiveDateTime>) -> Self {
        self.dates = Some(values.into_iter().collect());
        self
    }

    /// True if no parameter array is set.
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.integers.is_none()
            && self.decimals.is_none()
            && self.booleans.is_none()
            && self.dates.is_none()
    }
}

/// A fully-described command execution handed to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandInvocation {
    /// The command's name in the current profile.
    pub name: String,
    /// Wait for the command to finish before returning.
    pub wait: bool,
    /// Run as a subcommand of the current command context.
    pub as_subcommand: bool,
    /// Positional typed parameters.
    pub params: CommandParams,
}

/// Options for [`CommandRunner::run_with`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Log a warning when the command does not exist. Default `true`.
    pub log_missing: bool,
    /// Wait for the command to finish before returning. Default `false`.
    pub wait: bool,
    /// Run as a subcommand of the current command context. Default `false`.
    pub as_subcommand: bool,
    /// Parameters to pass.
    pub params: CommandParams,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            log_missing: true,
            wait: false,
            as_subcommand: false,
            params: CommandParams::new(),
        }
    }
}

/// Runs named commands in the host's current profile.
///
/// Obtained from [`EventContext::commands`](super::EventContext::commands).
pub struct CommandRunner<'a> {
    proxy: &'a mut dyn HostProxy,
    log: &'a LogSink,
}

impl<'a> CommandRunner<'a> {
    pub(crate) fn new(proxy: &'a mut dyn HostProxy, log: &'a LogSink) -> Self {
        Self { proxy, log }
    }

    /// Run a command with default options.
    pub fn run(&mut self, command: &str) {
        self.run_with(command, RunOptions::default());
    }

    /// Run a command.
    ///
    /// A command missing from the current profile logs a warning (unless
    /// suppressed via [`RunOptions::log_missing`]) and is otherwise a no-op.
    pub fn run_with(&mut self, command: &str, options: RunOptions) {
        if self.proxy.command_exists(command) {
            if !options.params.is_empty() {
                self.log
                    .debug(self.proxy, &format!("Passing parameters to command '{command}'."));
            }
            self.log
                .debug(self.proxy, &format!("Running command '{command}'."));
            self.proxy.execute_command(CommandInvocation {
                name: command.to_string(),
                wait: options.wait,
                as_subcommand: options.as_subcommand,
                params: options.params,
            });
        } else if options.log_missing {
            self.log
                .warn(self.proxy, &format!("Tried running missing command '{command}'."));
        }
    }

    /// Run `<prefix>.<command>` for each prefix.
    pub fn run_all(&mut self, prefixes: &[&str], command: &str, options: &RunOptions) {
        for prefix in prefixes {
            self.run_with(&format!("{prefix}.{command}"), options.clone());
        }
    }

    /// Run an event command. Event commands are enclosed in double
    /// parentheses by convention; they are added here.
    pub fn trigger_event(&mut self, name: &str, options: RunOptions) {
        self.run_with(&format!("(({name}))"), options);
    }

    /// Run `((<prefix>.<name>))` for each prefix.
    pub fn trigger_event_all(&mut self, prefixes: &[&str], name: &str, options: &RunOptions) {
        for prefix in prefixes {
            self.run_with(&format!("(({prefix}.{name}))"), options.clone());
        }
    }
}
