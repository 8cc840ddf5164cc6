//! The smallest useful plugin: one context handler, stdout as the host log.
//!
//! Run with: cargo run --example minimal

use std::collections::HashMap;

use vaplug::prelude::*;
use vaplug::CommandInvocation;

/// Stands in for the host glue. A real plugin adapts the host's proxy
/// object to [`HostProxy`] instead.
#[derive(Default)]
struct ConsoleHost {
    texts: HashMap<String, String>,
}

impl HostProxy for ConsoleHost {
    fn get_boolean(&self, _name: &str) -> Option<bool> {
        None
    }

    fn get_int(&self, _name: &str) -> Option<i32> {
        None
    }

    fn get_small_int(&self, _name: &str) -> Option<i16> {
        None
    }

    fn get_decimal(&self, _name: &str) -> Option<f64> {
        None
    }

    fn get_date(&self, _name: &str) -> Option<chrono::NaiveDateTime> {
        None
    }

    fn get_text(&self, name: &str) -> Option<String> {
        self.texts.get(name).cloned()
    }

    fn set_boolean(&mut self, _name: &str, _value: Option<bool>) {}

    fn set_int(&mut self, _name: &str, _value: Option<i32>) {}

    fn set_small_int(&mut self, _name: &str, _value: Option<i16>) {}

    fn set_decimal(&mut self, _name: &str, _value: Option<f64>) {}

    fn set_date(&mut self, _name: &str, _value: Option<chrono::NaiveDateTime>) {}

    fn set_text(&mut self, name: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.texts.insert(name.to_string(), value.to_string());
            }
            None => {
                self.texts.remove(name);
            }
        }
    }

    fn write_to_log(&mut self, message: &str, colour: &str) {
        println!("[{colour}] {message}");
    }

    fn command_exists(&self, _name: &str) -> bool {
        false
    }

    fn execute_command(&mut self, _invocation: CommandInvocation) {}
}

fn main() {
    let mut plugin = Plugin::builder("Minimum Viable Plugin", "0.0.1")
        .info("This is a description")
        .guid("{2E5CDD74-0E05-4745-A791-76E8C5AABBC3}")
        .on_context(&["hello"], |ctx: &mut EventContext<'_>, _key: &str| {
            ctx.log().notice("Hello from the minimum viable plugin.");
            Ok(())
        })
        .build()
        .expect("all patterns are literal");

    let mut host = ConsoleHost::default();

    plugin.on_init(&mut host);
    plugin.on_event(&mut host, "hello");

    // Nothing matches, so the framework reports it in the host log.
    plugin.on_event(&mut host, "missing");
}
