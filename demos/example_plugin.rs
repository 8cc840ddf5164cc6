//! A fuller plugin: lifecycle handlers, exact and regex contexts, variable
//! change notifications, host commands and the persisted log level.
//!
//! Run with: cargo run --example example_plugin

use std::collections::HashMap;

use vaplug::CommandInvocation;
use vaplug::prelude::*;

/// An in-memory host with one typed slot namespace per variable type,
/// mirroring how the real host stores variables.
#[derive(Default)]
struct InMemoryHost {
    booleans: HashMap<String, bool>,
    integers: HashMap<String, i32>,
    small_integers: HashMap<String, i16>,
    decimals: HashMap<String, f64>,
    dates: HashMap<String, chrono::NaiveDateTime>,
    texts: HashMap<String, String>,
    commands: Vec<String>,
}

fn store<V>(map: &mut HashMap<String, V>, name: &str, value: Option<V>) {
    match value {
        Some(value) => {
            map.insert(name.to_string(), value);
        }
        None => {
            map.remove(name);
        }
    }
}

impl HostProxy for InMemoryHost {
    fn get_boolean(&self, name: &str) -> Option<bool> {
        self.booleans.get(name).copied()
    }

    fn get_int(&self, name: &str) -> Option<i32> {
        self.integers.get(name).copied()
    }

    fn get_small_int(&self, name: &str) -> Option<i16> {
        self.small_integers.get(name).copied()
    }

    fn get_decimal(&self, name: &str) -> Option<f64> {
        self.decimals.get(name).copied()
    }

    fn get_date(&self, name: &str) -> Option<chrono::NaiveDateTime> {
        self.dates.get(name).copied()
    }

    fn get_text(&self, name: &str) -> Option<String> {
        self.texts.get(name).cloned()
    }

    fn set_boolean(&mut self, name: &str, value: Option<bool>) {
        store(&mut self.booleans, name, value);
    }

    fn set_int(&mut self, name: &str, value: Option<i32>) {
        store(&mut self.integers, name, value);
    }

    fn set_small_int(&mut self, name: &str, value: Option<i16>) {
        store(&mut self.small_integers, name, value);
    }

    fn set_decimal(&mut self, name: &str, value: Option<f64>) {
        store(&mut self.decimals, name, value);
    }

    fn set_date(&mut self, name: &str, value: Option<chrono::NaiveDateTime>) {
        store(&mut self.dates, name, value);
    }

    fn set_text(&mut self, name: &str, value: Option<&str>) {
        store(&mut self.texts, name, value.map(str::to_string));
    }

    fn write_to_log(&mut self, message: &str, colour: &str) {
        println!("[{colour}] {message}");
    }

    fn command_exists(&self, name: &str) -> bool {
        self.commands.iter().any(|known| known == name)
    }

    fn execute_command(&mut self, invocation: CommandInvocation) {
        println!(">> executing '{}' (wait: {})", invocation.name, invocation.wait);
    }
}

fn main() {
    let mut plugin = Plugin::builder("Example Plugin", "0.0.1")
        .info("This is a description")
        .guid("{76FE674F-F729-45FD-A1DD-E53E9E66B360}")
        .on_init(|ctx: &mut EventContext<'_>| {
            ctx.log().notice("This is the example init handler.");
            Ok(())
        })
        .on_exit(|ctx: &mut EventContext<'_>| {
            ctx.log().notice("This is the example exit handler.");
            Ok(())
        })
        .on_stop(|| {
            println!("(stop received, no host proxy here)");
            Ok(())
        })
        // Handles the "test" and "different test" contexts; expects the
        // invoking command to set a "~test" text parameter.
        .on_context(
            &["test", "different test"],
            |ctx: &mut EventContext<'_>, key: &str| {
                let value: String = ctx.require("~test")?;
                ctx.log()
                    .notice(&format!("Context '{key}' invoked, '~test' is '{value}'."));
                Ok(())
            },
        )
        // Handles every context beginning with "foo" or containing "bar".
        .on_context(&["^foo.*", "^.*bar.*"], |ctx: &mut EventContext<'_>, key: &str| {
            ctx.log().notice(&format!("Regex context invoked with '{key}'."));
            Ok(())
        })
        // Runs a host command whenever the "greet" context fires.
        .on_context(&["greet"], |ctx: &mut EventContext<'_>, _key: &str| {
            ctx.commands().run("Say Hello");
            Ok(())
        })
        .on_text_changed(
            &["watched text#"],
            |ctx: &mut EventContext<'_>, change: &VarChange<String>| {
                ctx.log().info(&format!(
                    "'{}' changed from {:?} to {:?}.",
                    change.name, change.from, change.to
                ));
                Ok(())
            },
        )
        .build()
        .expect("all patterns compile");

    println!("-- {}", plugin.display_name());

    let mut host = InMemoryHost::default();
    host.commands.push("Say Hello".to_string());

    plugin.on_init(&mut host);

    host.set_text("~test", Some("a value"));
    plugin.on_event(&mut host, "Test");
    plugin.on_event(&mut host, "foobar");
    plugin.on_event(&mut host, "greet");

    // Watched variable, then the reserved log level variable.
    plugin.on_variable_changed::<String>(
        &mut host,
        "watched text#",
        None,
        Some("first".to_string()),
    );
    plugin.on_variable_changed::<String>(
        &mut host,
        "Example Plugin.loglevel#",
        None,
        Some("info".to_string()),
    );
    plugin.on_variable_changed::<String>(
        &mut host,
        "watched text#",
        Some("first".to_string()),
        Some("second".to_string()),
    );

    // Nothing registered for this one.
    plugin.on_event(&mut host, "unknown context");

    plugin.on_exit(&mut host);
    plugin.on_stop();
}
