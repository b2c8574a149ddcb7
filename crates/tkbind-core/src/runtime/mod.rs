//! The seam between the binding layer and the command-driven runtime
//!
//! A [`Runtime`] owns one execution context: a global variable namespace,
//! a global command namespace and an event loop. The binding layer talks to
//! it exclusively through script text plus three native hooks: named
//! commands, variable write traces and variable access.
//!
//! Runtimes are re-entered from inside handlers (a button callback usually
//! issues more commands), so every method takes `&self` and implementations
//! must not hold internal borrows while a handler runs.

use std::rc::Rc;

pub mod headless;

#[cfg(feature = "tcl")]
pub mod tcl;

pub use headless::HeadlessRuntime;

#[cfg(feature = "tcl")]
pub use tcl::TclRuntime;

/// Native implementation of a runtime command.
///
/// `args[0]` is the command name as invoked; the remaining entries are the
/// already-substituted argument words. The returned text becomes the
/// command result; an `Err` becomes a runtime error.
pub type CommandHandler = Rc<dyn Fn(&[String]) -> Result<String, String>>;

/// Native observer of writes to a global variable; receives the new value
pub type TraceHandler = Rc<dyn Fn(&str)>;

/// One runtime execution context
pub trait Runtime {
    /// Evaluate a script, returning its result text or the runtime diagnostic
    fn eval(&self, script: &str) -> Result<String, String>;

    /// Read a global variable
    fn get_var(&self, name: &str) -> Option<String>;

    /// Write a global variable, firing its write traces
    fn set_var(&self, name: &str, value: &str) -> Result<(), String>;

    /// Install (or replace) a named command backed by a native handler
    fn create_command(&self, name: &str, handler: CommandHandler);

    /// Remove a named command; unknown names are ignored
    fn delete_command(&self, name: &str);

    /// Observe every write to a global variable
    fn trace_writes(&self, name: &str, handler: TraceHandler);
}
