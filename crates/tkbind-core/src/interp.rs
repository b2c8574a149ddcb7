//! Command interpreter facade over one runtime execution context
//!
//! [`Interp`] is a cheap, clonable handle. It is deliberately `!Send`: every
//! callback is dispatched on the thread that owns the runtime, and widgets
//! keep a handle to the interpreter they were created with. At most one
//! interpreter may be bound to a thread at a time.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::callback::{Callback, CallbackId, CallbackRegistry, TraceCallback, TraceId, TraceRegistry};
use crate::config::TkConfig;
use crate::error::{TkError, TkResult};
use crate::event::Event;
use crate::runtime::{CommandHandler, HeadlessRuntime, Runtime, TraceHandler};

thread_local! {
    static BOUND: Cell<bool> = const { Cell::new(false) };
}

struct Inner {
    runtime: Rc<dyn Runtime>,
    callbacks: Rc<RefCell<CallbackRegistry>>,
    traces: Rc<RefCell<TraceRegistry>>,
    config: TkConfig,
}

impl Drop for Inner {
    fn drop(&mut self) {
        BOUND.with(|bound| bound.set(false));
    }
}

/// Handle to the interpreter bound to the current thread
#[derive(Clone)]
pub struct Interp {
    inner: Rc<Inner>,
}

/// Non-owning interpreter handle, for closures stored inside the runtime
#[derive(Clone)]
pub struct WeakInterp {
    inner: Weak<Inner>,
}

impl WeakInterp {
    /// Upgrade to a strong handle if the interpreter is still alive
    #[must_use]
    pub fn upgrade(&self) -> Option<Interp> {
        self.inner.upgrade().map(|inner| Interp { inner })
    }
}

impl Interp {
    /// Bind a runtime to the current thread
    pub fn new(runtime: Rc<dyn Runtime>, config: TkConfig) -> TkResult<Self> {
        let already = BOUND.with(|bound| bound.replace(true));
        if already {
            return Err(TkError::ContextAlreadyBound);
        }

        Ok(Self {
            inner: Rc::new(Inner {
                runtime,
                callbacks: Rc::new(RefCell::new(CallbackRegistry::new())),
                traces: Rc::new(RefCell::new(TraceRegistry::new())),
                config,
            }),
        })
    }

    /// Create an interpreter over a fresh headless runtime
    pub fn headless() -> TkResult<Self> {
        Self::headless_with_config(TkConfig::default())
    }

    /// Create an interpreter over a fresh headless runtime with explicit settings
    pub fn headless_with_config(config: TkConfig) -> TkResult<Self> {
        let runtime = Rc::new(HeadlessRuntime::with_config(config.headless.clone()));
        Self::new(runtime, config)
    }

    /// Create an interpreter over the system Tcl/Tk libraries
    #[cfg(feature = "tcl")]
    pub fn tcl(config: TkConfig) -> TkResult<Self> {
        let runtime = Rc::new(crate::runtime::TclRuntime::new()?);
        Self::new(runtime, config)
    }

    /// Whether an interpreter is currently bound to this thread
    #[must_use]
    pub fn is_bound_here() -> bool {
        BOUND.with(Cell::get)
    }

    /// Get a weak handle
    #[must_use]
    pub fn downgrade(&self) -> WeakInterp {
        WeakInterp {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether two handles refer to the same interpreter
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The runtime behind this interpreter
    #[must_use]
    pub fn runtime(&self) -> &Rc<dyn Runtime> {
        &self.inner.runtime
    }

    /// The configuration this interpreter was created with
    #[must_use]
    pub fn config(&self) -> &TkConfig {
        &self.inner.config
    }

    // ------------------------------------------------------------------
    // Evaluation and variables
    // ------------------------------------------------------------------

    /// Evaluate a command, returning its result text
    pub fn evaluate(&self, command: &str) -> TkResult<String> {
        tracing::debug!(command, "eval");
        self.inner.runtime.eval(command).map_err(|message| {
            tracing::warn!(command, error = %message, "command failed");
            TkError::eval(command, message)
        })
    }

    /// Evaluate a command, returning the result or diagnostic text together
    /// with a success flag
    pub fn evaluate_status(&self, command: &str) -> (String, bool) {
        match self.evaluate(command) {
            Ok(result) => (result, true),
            Err(TkError::Eval { message, .. }) => (message, false),
            Err(other) => (other.to_string(), false),
        }
    }

    /// Read a global variable
    #[must_use]
    pub fn get_var(&self, name: &str) -> Option<String> {
        self.inner.runtime.get_var(name)
    }

    /// Read a global variable, treating an unset variable as empty
    #[must_use]
    pub fn get_var_or_empty(&self, name: &str) -> String {
        self.get_var(name).unwrap_or_default()
    }

    /// Write a global variable; fires its write traces synchronously
    pub fn set_var(&self, name: &str, value: &str) -> TkResult<()> {
        self.inner
            .runtime
            .set_var(name, value)
            .map_err(|message| TkError::SetVar {
                name: name.to_string(),
                message,
            })
    }

    /// Observe every write to a global variable.
    ///
    /// The observer runs on every write, in write order, including writes
    /// that store the value already held.
    pub fn trace_var(&self, name: &str, callback: TraceCallback) -> TraceId {
        let (id, first) = self.inner.traces.borrow_mut().add(name, callback);

        if first {
            let traces = Rc::downgrade(&self.inner.traces);
            let var = name.to_string();
            let handler: TraceHandler = Rc::new(move |value: &str| {
                let Some(traces) = traces.upgrade() else {
                    return;
                };
                // Snapshot so observers may add or remove traces
                let observers = traces.borrow().observers(&var);
                for observer in observers {
                    observer.invoke(value);
                }
            });
            self.inner.runtime.trace_writes(name, handler);
        }

        tracing::debug!(variable = name, trace = id.raw(), "trace installed");
        id
    }

    /// Remove a variable observer; returns false if it was already removed
    pub fn untrace(&self, id: TraceId) -> bool {
        self.inner.traces.borrow_mut().remove(id)
    }

    // ------------------------------------------------------------------
    // Callbacks
    // ------------------------------------------------------------------

    /// Install a named command dispatching to a closure with no arguments
    pub fn register_void_callback(&self, name: &str, f: impl Fn() + 'static) -> CallbackId {
        self.register_callback(name, Callback::void(f))
    }

    /// Install a named command dispatching its first argument as text
    pub fn register_string_callback(&self, name: &str, f: impl Fn(&str) + 'static) -> CallbackId {
        self.register_callback(name, Callback::string(f))
    }

    /// Install a named command dispatching its first argument as a number
    pub fn register_double_callback(&self, name: &str, f: impl Fn(f64) + 'static) -> CallbackId {
        self.register_callback(name, Callback::double(f))
    }

    /// Install a named command dispatching an event payload
    pub fn register_event_callback(&self, name: &str, f: impl Fn(&Event) + 'static) -> CallbackId {
        self.register_callback(name, Callback::event(f))
    }

    /// Install a named command backed by a callback of any shape
    pub fn register_callback(&self, name: &str, callback: Callback) -> CallbackId {
        self.install(name, callback, false)
    }

    /// Install a named command that unregisters itself after one invocation
    pub fn register_one_shot(&self, name: &str, callback: Callback) -> CallbackId {
        self.install(name, callback, true)
    }

    fn install(&self, name: &str, callback: Callback, one_shot: bool) -> CallbackId {
        let shape = callback.shape();
        let (id, replaced) = self
            .inner
            .callbacks
            .borrow_mut()
            .register(name, callback, one_shot);

        let registry = Rc::downgrade(&self.inner.callbacks);
        let runtime = Rc::downgrade(&self.inner.runtime);
        let handler: CommandHandler =
            Rc::new(move |args: &[String]| dispatch(&registry, &runtime, id, args));
        self.inner.runtime.create_command(name, handler);

        tracing::debug!(
            name,
            ?shape,
            id = id.raw(),
            replaced = ?replaced.map(CallbackId::raw),
            "callback registered"
        );
        id
    }

    /// Remove a callback and its runtime command; returns false if it was
    /// already gone (fired one-shot, replaced or unregistered)
    pub fn unregister_callback(&self, id: CallbackId) -> bool {
        let name = self.inner.callbacks.borrow_mut().unregister(id);
        match name {
            Some(name) => {
                self.inner.runtime.delete_command(&name);
                tracing::debug!(name = %name, id = id.raw(), "callback unregistered");
                true
            }
            None => false,
        }
    }

    /// Whether a callback registration is still live
    #[must_use]
    pub fn has_callback(&self, id: CallbackId) -> bool {
        self.inner.callbacks.borrow().contains(id)
    }

    /// Command name of a live registration
    #[must_use]
    pub fn callback_name(&self, id: CallbackId) -> Option<String> {
        self.inner.callbacks.borrow().name(id).map(str::to_string)
    }

    /// Number of live callback registrations
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.inner.callbacks.borrow().len()
    }
}

impl std::fmt::Debug for Interp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interp")
            .field("callbacks", &self.inner.callbacks.borrow().len())
            .finish_non_exhaustive()
    }
}

/// Runtime-side entry point of every registered command
fn dispatch(
    registry: &Weak<RefCell<CallbackRegistry>>,
    runtime: &Weak<dyn Runtime>,
    id: CallbackId,
    args: &[String],
) -> Result<String, String> {
    let Some(registry) = registry.upgrade() else {
        return Ok(String::new());
    };

    // The registry borrow must end before the closure runs: closures issue
    // commands and register further callbacks.
    let (callback, expired) = {
        let mut reg = registry.borrow_mut();
        let Some(callback) = reg.get(id).cloned() else {
            tracing::trace!(id = id.raw(), "stale callback invoked");
            return Ok(String::new());
        };
        let expired = if reg.is_one_shot(id) { reg.unregister(id) } else { None };
        (callback, expired)
    };

    if let (Some(name), Some(runtime)) = (expired, runtime.upgrade()) {
        runtime.delete_command(&name);
    }

    tracing::trace!(id = id.raw(), command = args.first().map(String::as_str), "dispatch");
    callback.invoke(args);
    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_interpreter_per_thread() {
        let interp = Interp::headless().unwrap();
        assert!(Interp::is_bound_here());
        assert!(matches!(Interp::headless(), Err(TkError::ContextAlreadyBound)));

        let clone = interp.clone();
        drop(interp);
        assert!(Interp::is_bound_here());
        drop(clone);
        assert!(!Interp::is_bound_here());

        // Binding is released, a new interpreter may be created
        let _again = Interp::headless().unwrap();
    }

    #[test]
    fn test_interpreters_on_separate_threads() {
        let _main = Interp::headless().unwrap();
        let worker = std::thread::spawn(|| {
            let interp = Interp::headless().unwrap();
            interp.set_var("x", "worker").unwrap();
            interp.get_var_or_empty("x")
        });
        assert_eq!(worker.join().unwrap(), "worker");
    }

    #[test]
    fn test_evaluate_error_is_typed() {
        let interp = Interp::headless().unwrap();
        let err = interp.evaluate("no_such_command 1 2").unwrap_err();
        match err {
            TkError::Eval { command, message } => {
                assert_eq!(command, "no_such_command 1 2");
                assert!(message.contains("invalid command name"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        let (text, ok) = interp.evaluate_status("no_such_command");
        assert!(!ok);
        assert!(text.contains("no_such_command"));
    }

    #[test]
    fn test_get_set_var() {
        let interp = Interp::headless().unwrap();
        assert_eq!(interp.get_var("missing"), None);
        assert_eq!(interp.get_var_or_empty("missing"), "");

        interp.set_var("greeting", "hello world").unwrap();
        assert_eq!(interp.get_var("greeting").as_deref(), Some("hello world"));
        assert_eq!(interp.evaluate("set greeting").unwrap(), "hello world");
    }

    #[test]
    fn test_callback_reentrancy() {
        let interp = Interp::headless().unwrap();
        let weak = interp.downgrade();
        interp.register_void_callback("outer", move || {
            let interp = weak.upgrade().unwrap();
            interp.set_var("touched", "yes").unwrap();
            interp.register_void_callback("inner", || {});
        });

        interp.evaluate("outer").unwrap();
        assert_eq!(interp.get_var_or_empty("touched"), "yes");
        assert_eq!(interp.callback_count(), 2);
    }

    #[test]
    fn test_one_shot_unregisters_after_firing() {
        let interp = Interp::headless().unwrap();
        let id = interp.register_one_shot("once", Callback::void(|| {}));
        assert!(interp.has_callback(id));

        interp.evaluate("once").unwrap();
        assert!(!interp.has_callback(id));
        assert!(interp.evaluate("once").is_err());
        assert!(!interp.unregister_callback(id));
    }

    #[test]
    fn test_trace_shapes() {
        let interp = Interp::headless().unwrap();
        let ints = Rc::new(RefCell::new(Vec::new()));
        let doubles = Rc::new(RefCell::new(Vec::new()));

        let sink = ints.clone();
        interp.trace_var("n", TraceCallback::int(move |v| sink.borrow_mut().push(v)));
        let sink = doubles.clone();
        let id = interp.trace_var("n", TraceCallback::double(move |v| sink.borrow_mut().push(v)));

        interp.set_var("n", "7").unwrap();
        interp.evaluate("set n oops").unwrap();
        assert!(interp.untrace(id));
        interp.set_var("n", "9").unwrap();

        assert_eq!(*ints.borrow(), vec![7, 0, 9]);
        assert_eq!(*doubles.borrow(), vec![7.0, 0.0]);
    }
}
