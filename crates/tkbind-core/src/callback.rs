//! Callback registries bridging native closures to runtime commands
//!
//! The runtime dispatches callbacks by command name. Natively, every
//! registration is addressed by an opaque [`CallbackId`] (or [`TraceId`] for
//! variable observers); the command name only exists on the wire. Each
//! runtime command handler captures the id of its registration, so dispatch
//! is a single map lookup.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::event::Event;

/// Unique identifier for a registered callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

impl CallbackId {
    /// Create a new callback ID from a raw value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Unique identifier for a registered variable observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(u64);

impl TraceId {
    /// Get the raw ID value
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Payload shape of a command callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackShape {
    /// No arguments
    Void,
    /// Arguments as text
    Str,
    /// First argument parsed as a floating-point number
    Double,
    /// Positional event payload
    Event,
}

/// A native closure invoked when the runtime calls a registered command
#[derive(Clone)]
pub enum Callback {
    Void(Rc<dyn Fn()>),
    Str(Rc<dyn Fn(&str)>),
    Double(Rc<dyn Fn(f64)>),
    Event(Rc<dyn Fn(&Event)>),
}

impl Callback {
    /// Wrap a closure taking no arguments
    pub fn void(f: impl Fn() + 'static) -> Self {
        Self::Void(Rc::new(f))
    }

    /// Wrap a closure taking the arguments as text, joined by spaces
    pub fn string(f: impl Fn(&str) + 'static) -> Self {
        Self::Str(Rc::new(f))
    }

    /// Wrap a closure taking the first argument as a number
    pub fn double(f: impl Fn(f64) + 'static) -> Self {
        Self::Double(Rc::new(f))
    }

    /// Wrap a closure taking an interaction event
    pub fn event(f: impl Fn(&Event) + 'static) -> Self {
        Self::Event(Rc::new(f))
    }

    /// The payload shape this callback expects
    #[must_use]
    pub fn shape(&self) -> CallbackShape {
        match self {
            Self::Void(_) => CallbackShape::Void,
            Self::Str(_) => CallbackShape::Str,
            Self::Double(_) => CallbackShape::Double,
            Self::Event(_) => CallbackShape::Event,
        }
    }

    /// Invoke the closure with the runtime-supplied argument words
    /// (`args[0]` is the command name)
    pub fn invoke(&self, args: &[String]) {
        let first = args.get(1).map_or("", String::as_str);
        match self {
            Self::Void(f) => f(),
            Self::Str(f) => f(&args.get(1..).unwrap_or(&[]).join(" ")),
            Self::Double(f) => f(crate::value::parse_double(first)),
            Self::Event(f) => f(&Event::from_args(args.get(1..).unwrap_or(&[]))),
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback").field(&self.shape()).finish()
    }
}

/// A native observer of writes to a runtime variable
#[derive(Clone)]
pub enum TraceCallback {
    Str(Rc<dyn Fn(&str)>),
    Int(Rc<dyn Fn(i64)>),
    Double(Rc<dyn Fn(f64)>),
}

impl TraceCallback {
    /// Observe the raw text value
    pub fn string(f: impl Fn(&str) + 'static) -> Self {
        Self::Str(Rc::new(f))
    }

    /// Observe the value parsed as an integer
    pub fn int(f: impl Fn(i64) + 'static) -> Self {
        Self::Int(Rc::new(f))
    }

    /// Observe the value parsed as a floating-point number
    pub fn double(f: impl Fn(f64) + 'static) -> Self {
        Self::Double(Rc::new(f))
    }

    /// Invoke the observer with the raw new value
    pub fn invoke(&self, value: &str) {
        match self {
            Self::Str(f) => f(value),
            Self::Int(f) => f(crate::value::parse_int(value)),
            Self::Double(f) => f(crate::value::parse_double(value)),
        }
    }
}

impl fmt::Debug for TraceCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self {
            Self::Str(_) => "Str",
            Self::Int(_) => "Int",
            Self::Double(_) => "Double",
        };
        f.debug_tuple("TraceCallback").field(&shape).finish()
    }
}

#[derive(Debug)]
struct Entry {
    name: String,
    callback: Callback,
    one_shot: bool,
}

/// Registry of command callbacks
///
/// A command name maps to at most one registration; registering a name
/// again replaces the previous entry.
#[derive(Debug)]
pub struct CallbackRegistry {
    callbacks: HashMap<CallbackId, Entry>,
    by_name: HashMap<String, CallbackId>,
    next_id: u64,
}

impl CallbackRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            callbacks: HashMap::new(),
            by_name: HashMap::new(),
            next_id: 1,
        }
    }

    /// Register a callback under a command name and return its ID, together
    /// with the ID it replaced, if any
    pub fn register(
        &mut self,
        name: &str,
        callback: Callback,
        one_shot: bool,
    ) -> (CallbackId, Option<CallbackId>) {
        let id = CallbackId(self.next_id);
        self.next_id += 1;

        let replaced = self.by_name.insert(name.to_string(), id);
        if let Some(old) = replaced {
            self.callbacks.remove(&old);
        }

        self.callbacks.insert(
            id,
            Entry {
                name: name.to_string(),
                callback,
                one_shot,
            },
        );
        (id, replaced)
    }

    /// Get a callback by ID
    #[must_use]
    pub fn get(&self, id: CallbackId) -> Option<&Callback> {
        self.callbacks.get(&id).map(|e| &e.callback)
    }

    /// Look up the ID currently registered under a command name
    #[must_use]
    pub fn id_for_name(&self, name: &str) -> Option<CallbackId> {
        self.by_name.get(name).copied()
    }

    /// Get the command name of a registration
    #[must_use]
    pub fn name(&self, id: CallbackId) -> Option<&str> {
        self.callbacks.get(&id).map(|e| e.name.as_str())
    }

    /// Whether the registration is removed after its first invocation
    #[must_use]
    pub fn is_one_shot(&self, id: CallbackId) -> bool {
        self.callbacks.get(&id).is_some_and(|e| e.one_shot)
    }

    /// Remove a callback by ID, returning its command name
    pub fn unregister(&mut self, id: CallbackId) -> Option<String> {
        let entry = self.callbacks.remove(&id)?;
        if self.by_name.get(&entry.name) == Some(&id) {
            self.by_name.remove(&entry.name);
        }
        Some(entry.name)
    }

    /// Check if a callback exists
    #[must_use]
    pub fn contains(&self, id: CallbackId) -> bool {
        self.callbacks.contains_key(&id)
    }

    /// Get the number of registered callbacks
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Check if the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of variable observers, grouped by variable name
#[derive(Debug, Default)]
pub struct TraceRegistry {
    observers: HashMap<String, Vec<(TraceId, TraceCallback)>>,
    next_id: u64,
}

impl TraceRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer; returns its ID and whether this variable was never
    /// observed before (meaning the runtime trace still has to be installed)
    pub fn add(&mut self, name: &str, callback: TraceCallback) -> (TraceId, bool) {
        self.next_id += 1;
        let id = TraceId(self.next_id);
        let first = !self.observers.contains_key(name);
        self.observers
            .entry(name.to_string())
            .or_default()
            .push((id, callback));
        (id, first)
    }

    /// Remove an observer; returns false if it was not registered
    pub fn remove(&mut self, id: TraceId) -> bool {
        for list in self.observers.values_mut() {
            if let Some(pos) = list.iter().position(|(tid, _)| *tid == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Snapshot of the observers of a variable, in registration order
    #[must_use]
    pub fn observers(&self, name: &str) -> Vec<TraceCallback> {
        self.observers
            .get(name)
            .map(|list| list.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default()
    }

    /// Whether any runtime trace was ever installed for this variable
    #[must_use]
    pub fn is_traced(&self, name: &str) -> bool {
        self.observers.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn void_callback() -> Callback {
        Callback::Void(Rc::new(|| {}))
    }

    #[test]
    fn test_callback_id() {
        let id1 = CallbackId::new(1);
        let id2 = CallbackId::new(2);
        assert_ne!(id1, id2);
        assert_eq!(id1.raw(), 1);
    }

    #[test]
    fn test_registry_basic_operations() {
        let mut registry = CallbackRegistry::new();
        assert!(registry.is_empty());

        let (id, replaced) = registry.register("cb_a", void_callback(), false);
        assert!(replaced.is_none());
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(id));
        assert_eq!(registry.name(id), Some("cb_a"));
        assert_eq!(registry.id_for_name("cb_a"), Some(id));

        assert_eq!(registry.unregister(id).as_deref(), Some("cb_a"));
        assert!(registry.is_empty());
        assert!(registry.id_for_name("cb_a").is_none());
        assert!(registry.unregister(id).is_none());
    }

    #[test]
    fn test_registry_same_name_replaces() {
        let mut registry = CallbackRegistry::new();
        let (first, _) = registry.register("cb", void_callback(), false);
        let (second, replaced) = registry.register("cb", void_callback(), false);

        assert_ne!(first, second);
        assert_eq!(replaced, Some(first));
        assert!(!registry.contains(first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invoke_shapes() {
        let seen = Rc::new(Cell::new(0.0));
        let sink = seen.clone();
        let cb = Callback::Double(Rc::new(move |v| sink.set(v)));
        assert_eq!(cb.shape(), CallbackShape::Double);

        cb.invoke(&["name".to_string(), "2.5".to_string()]);
        assert!((seen.get() - 2.5).abs() < f64::EPSILON);

        // Missing argument parses as zero
        cb.invoke(&["name".to_string()]);
        assert_eq!(seen.get(), 0.0);
    }

    #[test]
    fn test_string_shape_joins_arguments() {
        let seen = Rc::new(std::cell::RefCell::new(String::new()));
        let sink = seen.clone();
        let cb = Callback::string(move |s| *sink.borrow_mut() = s.to_string());
        cb.invoke(&["yscroll".to_string(), "0.0".to_string(), "0.25".to_string()]);
        assert_eq!(*seen.borrow(), "0.0 0.25");
    }

    #[test]
    fn test_trace_registry() {
        let mut traces = TraceRegistry::new();
        let (a, first) = traces.add("v", TraceCallback::Str(Rc::new(|_| {})));
        assert!(first);
        let (b, first) = traces.add("v", TraceCallback::Int(Rc::new(|_| {})));
        assert!(!first);
        assert_ne!(a, b);
        assert_eq!(traces.observers("v").len(), 2);

        assert!(traces.remove(a));
        assert!(!traces.remove(a));
        assert_eq!(traces.observers("v").len(), 1);
        assert!(traces.is_traced("v"));
        assert!(!traces.is_traced("w"));

        // The runtime trace stays installed after the last observer leaves
        assert!(traces.remove(b));
        let (_, first) = traces.add("v", TraceCallback::Str(Rc::new(|_| {})));
        assert!(!first);
    }
}
