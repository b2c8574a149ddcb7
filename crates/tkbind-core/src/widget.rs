//! Widget nodes and their command builders
//!
//! A [`Widget`] is a named runtime object plus the handle of the interpreter
//! it lives in. Every method builds exactly one protocol command from typed
//! arguments and evaluates it. Widget names are hierarchical
//! (`.frame3.label7`) and embed a process-wide [`ObjectId`], so two widgets
//! never share a name.

use std::cell::{Cell, RefCell};

use crate::callback::{Callback, CallbackId};
use crate::error::TkResult;
use crate::event::{Event, BIND_PAYLOAD};
use crate::ident::{next_id, ObjectId};
use crate::interp::Interp;
use crate::value::{parse_int, render_options, sanitize, split_words, ArgValue, Options};

/// Name of the root window
pub const ROOT_NAME: &str = ".";

/// Compute the full name of a new child widget
///
/// ```
/// use tkbind::widget::child_name;
/// # let id = tkbind::ident::next_id();
/// assert_eq!(child_name(".", "button", id), format!(".button{id}"));
/// assert_eq!(child_name(".frame1", "label", id), format!(".frame1.label{id}"));
/// ```
#[must_use]
pub fn child_name(parent: &str, tag: &str, id: ObjectId) -> String {
    if parent == ROOT_NAME {
        format!(".{tag}{id}")
    } else {
        format!("{parent}.{tag}{id}")
    }
}

/// Handle to a scheduled callback, used to cancel it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AfterId {
    token: String,
    callback: CallbackId,
}

impl AfterId {
    /// The runtime's token for the scheduled entry
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The registration backing the scheduled entry
    #[must_use]
    pub fn callback(&self) -> CallbackId {
        self.callback
    }
}

/// A runtime widget
pub struct Widget {
    id: ObjectId,
    full_name: String,
    class: String,
    interp: Interp,
    deferred: Cell<u64>,
    callbacks: RefCell<Vec<CallbackId>>,
}

impl Widget {
    /// Create a widget of `class` under `parent` and issue its create command
    pub fn create(interp: &Interp, parent: &str, class: &str, tag: &str, options: &Options) -> TkResult<Self> {
        let id = next_id();
        let full_name = child_name(parent, tag, id);
        interp.evaluate(&format!("{class} {full_name}{}", render_options(options)))?;
        tracing::debug!(widget = %full_name, class, "widget created");
        Ok(Self::attach(interp, id, full_name, class))
    }

    /// Wrap a runtime widget that already exists, such as the root window
    pub(crate) fn existing(interp: &Interp, full_name: &str, class: &str) -> Self {
        Self::attach(interp, next_id(), full_name.to_string(), class)
    }

    fn attach(interp: &Interp, id: ObjectId, full_name: String, class: &str) -> Self {
        Self {
            id,
            full_name,
            class: class.to_string(),
            interp: interp.clone(),
            deferred: Cell::new(0),
            callbacks: RefCell::new(Vec::new()),
        }
    }

    /// Unique identifier
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Full hierarchical runtime name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.full_name
    }

    /// Command the widget was created with (`button`, `ttk::label`, ...)
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Interpreter the widget lives in
    #[must_use]
    pub fn interp(&self) -> &Interp {
        &self.interp
    }

    /// Callbacks this widget registered and has not released
    #[must_use]
    pub fn callbacks(&self) -> Vec<CallbackId> {
        self.prune_callbacks();
        self.callbacks.borrow().clone()
    }

    fn call(&self, command: &str) -> TkResult<String> {
        self.interp.evaluate(command)
    }

    pub(crate) fn track(&self, id: CallbackId) -> CallbackId {
        self.prune_callbacks();
        self.callbacks.borrow_mut().push(id);
        id
    }

    /// Forget fired one-shots and registrations replaced under the same name
    fn prune_callbacks(&self) {
        self.callbacks.borrow_mut().retain(|c| self.interp.has_callback(*c));
    }

    // ------------------------------------------------------------------
    // Options
    // ------------------------------------------------------------------

    /// Apply several options
    pub fn config(&self, options: &Options) -> TkResult<()> {
        self.call(&format!("{} configure{}", self.full_name, render_options(options)))
            .map(drop)
    }

    /// Apply one option
    pub fn config_one(&self, key: &str, value: impl Into<ArgValue>) -> TkResult<()> {
        self.call(&format!("{} configure -{key} {}", self.full_name, value.into().render()))
            .map(drop)
    }

    /// Read one option
    pub fn cget(&self, key: &str) -> TkResult<String> {
        self.call(&format!("{} cget -{key}", self.full_name))
    }

    // ------------------------------------------------------------------
    // Geometry management
    // ------------------------------------------------------------------

    pub fn pack(&self, options: &Options) -> TkResult<()> {
        self.manage("pack", options)
    }

    pub fn grid(&self, options: &Options) -> TkResult<()> {
        self.manage("grid", options)
    }

    pub fn place(&self, options: &Options) -> TkResult<()> {
        self.manage("place", options)
    }

    fn manage(&self, manager: &str, options: &Options) -> TkResult<()> {
        self.call(&format!("{manager} {}{}", self.full_name, render_options(options)))
            .map(drop)
    }

    pub fn pack_forget(&self) -> TkResult<()> {
        self.call(&format!("pack forget {}", self.full_name)).map(drop)
    }

    pub fn grid_forget(&self) -> TkResult<()> {
        self.call(&format!("grid forget {}", self.full_name)).map(drop)
    }

    pub fn place_forget(&self) -> TkResult<()> {
        self.call(&format!("place forget {}", self.full_name)).map(drop)
    }

    /// Configure a grid row of this widget when used as a container
    pub fn grid_rowconfigure(&self, row: i64, options: &Options) -> TkResult<()> {
        self.call(&format!(
            "grid rowconfigure {} {row}{}",
            self.full_name,
            render_options(options)
        ))
        .map(drop)
    }

    /// Configure a grid column of this widget when used as a container
    pub fn grid_columnconfigure(&self, column: i64, options: &Options) -> TkResult<()> {
        self.call(&format!(
            "grid columnconfigure {} {column}{}",
            self.full_name,
            render_options(options)
        ))
        .map(drop)
    }

    // ------------------------------------------------------------------
    // Callbacks
    // ------------------------------------------------------------------

    /// Bind a closure to an event sequence such as `<Button-1>`.
    ///
    /// Binding the same sequence again replaces the earlier closure.
    pub fn bind(&self, event: &str, f: impl Fn(&Event) + 'static) -> TkResult<CallbackId> {
        let name = format!("{}_{}_bind_cb", sanitize(&self.full_name), sanitize(event));
        let id = self.interp.register_event_callback(&name, f);
        if let Err(err) = self.call(&format!("bind {} {event} {{{name} {BIND_PAYLOAD}}}", self.full_name)) {
            self.interp.unregister_callback(id);
            return Err(err);
        }
        Ok(self.track(id))
    }

    /// Install a callback under a widget-scoped name and point `option` at it
    pub fn set_option_callback(&self, option: &str, suffix: &str, callback: Callback) -> TkResult<CallbackId> {
        let name = format!("{}_{suffix}", sanitize(&self.full_name));
        let id = self.interp.register_callback(&name, callback);
        if let Err(err) = self.config_one(option, ArgValue::Str(name)) {
            self.interp.unregister_callback(id);
            return Err(err);
        }
        Ok(self.track(id))
    }

    /// Set the widget's `-command` callback
    pub fn set_command(&self, f: impl Fn() + 'static) -> TkResult<CallbackId> {
        self.set_option_callback("command", "command_cb", Callback::void(f))
    }

    /// Run a closure once after `ms` milliseconds
    pub fn after(&self, ms: u64, f: impl Fn() + 'static) -> TkResult<AfterId> {
        let name = format!("{}_after_cb_{}", sanitize(&self.full_name), self.next_deferred());
        self.schedule(&name, &ms.to_string(), f)
    }

    /// Run a closure once when the event loop is next idle
    pub fn after_idle(&self, f: impl Fn() + 'static) -> TkResult<AfterId> {
        let name = format!("{}_after_idle_cb_{}", sanitize(&self.full_name), self.next_deferred());
        self.schedule(&name, "idle", f)
    }

    fn next_deferred(&self) -> u64 {
        let n = self.deferred.get();
        self.deferred.set(n + 1);
        n
    }

    fn schedule(&self, name: &str, when: &str, f: impl Fn() + 'static) -> TkResult<AfterId> {
        let callback = self.interp.register_one_shot(name, Callback::void(f));
        match self.call(&format!("after {when} {name}")) {
            Ok(token) => Ok(AfterId {
                token,
                callback: self.track(callback),
            }),
            Err(err) => {
                self.interp.unregister_callback(callback);
                Err(err)
            }
        }
    }

    /// Cancel a scheduled callback; cancelling one that already fired or was
    /// already cancelled does nothing
    pub fn after_cancel(&self, id: &AfterId) -> TkResult<()> {
        self.call(&format!("after cancel {}", id.token))?;
        if !self.interp.unregister_callback(id.callback) {
            tracing::debug!(token = %id.token, "after_cancel on a fired or cancelled callback");
        }
        self.callbacks.borrow_mut().retain(|c| *c != id.callback);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    fn winfo(&self, query: &str) -> TkResult<String> {
        self.call(&format!("winfo {query} {}", self.full_name))
    }

    pub fn winfo_width(&self) -> TkResult<i64> {
        self.winfo("width").map(|s| parse_int(&s))
    }

    pub fn winfo_height(&self) -> TkResult<i64> {
        self.winfo("height").map(|s| parse_int(&s))
    }

    pub fn winfo_x(&self) -> TkResult<i64> {
        self.winfo("x").map(|s| parse_int(&s))
    }

    pub fn winfo_y(&self) -> TkResult<i64> {
        self.winfo("y").map(|s| parse_int(&s))
    }

    pub fn winfo_rootx(&self) -> TkResult<i64> {
        self.winfo("rootx").map(|s| parse_int(&s))
    }

    pub fn winfo_rooty(&self) -> TkResult<i64> {
        self.winfo("rooty").map(|s| parse_int(&s))
    }

    /// Whether the runtime object still exists
    pub fn winfo_exists(&self) -> TkResult<bool> {
        self.winfo("exists").map(|s| parse_int(&s) == 1)
    }

    /// Runtime class name (`Button`, `TLabel`, ...)
    pub fn winfo_class(&self) -> TkResult<String> {
        self.winfo("class")
    }

    /// Name of the enclosing top-level window
    pub fn winfo_toplevel(&self) -> TkResult<String> {
        self.winfo("toplevel")
    }

    /// Names of the child widgets, in creation order
    pub fn winfo_children(&self) -> TkResult<Vec<String>> {
        self.winfo("children").map(|s| split_words(&s))
    }

    // ------------------------------------------------------------------
    // Focus and stacking
    // ------------------------------------------------------------------

    pub fn focus_set(&self) -> TkResult<()> {
        self.call(&format!("focus {}", self.full_name)).map(drop)
    }

    pub fn lift(&self) -> TkResult<()> {
        self.call(&format!("raise {}", self.full_name)).map(drop)
    }

    pub fn lower(&self) -> TkResult<()> {
        self.call(&format!("lower {}", self.full_name)).map(drop)
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Destroy the runtime object (and its runtime children) and release
    /// this widget's callbacks
    pub fn destroy(self) -> TkResult<()> {
        let result = self.call(&format!("destroy {}", self.full_name)).map(drop);
        self.release_callbacks();
        result
    }

    /// Unregister every callback this widget installed
    pub(crate) fn release_callbacks(&self) {
        let ids = std::mem::take(&mut *self.callbacks.borrow_mut());
        for id in ids {
            self.interp.unregister_callback(id);
        }
    }
}

impl std::fmt::Debug for Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Widget")
            .field("id", &self.id)
            .field("name", &self.full_name)
            .field("class", &self.class)
            .finish_non_exhaustive()
    }
}
