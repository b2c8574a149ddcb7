//! In-process runtime that speaks the command protocol without a display
//!
//! [`HeadlessRuntime`] interprets the same script text the binding layer
//! sends to a real toolkit: widget creation and configuration, geometry
//! management, event bindings, timers, variables with write traces, fonts,
//! window-manager requests and modal dialogs. Widgets have state but no
//! pixels; the event loop runs on a virtual clock. Inspection methods expose
//! that state so applications can be tested without a display server.

mod builtins;
mod instance;
pub mod parser;
mod scheduler;
mod widgets;

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::config::HeadlessConfig;
use crate::runtime::{CommandHandler, Runtime, TraceHandler};

use parser::Part;
use scheduler::Scheduler;
use widgets::WidgetStore;

/// Nesting limit for script evaluation
const MAX_NESTING: usize = 200;

/// Title of the root window before anything configures it
const ROOT_TITLE: &str = "tk";

/// Headless implementation of [`Runtime`]
pub struct HeadlessRuntime {
    config: HeadlessConfig,
    vars: RefCell<HashMap<String, String>>,
    write_counts: RefCell<HashMap<String, u64>>,
    commands: RefCell<HashMap<String, CommandHandler>>,
    traces: RefCell<HashMap<String, Vec<TraceHandler>>>,
    /// Variables whose traces are currently running
    active_traces: RefCell<HashSet<String>>,
    widgets: RefCell<WidgetStore>,
    /// Event bindings by tag, then by canonical event sequence
    bindings: RefCell<HashMap<String, BTreeMap<String, String>>>,
    fonts: RefCell<BTreeMap<String, BTreeMap<String, String>>>,
    next_font: Cell<u64>,
    scheduler: RefCell<Scheduler>,
    dialog_answers: RefCell<HashMap<String, VecDeque<String>>>,
    focus: RefCell<Option<String>>,
    grab: RefCell<Option<String>>,
    history: RefCell<Vec<String>>,
    depth: Cell<usize>,
}

impl HeadlessRuntime {
    /// Create a runtime with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HeadlessConfig::default())
    }

    /// Create a runtime with explicit settings
    #[must_use]
    pub fn with_config(config: HeadlessConfig) -> Self {
        Self {
            config,
            vars: RefCell::new(HashMap::new()),
            write_counts: RefCell::new(HashMap::new()),
            commands: RefCell::new(HashMap::new()),
            traces: RefCell::new(HashMap::new()),
            active_traces: RefCell::new(HashSet::new()),
            widgets: RefCell::new(WidgetStore::new(ROOT_TITLE)),
            bindings: RefCell::new(HashMap::new()),
            fonts: RefCell::new(BTreeMap::new()),
            next_font: Cell::new(1),
            scheduler: RefCell::new(Scheduler::default()),
            dialog_answers: RefCell::new(HashMap::new()),
            focus: RefCell::new(None),
            grab: RefCell::new(None),
            history: RefCell::new(Vec::new()),
            depth: Cell::new(0),
        }
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    fn eval_script(&self, script: &str) -> Result<String, String> {
        let depth = self.depth.get();
        if depth >= MAX_NESTING {
            return Err("too many nested evaluations (infinite loop?)".to_string());
        }
        self.depth.set(depth + 1);
        let result = self.eval_commands(script);
        self.depth.set(depth);
        result
    }

    fn eval_commands(&self, script: &str) -> Result<String, String> {
        let commands = parser::parse_script(script).map_err(|e| e.to_string())?;
        let mut result = String::new();
        for command in commands {
            let mut words = Vec::with_capacity(command.words.len());
            for word in &command.words {
                words.push(self.substitute(&word.parts)?);
            }
            result = self.invoke(&words)?;
        }
        Ok(result)
    }

    fn substitute(&self, parts: &[Part]) -> Result<String, String> {
        let mut out = String::new();
        for part in parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Var(name) => {
                    let value = self
                        .read_var(name)
                        .ok_or_else(|| format!("can't read \"{name}\": no such variable"))?;
                    out.push_str(&value);
                }
                Part::Script(script) => out.push_str(&self.eval_script(script)?),
            }
        }
        Ok(out)
    }

    fn invoke(&self, words: &[String]) -> Result<String, String> {
        let Some(name) = words.first() else {
            return Ok(String::new());
        };

        // Clone the handler out so it may re-enter the runtime
        let handler = self.commands.borrow().get(name).cloned();
        if let Some(handler) = handler {
            return handler(words);
        }
        if let Some(result) = self.builtin(words) {
            return result;
        }
        if let Some(class) = widgets::class_for_command(name) {
            return self.create_widget(name, class, &words[1..]);
        }
        if self.widgets.borrow().contains(name) {
            return self.widget_command(name, &words[1..]);
        }
        Err(format!("invalid command name \"{name}\""))
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    fn read_var(&self, name: &str) -> Option<String> {
        self.vars.borrow().get(name).cloned()
    }

    /// Store a value and run the variable's write traces
    fn write_var(&self, name: &str, value: &str) {
        self.vars
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
        *self
            .write_counts
            .borrow_mut()
            .entry(name.to_string())
            .or_default() += 1;
        self.fire_traces(name);
    }

    fn fire_traces(&self, name: &str) {
        // Writes made by a trace to its own variable do not re-trigger it
        if !self.active_traces.borrow_mut().insert(name.to_string()) {
            return;
        }
        let handlers = self.traces.borrow().get(name).cloned().unwrap_or_default();
        for handler in handlers {
            let value = self.read_var(name).unwrap_or_default();
            handler(&value);
        }
        self.active_traces.borrow_mut().remove(name);
    }

    /// Number of writes a variable has seen
    #[must_use]
    pub fn write_count(&self, name: &str) -> u64 {
        self.write_counts.borrow().get(name).copied().unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------

    /// Run a script from the event loop; errors are reported, not propagated
    fn run_background(&self, script: &str) {
        if let Err(error) = self.eval_script(script) {
            tracing::warn!(script, %error, "background error");
        }
    }

    fn max_steps(&self) -> usize {
        usize::try_from(self.config.max_loop_steps).unwrap_or(usize::MAX)
    }

    /// Run idle work and every timer due at the current virtual time
    fn drain_due(&self, idle_only: bool) -> Result<usize, String> {
        let max = self.max_steps();
        let mut steps = 0;
        loop {
            let next = {
                let mut scheduler = self.scheduler.borrow_mut();
                if idle_only {
                    scheduler.next_idle()
                } else {
                    let now = scheduler.now();
                    scheduler.next_due_by(now)
                }
            };
            let Some(script) = next else {
                return Ok(steps);
            };
            if steps >= max {
                return Err(format!("event loop exceeded {max} steps"));
            }
            self.run_background(&script);
            steps += 1;
        }
    }

    /// Run the event loop until `name` is written
    fn wait_for_write(&self, name: &str) -> Result<(), String> {
        let start = self.write_count(name);
        let max = self.max_steps();
        let mut steps = 0;
        while self.write_count(name) == start {
            if steps >= max {
                return Err(format!(
                    "vwait on \"{name}\" gave up after {max} event-loop steps"
                ));
            }
            let next = self.scheduler.borrow_mut().next_any();
            let Some(script) = next else {
                return Err(format!(
                    "can't wait for variable \"{name}\": would wait forever"
                ));
            };
            self.run_background(&script);
            steps += 1;
        }
        Ok(())
    }

    /// Advance the virtual clock, running every timer that falls due on the way
    pub fn advance(&self, ms: u64) -> Result<usize, String> {
        let deadline = self.scheduler.borrow().now().saturating_add(ms);
        let max = self.max_steps();
        let mut steps = 0;
        loop {
            let next = self.scheduler.borrow_mut().next_due_by(deadline);
            let Some(script) = next else { break };
            if steps >= max {
                return Err(format!("event loop exceeded {max} steps"));
            }
            self.run_background(&script);
            steps += 1;
        }
        self.scheduler.borrow_mut().set_now(deadline);
        Ok(steps)
    }

    /// Current virtual time in milliseconds
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.scheduler.borrow().now()
    }

    /// Number of scheduled scripts not yet run
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.scheduler.borrow().len()
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Every script passed to [`Runtime::eval`], in order
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history.borrow().clone()
    }

    /// Forget the recorded history
    pub fn clear_history(&self) {
        self.history.borrow_mut().clear();
    }

    /// Whether a named command (native or builtin-created) is installed
    #[must_use]
    pub fn has_command(&self, name: &str) -> bool {
        self.commands.borrow().contains_key(name)
    }

    /// Whether a widget path exists
    #[must_use]
    pub fn widget_exists(&self, path: &str) -> bool {
        self.widgets.borrow().contains(path)
    }

    /// Class of a widget
    #[must_use]
    pub fn widget_class(&self, path: &str) -> Option<String> {
        self.widgets.borrow().get(path).map(|w| w.class.clone())
    }

    /// Current value of a widget option (with or without the leading dash)
    #[must_use]
    pub fn widget_option(&self, path: &str, option: &str) -> Option<String> {
        let option = option.trim_start_matches('-');
        self.widgets.borrow().get(path)?.option(option)
    }

    /// Direct children of a widget, in creation order
    #[must_use]
    pub fn children(&self, path: &str) -> Vec<String> {
        self.widgets.borrow().children(path)
    }

    /// Geometry manager of a widget and the options it was given
    #[must_use]
    pub fn layout(&self, path: &str) -> Option<(String, BTreeMap<String, String>)> {
        let widgets = self.widgets.borrow();
        let state = widgets.get(path)?;
        let manager = state.manager.clone()?;
        Some((manager, state.layout.clone()))
    }

    /// Window-manager property of a top-level window
    #[must_use]
    pub fn wm_property(&self, window: &str, key: &str) -> Option<String> {
        self.widgets.borrow().get(window)?.wm.get(key).cloned()
    }

    /// Script bound to a tag for an event sequence
    #[must_use]
    pub fn binding(&self, tag: &str, sequence: &str) -> Option<String> {
        let sequence = builtins::canonical_sequence(sequence).ok()?;
        self.bindings.borrow().get(tag)?.get(&sequence).cloned()
    }

    /// Attribute of a named font
    #[must_use]
    pub fn font_option(&self, font: &str, option: &str) -> Option<String> {
        let option = option.trim_start_matches('-');
        self.fonts.borrow().get(font)?.get(option).cloned()
    }

    /// Whether a named font exists
    #[must_use]
    pub fn font_exists(&self, font: &str) -> bool {
        self.fonts.borrow().contains_key(font)
    }

    /// Window holding keyboard focus
    #[must_use]
    pub fn focus_window(&self) -> Option<String> {
        self.focus.borrow().clone()
    }

    /// Window holding the input grab
    #[must_use]
    pub fn grab_window(&self) -> Option<String> {
        self.grab.borrow().clone()
    }

    /// Queue the answer the next dialog of the given command returns
    pub fn push_dialog_answer(&self, command: &str, answer: &str) {
        self.dialog_answers
            .borrow_mut()
            .entry(command.to_string())
            .or_default()
            .push_back(answer.to_string());
    }

    /// Simulate the window manager asking a top-level window to close: runs
    /// the `WM_DELETE_WINDOW` handler if one is installed, otherwise destroys
    /// the window
    pub fn request_close(&self, window: &str) -> Result<(), String> {
        let handler = {
            let widgets = self.widgets.borrow();
            widgets
                .require(window)?
                .protocols
                .get("WM_DELETE_WINDOW")
                .cloned()
        };
        match handler {
            Some(script) => self.eval_script(&script).map(|_| ()),
            None => self.eval_script(&format!("destroy {window}")).map(|_| ()),
        }
    }
}

impl Default for HeadlessRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HeadlessRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessRuntime")
            .field("commands", &self.commands.borrow().len())
            .field("vars", &self.vars.borrow().len())
            .field("now_ms", &self.now_ms())
            .finish_non_exhaustive()
    }
}

impl Runtime for HeadlessRuntime {
    fn eval(&self, script: &str) -> Result<String, String> {
        self.history.borrow_mut().push(script.to_string());
        self.eval_script(script)
    }

    fn get_var(&self, name: &str) -> Option<String> {
        self.read_var(name)
    }

    fn set_var(&self, name: &str, value: &str) -> Result<(), String> {
        self.write_var(name, value);
        Ok(())
    }

    fn create_command(&self, name: &str, handler: CommandHandler) {
        self.commands.borrow_mut().insert(name.to_string(), handler);
    }

    fn delete_command(&self, name: &str) {
        self.commands.borrow_mut().remove(name);
    }

    fn trace_writes(&self, name: &str, handler: TraceHandler) {
        self.traces
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .push(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn eval(rt: &HeadlessRuntime, script: &str) -> String {
        rt.eval(script).unwrap()
    }

    #[test]
    fn test_set_and_substitution() {
        let rt = HeadlessRuntime::new();
        assert_eq!(eval(&rt, "set a 5"), "5");
        assert_eq!(eval(&rt, "set b \"a is $a\""), "a is 5");
        assert_eq!(eval(&rt, "set c [set b]!"), "a is 5!");
        assert_eq!(eval(&rt, "set d {$a [x]}"), "$a [x]");
        assert!(rt.eval("set missing").unwrap_err().contains("no such variable"));
        assert!(rt.eval("set x $missing").is_err());
    }

    #[test]
    fn test_unknown_command() {
        let rt = HeadlessRuntime::new();
        assert_eq!(rt.eval("frobnicate 1").unwrap_err(), "invalid command name \"frobnicate\"");
    }

    #[test]
    fn test_native_commands() {
        let rt = HeadlessRuntime::new();
        let handler: CommandHandler = Rc::new(|args: &[String]| Ok(args[1..].join("+")));
        rt.create_command("join", handler);
        assert_eq!(eval(&rt, "join a {b c} d"), "a+b c+d");

        rt.delete_command("join");
        assert!(rt.eval("join a").is_err());
    }

    #[test]
    fn test_traces_fire_on_every_write() {
        let rt = HeadlessRuntime::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        rt.trace_writes("v", Rc::new(move |value: &str| sink.borrow_mut().push(value.to_string())));

        rt.set_var("v", "1").unwrap();
        eval(&rt, "set v 1");
        eval(&rt, "incr v");
        assert_eq!(*seen.borrow(), vec!["1", "1", "2"]);
        assert_eq!(rt.write_count("v"), 3);
    }

    #[test]
    fn test_trace_writing_own_variable_does_not_recurse() {
        let rt = Rc::new(HeadlessRuntime::new());
        let weak = Rc::downgrade(&rt);
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        rt.trace_writes(
            "v",
            Rc::new(move |value: &str| {
                counter.set(counter.get() + 1);
                if let Some(rt) = weak.upgrade() {
                    rt.set_var("v", &value.to_uppercase()).unwrap();
                }
            }),
        );

        rt.set_var("v", "abc").unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(rt.get_var("v").as_deref(), Some("ABC"));
    }

    #[test]
    fn test_nesting_limit() {
        let rt = Rc::new(HeadlessRuntime::new());
        let weak = Rc::downgrade(&rt);
        let handler: CommandHandler = Rc::new(move |_: &[String]| match weak.upgrade() {
            Some(rt) => rt.eval("recurse"),
            None => Ok(String::new()),
        });
        rt.create_command("recurse", handler);

        let err = rt.eval("recurse").unwrap_err();
        assert!(err.contains("too many nested evaluations"));
        // The depth counter unwinds with the error
        assert_eq!(eval(&rt, "set ok 1"), "1");
    }

    #[test]
    fn test_loop_step_bound() {
        let rt = HeadlessRuntime::with_config(HeadlessConfig {
            max_loop_steps: 2,
            ..HeadlessConfig::default()
        });
        eval(&rt, "after 5 {set a 1}");
        eval(&rt, "after 5 {set b 1}");
        assert_eq!(rt.advance(10), Ok(2));

        for _ in 0..3 {
            eval(&rt, "after 1 {incr ticks}");
        }
        let err = rt.advance(10).unwrap_err();
        assert!(err.contains("exceeded 2 steps"));
        assert_eq!(rt.get_var("ticks").as_deref(), Some("2"));

        eval(&rt, "after 1 {set x 1}");
        eval(&rt, "after 2 {set y 1}");
        eval(&rt, "after 3 {set done 1}");
        assert!(rt.eval("vwait done").unwrap_err().contains("gave up after 2"));
    }

    #[test]
    fn test_history_records_top_level_scripts() {
        let rt = HeadlessRuntime::new();
        eval(&rt, "set a 1");
        let _ = rt.eval("bogus");
        assert_eq!(rt.history(), vec!["set a 1", "bogus"]);
        rt.clear_history();
        assert!(rt.history().is_empty());
    }
}
