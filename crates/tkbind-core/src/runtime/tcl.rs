//! Runtime backed by the system Tcl/Tk 8.6 libraries
//!
//! Enabled with the `tcl` feature and built on the `tcl` crate. Native
//! command handlers are boxed and handed to Tcl as client data; the boxes
//! are released by Tcl's delete callback. Variable traces are plain Tcl
//! `trace add variable` scripts calling back into a native command.

#![allow(unsafe_code)]
#![allow(clippy::cast_possible_wrap)]

use std::cell::Cell;
use std::ffi::c_int;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use tcl::reexport_clib::{ClientData, Tcl_Interp, Tcl_Obj, Tcl_SetObjResult, TCL_ERROR, TCL_OK};
use tcl::{Interpreter, Obj, TclError};

use crate::error::{TkError, TkResult};
use crate::runtime::{CommandHandler, Runtime, TraceHandler};

/// `Tcl_EvalObjEx` flag running the script at global level
const TCL_EVAL_GLOBAL: c_int = 0x2_0000;

/// Qualify `name` so it always resolves in the global namespace
fn global(name: &str) -> String {
    if name.starts_with("::") {
        name.to_string()
    } else {
        format!("::{name}")
    }
}

fn check_name(name: &str) -> Result<(), String> {
    if name.contains('\0') {
        Err(format!("string contains a NUL byte: {name:?}"))
    } else {
        Ok(())
    }
}

unsafe fn set_result(interp: *mut Tcl_Interp, text: &str) {
    let obj = Obj::from(text);
    Tcl_SetObjResult(interp, obj.as_ptr());
}

extern "C" fn command_trampoline(
    client_data: ClientData,
    interp: *mut Tcl_Interp,
    objc: c_int,
    objv: *const *mut Tcl_Obj,
) -> c_int {
    // SAFETY: client data is the box created in create_command and stays
    // alive until command_delete; objv holds objc live values
    unsafe {
        // Clone first: the handler may delete its own command, freeing the box
        let handler = Rc::clone(&*(client_data as *const CommandHandler));
        let count = usize::try_from(objc).unwrap_or(0);
        let args: Vec<String> = (0..count).map(|i| Obj::from_raw(*objv.add(i)).get_string()).collect();

        match catch_unwind(AssertUnwindSafe(|| handler(&args))) {
            Ok(Ok(result)) => {
                set_result(interp, &result);
                TCL_OK as c_int
            }
            Ok(Err(message)) => {
                set_result(interp, &message);
                TCL_ERROR as c_int
            }
            Err(_) => {
                tracing::error!(command = args.first().map(String::as_str), "native command panicked");
                set_result(interp, "native command panicked");
                TCL_ERROR as c_int
            }
        }
    }
}

unsafe extern "C" fn command_delete(client_data: ClientData) {
    drop(Box::from_raw(client_data.cast::<CommandHandler>()));
}

/// Runtime driving a real Tcl interpreter
pub struct TclRuntime {
    interp: Interpreter,
    next_trace: Cell<u64>,
}

impl TclRuntime {
    /// Create an interpreter and load Tk into it
    pub fn new() -> TkResult<Self> {
        let runtime = Self::tcl_only()?;
        runtime
            .interp
            .run("package require Tk")
            .map_err(|err| TkError::RuntimeInit(err.to_string()))?;
        tracing::info!("Tcl/Tk runtime initialized");
        Ok(runtime)
    }

    /// Create an interpreter without Tk, for scripts that open no windows
    pub fn tcl_only() -> TkResult<Self> {
        let interp = Interpreter::new().map_err(|err| {
            let err = TclError::from(err);
            TkError::RuntimeInit(format!("{err:?}"))
        })?;
        Ok(Self {
            interp,
            next_trace: Cell::new(0),
        })
    }
}

impl Runtime for TclRuntime {
    fn eval(&self, script: &str) -> Result<String, String> {
        self.interp
            .eval_with_flags(script, TCL_EVAL_GLOBAL)
            .map(|result| result.get_string())
            .map_err(|err| err.to_string())
    }

    fn get_var(&self, name: &str) -> Option<String> {
        self.interp.get(global(name)).ok().map(|value| value.get_string())
    }

    fn set_var(&self, name: &str, value: &str) -> Result<(), String> {
        let name = global(name);
        self.interp
            .run(("set", name.as_str(), value))
            .map_err(|err| err.to_string())
    }

    fn create_command(&self, name: &str, handler: CommandHandler) {
        if let Err(reason) = check_name(name) {
            tracing::warn!(name, reason = %reason, "command name rejected");
            return;
        }
        let data = Box::into_raw(Box::new(handler));
        // SAFETY: ownership of the box passes to Tcl and comes back through
        // command_delete; the trampoline catches handler panics
        unsafe {
            self.interp
                .def_proc_with_client_data(name, command_trampoline, data.cast(), Some(command_delete));
        }
    }

    fn delete_command(&self, name: &str) {
        if check_name(name).is_ok() {
            // Unknown names only produce a Tcl error
            let _ = self.interp.run(("rename", name, ""));
        }
    }

    fn trace_writes(&self, name: &str, handler: TraceHandler) {
        if let Err(reason) = check_name(name) {
            tracing::warn!(name, reason = %reason, "variable name rejected");
            return;
        }
        let id = self.next_trace.get();
        self.next_trace.set(id + 1);
        let command = format!("::_tkbind_trace{id}");

        let variable = global(name);
        let interp = (*self.interp).clone();
        let watched = variable.clone();
        self.create_command(
            &command,
            Rc::new(move |_args: &[String]| {
                let value = interp.get(watched.as_str()).map(|v| v.get_string()).unwrap_or_default();
                handler(&value);
                Ok::<_, String>(String::new())
            }),
        );

        if let Err(err) = self.interp.trace_add_variable_write(variable.as_str(), command.as_str()) {
            tracing::warn!(name, error = %err, "failed to install variable trace");
            self.delete_command(&command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_commands_evaluate_at_global_level() {
        let rt = Rc::new(TclRuntime::tcl_only().unwrap());
        let inner = Rc::clone(&rt);
        rt.create_command(
            "relay",
            Rc::new(move |args: &[String]| inner.eval(&format!("set seen {}", args[1]))),
        );

        rt.eval("proc caller {} { relay yes; return [info exists seen] }").unwrap();
        assert_eq!(rt.eval("caller").unwrap(), "0");
        assert_eq!(rt.get_var("seen").as_deref(), Some("yes"));
        assert_eq!(rt.eval("set ::seen").unwrap(), "yes");
    }

    #[test]
    fn test_vars_and_errors() {
        let rt = TclRuntime::tcl_only().unwrap();
        assert_eq!(rt.get_var("missing"), None);
        rt.set_var("count", "3").unwrap();
        assert_eq!(rt.eval("incr count").unwrap(), "4");
        assert!(rt.eval("incr").unwrap_err().contains("wrong # args"));

        rt.create_command("fail", Rc::new(|_: &[String]| Err::<String, _>("nope".to_string())));
        assert_eq!(rt.eval("fail").unwrap_err(), "nope");
        rt.delete_command("fail");
        assert!(rt.eval("fail").is_err());
    }

    #[test]
    fn test_write_trace_sees_new_value() {
        let rt = TclRuntime::tcl_only().unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        rt.trace_writes("level", Rc::new(move |value: &str| sink.borrow_mut().push(value.to_string())));

        rt.set_var("level", "1").unwrap();
        rt.eval("proc bump {} { incr ::level }; bump").unwrap();
        assert_eq!(*seen.borrow(), vec!["1".to_string(), "2".to_string()]);
    }
}
