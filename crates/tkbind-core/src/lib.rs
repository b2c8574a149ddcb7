//! tkbind - typed widget bindings over a command-driven Tk runtime
//!
//! This crate provides:
//! - Value marshaling: quoting typed values into command text and parsing results back
//! - Interpreter handle: evaluation, variables, traces and named callbacks
//! - Widgets: hierarchical naming, options, geometry, events and timers
//! - Windows: root and toplevel windows with window-manager operations
//! - Variables, fonts and modal dialogs
//! - Runtimes: an in-process headless runtime, and Tcl/Tk behind the `tcl` feature
//!
//! ```
//! use tkbind::{options, Interp, Root};
//! use tkbind::widgets::ttk::Button;
//!
//! let interp = Interp::headless()?;
//! let root = Root::new(&interp)?;
//! let button = Button::new(&root)?;
//! button.text("Quit")?.command(|| println!("bye"))?;
//! button.grid(&options! { "row" => 0, "column" => 0 })?;
//! # Ok::<(), tkbind::TkError>(())
//! ```

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Value rendering and result parsing
pub mod value;

/// Error types
pub mod error;

/// Configuration loaded from TOML
pub mod config;

/// Process-wide object ids
pub mod ident;

/// Event payloads delivered to bound callbacks
pub mod event;

/// Callback and trace registries
pub mod callback;

/// Runtime trait and implementations
pub mod runtime;

/// Interpreter handle
pub mod interp;

/// Base widget
pub mod widget;

/// Typed widget wrappers
pub mod widgets;

/// Parent/child ownership of widgets
pub mod tree;

/// Root and toplevel windows
pub mod window;

/// Runtime-backed variables
pub mod var;

/// Named fonts
pub mod font;

/// Message boxes and choosers
pub mod dialog;

pub use callback::{Callback, CallbackId, TraceCallback, TraceId};
pub use config::TkConfig;
pub use error::{TkError, TkResult};
pub use event::Event;
pub use font::Font;
pub use ident::ObjectId;
pub use interp::{Interp, WeakInterp};
pub use runtime::{HeadlessRuntime, Runtime};
pub use tree::{WidgetKey, WidgetTree};
pub use value::{ArgValue, Options};
pub use var::{BooleanVar, DoubleVar, IntVar, StringVar, Var, VarValue};
pub use widget::{AfterId, Widget};
pub use window::{Root, Toplevel, WindowManager};

#[cfg(feature = "tcl")]
pub use runtime::TclRuntime;
