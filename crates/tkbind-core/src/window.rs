//! Top-level windows
//!
//! [`Root`] wraps the runtime's root window `.` and owns the main loop;
//! [`Toplevel`] is an additional top-level window. Both implement
//! [`WindowManager`], whose default methods issue `wm` commands.

use std::ops::Deref;

use crate::callback::CallbackId;
use crate::error::TkResult;
use crate::interp::Interp;
use crate::value::{parse_int, render_options, sanitize, ArgValue, Options};
use crate::widget::{Widget, ROOT_NAME};

/// Protocol the window manager sends when the user closes a window
pub const WM_DELETE_WINDOW: &str = "WM_DELETE_WINDOW";

fn wm(window: &Widget, sub: &str, args: &str) -> TkResult<String> {
    window.interp().evaluate(&format!("wm {sub} {}{args}", window.name()))
}

/// Window-manager operations shared by every top-level window
pub trait WindowManager {
    /// The widget backing this window
    fn window(&self) -> &Widget;

    fn title(&self, title: &str) -> TkResult<()> {
        wm(self.window(), "title", &format!(" {}", ArgValue::from(title).render())).map(drop)
    }

    fn current_title(&self) -> TkResult<String> {
        wm(self.window(), "title", "")
    }

    /// Set the geometry, e.g. `640x480+10+20`
    fn geometry(&self, geometry: &str) -> TkResult<()> {
        wm(self.window(), "geometry", &format!(" {geometry}")).map(drop)
    }

    fn current_geometry(&self) -> TkResult<String> {
        wm(self.window(), "geometry", "")
    }

    /// Install a handler for a window-manager protocol such as
    /// [`WM_DELETE_WINDOW`]
    fn protocol(&self, protocol: &str, f: impl Fn() + 'static) -> TkResult<CallbackId>
    where
        Self: Sized,
    {
        let window = self.window();
        let name = format!("protocol_cb_{}_{}", sanitize(window.name()), sanitize(protocol));
        let id = window.interp().register_void_callback(&name, f);
        if let Err(err) = wm(window, "protocol", &format!(" {protocol} {name}")) {
            window.interp().unregister_callback(id);
            return Err(err);
        }
        Ok(window.track(id))
    }

    fn resizable(&self, width: bool, height: bool) -> TkResult<()> {
        wm(self.window(), "resizable", &format!(" {} {}", u8::from(width), u8::from(height))).map(drop)
    }

    fn minsize(&self, width: i64, height: i64) -> TkResult<()> {
        wm(self.window(), "minsize", &format!(" {width} {height}")).map(drop)
    }

    fn maxsize(&self, width: i64, height: i64) -> TkResult<()> {
        wm(self.window(), "maxsize", &format!(" {width} {height}")).map(drop)
    }

    fn iconify(&self) -> TkResult<()> {
        wm(self.window(), "iconify", "").map(drop)
    }

    fn deiconify(&self) -> TkResult<()> {
        wm(self.window(), "deiconify", "").map(drop)
    }

    fn withdraw(&self) -> TkResult<()> {
        wm(self.window(), "withdraw", "").map(drop)
    }

    /// Set the state: `normal`, `iconic`, `withdrawn` or `zoomed`
    fn set_state(&self, state: &str) -> TkResult<()> {
        wm(self.window(), "state", &format!(" {state}")).map(drop)
    }

    fn state(&self) -> TkResult<String> {
        wm(self.window(), "state", "")
    }

    /// Set a platform attribute such as `topmost` or `alpha`
    fn set_attribute(&self, name: &str, value: impl Into<ArgValue>) -> TkResult<()>
    where
        Self: Sized,
    {
        let mut options = Options::new();
        options.insert(name.to_string(), value.into());
        wm(self.window(), "attributes", &render_options(&options)).map(drop)
    }

    fn attribute(&self, name: &str) -> TkResult<String> {
        wm(self.window(), "attributes", &format!(" -{name}"))
    }

    fn lift(&self) -> TkResult<()> {
        let window = self.window();
        window.interp().evaluate(&format!("raise {}", window.name())).map(drop)
    }

    fn lower(&self) -> TkResult<()> {
        let window = self.window();
        window.interp().evaluate(&format!("lower {}", window.name())).map(drop)
    }

    /// Route all input to this window
    fn grab_set(&self) -> TkResult<()> {
        let window = self.window();
        window.interp().evaluate(&format!("grab set {}", window.name())).map(drop)
    }

    fn grab_release(&self) -> TkResult<()> {
        let window = self.window();
        window.interp().evaluate(&format!("grab release {}", window.name())).map(drop)
    }

    /// Use a named image as the window icon
    fn iconphoto(&self, image: &str) -> TkResult<()> {
        wm(self.window(), "iconphoto", &format!(" {image}")).map(drop)
    }

    fn iconbitmap(&self, bitmap: &str) -> TkResult<()> {
        wm(self.window(), "iconbitmap", &format!(" {}", ArgValue::from(bitmap).render())).map(drop)
    }
}

/// The application's root window
#[derive(Debug)]
pub struct Root {
    widget: Widget,
    quit_var: String,
}

impl Root {
    /// Wrap the root window and apply the interpreter's root settings.
    ///
    /// Closing the window ends [`Root::mainloop`].
    pub fn new(interp: &Interp) -> TkResult<Self> {
        let widget = Widget::existing(interp, ROOT_NAME, "tk");
        let quit_var = format!("quit_var_{}", widget.id());
        interp.set_var(&quit_var, "0")?;
        let root = Self { widget, quit_var };

        let config = &interp.config().root;
        root.title(&config.title)?;
        root.geometry(&config.geometry)?;

        let weak = interp.downgrade();
        let var = root.quit_var.clone();
        root.protocol(WM_DELETE_WINDOW, move || {
            if let Some(interp) = weak.upgrade() {
                if let Err(err) = interp.set_var(&var, "1") {
                    tracing::warn!(error = %err, "failed to signal quit");
                }
            }
        })?;
        Ok(root)
    }

    /// Name of the variable whose write ends the main loop
    #[must_use]
    pub fn quit_var(&self) -> &str {
        &self.quit_var
    }

    /// Process events until [`Root::quit`] is called or the window is closed
    pub fn mainloop(&self) -> TkResult<()> {
        tracing::info!("entering main loop");
        self.widget.interp().evaluate(&format!("vwait {}", self.quit_var))?;
        tracing::info!("main loop finished");
        Ok(())
    }

    /// End the main loop
    pub fn quit(&self) -> TkResult<()> {
        self.widget.interp().set_var(&self.quit_var, "1")
    }

    /// Screen size as reported by the runtime
    pub fn screen_size(&self) -> TkResult<(i64, i64)> {
        let interp = self.widget.interp();
        let width = interp.evaluate("winfo screenwidth .")?;
        let height = interp.evaluate("winfo screenheight .")?;
        Ok((parse_int(&width), parse_int(&height)))
    }
}

impl WindowManager for Root {
    fn window(&self) -> &Widget {
        &self.widget
    }
}

impl Deref for Root {
    type Target = Widget;

    fn deref(&self) -> &Widget {
        &self.widget
    }
}

/// An additional top-level window
#[derive(Debug)]
pub struct Toplevel {
    widget: Widget,
}

impl Toplevel {
    pub fn new(parent: &Widget) -> TkResult<Self> {
        Self::with_options(parent, &Options::new())
    }

    /// Create the window; closing it destroys it
    pub fn with_options(parent: &Widget, options: &Options) -> TkResult<Self> {
        let widget = Widget::create(parent.interp(), parent.name(), "toplevel", "toplevel", options)?;
        let window = Self { widget };

        let weak = window.interp().downgrade();
        let name = window.name().to_string();
        window.protocol(WM_DELETE_WINDOW, move || {
            if let Some(interp) = weak.upgrade() {
                // Failure is already logged by evaluate
                let _ = interp.evaluate(&format!("destroy {name}"));
            }
        })?;
        Ok(window)
    }

    pub fn destroy(self) -> TkResult<()> {
        self.widget.destroy()
    }
}

impl WindowManager for Toplevel {
    fn window(&self) -> &Widget {
        &self.widget
    }
}

impl Deref for Toplevel {
    type Target = Widget;

    fn deref(&self) -> &Widget {
        &self.widget
    }
}

impl From<Toplevel> for Widget {
    fn from(window: Toplevel) -> Self {
        window.widget
    }
}
