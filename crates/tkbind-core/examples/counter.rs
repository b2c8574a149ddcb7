//! Click counter
//!
//! Runs against the headless runtime and scripts a few clicks before closing
//! itself. Build with `--features tcl` to open a real window instead.
//!
//! Set `RUST_LOG=tkbind=debug` to see every command sent to the runtime.

use std::rc::Rc;

use tkbind::widgets::ttk;
use tkbind::{options, IntVar, Interp, Root, TkConfig, TkResult, WindowManager};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "tcl")]
fn open(config: TkConfig) -> TkResult<Interp> {
    Interp::tcl(config)
}

#[cfg(not(feature = "tcl"))]
fn open(config: TkConfig) -> TkResult<Interp> {
    Interp::headless_with_config(config)
}

fn main() -> TkResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tkbind=info")),
        )
        .init();

    let interp = open(TkConfig::default())?;
    let root = Root::new(&interp)?;
    root.title("Counter")?;
    root.resizable(false, false)?;

    let count = Rc::new(IntVar::new(&interp)?);
    let label = ttk::Label::new(&root)?;
    label.config_one("textvariable", &*count)?;
    label.grid(&options! { "row" => 0, "column" => 0, "padx" => 8, "pady" => 8 })?;

    let button = Rc::new(ttk::Button::new(&root)?);
    let clicks = count.clone();
    button
        .text("Click")?
        .command(move || {
            let next = clicks.get() + 1;
            if let Err(err) = clicks.set(&next) {
                tracing::warn!(error = %err, "failed to update counter");
            }
        })?;
    button.grid(&options! { "row" => 0, "column" => 1, "padx" => 8 })?;

    count.trace(|value| tracing::info!(value, "counter changed"));

    #[cfg(not(feature = "tcl"))]
    {
        for delay in [100, 200, 300] {
            let pressed = button.clone();
            root.after(delay, move || {
                let _ = pressed.invoke();
            })?;
        }
        let quitter = root.interp().downgrade();
        let var = root.quit_var().to_string();
        root.after(400, move || {
            if let Some(interp) = quitter.upgrade() {
                let _ = interp.set_var(&var, "1");
            }
        })?;
    }

    root.mainloop()?;
    tracing::info!(total = count.get(), "done");
    Ok(())
}
