//! Modal dialogs
//!
//! Every function takes the interpreter explicitly and blocks until the
//! dialog is answered.

use crate::error::TkResult;
use crate::interp::Interp;
use crate::value::{render_options, ArgValue, Options};

fn message_box(interp: &Interp, kind: &str, icon: &str, title: &str, message: &str) -> TkResult<String> {
    interp.evaluate(&format!(
        "tk_messageBox -type {kind} -icon {icon} -title {} -message {}",
        ArgValue::from(title).render(),
        ArgValue::from(message).render()
    ))
}

fn non_empty(answer: String) -> Option<String> {
    (!answer.is_empty()).then_some(answer)
}

/// Message boxes; the `ask_*` helpers map the pressed button to a bool
pub mod messagebox {
    use super::{message_box, Interp, TkResult};

    pub fn show_info(interp: &Interp, title: &str, message: &str) -> TkResult<String> {
        message_box(interp, "ok", "info", title, message)
    }

    pub fn show_warning(interp: &Interp, title: &str, message: &str) -> TkResult<String> {
        message_box(interp, "ok", "warning", title, message)
    }

    pub fn show_error(interp: &Interp, title: &str, message: &str) -> TkResult<String> {
        message_box(interp, "ok", "error", title, message)
    }

    /// Returns `yes` or `no`
    pub fn ask_question(interp: &Interp, title: &str, message: &str) -> TkResult<String> {
        message_box(interp, "yesno", "question", title, message)
    }

    pub fn ask_yes_no(interp: &Interp, title: &str, message: &str) -> TkResult<bool> {
        ask_question(interp, title, message).map(|answer| answer == "yes")
    }

    pub fn ask_ok_cancel(interp: &Interp, title: &str, message: &str) -> TkResult<bool> {
        message_box(interp, "okcancel", "question", title, message).map(|answer| answer == "ok")
    }

    pub fn ask_retry_cancel(interp: &Interp, title: &str, message: &str) -> TkResult<bool> {
        message_box(interp, "retrycancel", "warning", title, message).map(|answer| answer == "retry")
    }
}

/// File and directory choosers; `None` when the user cancels
pub mod filedialog {
    use super::{non_empty, render_options, Interp, Options, TkResult};

    /// Options include `title`, `initialdir`, `initialfile` and `filetypes`
    pub fn ask_open_filename(interp: &Interp, options: &Options) -> TkResult<Option<String>> {
        interp
            .evaluate(&format!("tk_getOpenFile{}", render_options(options)))
            .map(non_empty)
    }

    pub fn ask_save_as_filename(interp: &Interp, options: &Options) -> TkResult<Option<String>> {
        interp
            .evaluate(&format!("tk_getSaveFile{}", render_options(options)))
            .map(non_empty)
    }

    pub fn ask_directory(interp: &Interp, options: &Options) -> TkResult<Option<String>> {
        interp
            .evaluate(&format!("tk_chooseDirectory{}", render_options(options)))
            .map(non_empty)
    }
}

pub mod colorchooser {
    use super::{non_empty, render_options, Interp, Options, TkResult};

    /// Pick a color; returns `#rrggbb`, or `None` when cancelled
    pub fn ask_color(interp: &Interp, options: &Options) -> TkResult<Option<String>> {
        interp
            .evaluate(&format!("tk_chooseColor{}", render_options(options)))
            .map(non_empty)
    }
}
