//! Typed widget wrappers
//!
//! Each wrapper is a thin layer over [`Widget`](crate::widget::Widget): it
//! fixes the creation command and adds setters and operations for that
//! widget type. Everything else is reachable through `Deref`. Setters
//! return `&Self` so they chain with `?`:
//!
//! ```
//! use tkbind::widgets::classic::Label;
//! use tkbind::{options, Interp, Root};
//!
//! let interp = Interp::headless()?;
//! let root = Root::new(&interp)?;
//! let label = Label::new(&root)?;
//! label.text("Hello")?.pack(&options! { "padx" => 4 })?;
//! # Ok::<(), tkbind::TkError>(())
//! ```

/// Declare a wrapper struct around a widget created with `$command`
macro_rules! widget_type {
    ($(#[$meta:meta])* $name:ident, $command:literal, $tag:literal) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name(crate::widget::Widget);

        impl $name {
            /// Runtime command that creates this widget type
            pub const COMMAND: &'static str = $command;

            pub fn new(parent: &crate::widget::Widget) -> crate::error::TkResult<Self> {
                Self::with_options(parent, &crate::value::Options::new())
            }

            pub fn with_options(
                parent: &crate::widget::Widget,
                options: &crate::value::Options,
            ) -> crate::error::TkResult<Self> {
                crate::widget::Widget::create(parent.interp(), parent.name(), $command, $tag, options).map(Self)
            }

            pub fn destroy(self) -> crate::error::TkResult<()> {
                self.0.destroy()
            }

            #[must_use]
            pub fn into_widget(self) -> crate::widget::Widget {
                self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = crate::widget::Widget;

            fn deref(&self) -> &crate::widget::Widget {
                &self.0
            }
        }

        impl From<$name> for crate::widget::Widget {
            fn from(w: $name) -> Self {
                w.0
            }
        }
    };
}

/// Chainable setters for options that take a plain value
macro_rules! option_setters {
    ($name:ident { $($method:ident => $option:literal : $ty:ty),+ $(,)? }) => {
        impl $name {
            $(
                pub fn $method(&self, value: $ty) -> crate::error::TkResult<&Self> {
                    self.config_one($option, value)?;
                    Ok(self)
                }
            )+
        }
    };
}

/// Setters linking a widget to a [`Var`](crate::var::Var)
macro_rules! var_setters {
    ($name:ident { $($method:ident => $option:literal),+ $(,)? }) => {
        impl $name {
            $(
                pub fn $method<T: crate::var::VarValue>(
                    &self,
                    var: &crate::var::Var<T>,
                ) -> crate::error::TkResult<&Self> {
                    self.config_one($option, var)?;
                    Ok(self)
                }
            )+
        }
    };
}

/// `command` setter taking a closure with no arguments
macro_rules! command_setter {
    ($($name:ident),+ $(,)?) => {
        $(
            impl $name {
                /// Run `f` whenever the widget is activated
                pub fn command(&self, f: impl Fn() + 'static) -> crate::error::TkResult<&Self> {
                    self.set_command(f)?;
                    Ok(self)
                }
            }
        )+
    };
}

/// Editing operations shared by entry-like widgets
macro_rules! entry_ops {
    ($($name:ident),+ $(,)?) => {
        $(
            impl $name {
                /// Current text
                pub fn get(&self) -> crate::error::TkResult<String> {
                    self.interp().evaluate(&format!("{} get", self.name()))
                }

                /// Insert text at an index such as `0`, `end` or `insert`
                pub fn insert(&self, index: &str, text: &str) -> crate::error::TkResult<&Self> {
                    self.interp().evaluate(&format!(
                        "{} insert {} {}",
                        self.name(),
                        crate::value::ArgValue::from(index).render(),
                        crate::value::ArgValue::from(text).render()
                    ))?;
                    Ok(self)
                }

                /// Delete from `start` up to `end`, or one character
                pub fn erase(&self, start: &str, end: Option<&str>) -> crate::error::TkResult<&Self> {
                    let end = end.map(|e| format!(" {}", crate::value::ArgValue::from(e).render()));
                    self.interp().evaluate(&format!(
                        "{} delete {}{}",
                        self.name(),
                        crate::value::ArgValue::from(start).render(),
                        end.unwrap_or_default()
                    ))?;
                    Ok(self)
                }

                /// Replace the whole text
                pub fn set(&self, text: &str) -> crate::error::TkResult<&Self> {
                    self.erase("0", Some("end"))?.insert("0", text)
                }

                pub fn icursor(&self, index: &str) -> crate::error::TkResult<&Self> {
                    self.interp().evaluate(&format!(
                        "{} icursor {}",
                        self.name(),
                        crate::value::ArgValue::from(index).render()
                    ))?;
                    Ok(self)
                }
            }
        )+
    };
}

pub mod classic;
pub mod ttk;
