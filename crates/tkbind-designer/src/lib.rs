//! tkbind-designer - form model and live preview for a drag-and-drop form designer
//!
//! This crate provides:
//! - Form model: widgets keyed by id, arranged in a parent/child hierarchy
//! - JSON persistence of forms
//! - A palette of supported widget types with placement defaults
//! - Preview: building live widgets from a model onto a form window
//!
//! ```
//! use tkbind::{Interp, Root};
//! use tkbind_designer::{palette, BaseForm, FormModel, PreviewBuilder};
//!
//! let mut model = FormModel::new("Form1", "Login");
//! let frame = palette::place_new(&mut model, "Frame", None, 10, 10)?;
//! palette::place_new(&mut model, "Entry", Some(&frame), 5, 5)?;
//!
//! let interp = Interp::headless()?;
//! let root = Root::new(&interp)?;
//! let mut form = BaseForm::new(&root, &model.caption, model.width, model.height)?;
//! let widgets = PreviewBuilder::new(&mut form, &model).build(|_, _, _| {})?;
//! assert_eq!(widgets.len(), 2);
//! # Ok::<(), tkbind_designer::DesignerError>(())
//! ```

/// Error types
pub mod error;

/// Form and widget model
pub mod model;

/// JSON persistence
pub mod serialize;

/// Supported widget types
pub mod palette;

/// Form window with widget factories
pub mod form;

/// Model-to-widget preview
pub mod preview;

/// Designer preferences
pub mod config;

pub use config::{DesignerConfig, FormDefaults};
pub use error::{DesignerError, DesignerResult};
pub use form::BaseForm;
pub use model::{FormModel, WidgetModel};
pub use preview::PreviewBuilder;
pub use serialize::{from_json, from_json_str, load_form, save_form, to_json, to_json_string};
