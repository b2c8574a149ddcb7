//! JSON persistence of forms
//!
//! Documents are written as pretty JSON with four-space indentation. Decoding
//! requires every scalar widget field plus the form's `name` and `caption`;
//! collections and the remaining form fields fall back to their defaults. A
//! decoded form must also pass [`FormModel::validate`].

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::path::Path;

use crate::error::DesignerResult;
use crate::model::FormModel;

/// Encode a form as a JSON value
pub fn to_json(model: &FormModel) -> DesignerResult<Value> {
    Ok(serde_json::to_value(model)?)
}

/// Decode and validate a form from a JSON value
pub fn from_json(value: Value) -> DesignerResult<FormModel> {
    let model: FormModel = serde_json::from_value(value)?;
    model.validate()?;
    Ok(model)
}

/// Encode a form as pretty JSON text
pub fn to_json_string(model: &FormModel) -> DesignerResult<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    model.serialize(&mut serializer)?;
    // serde_json only emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Decode and validate a form from JSON text
pub fn from_json_str(text: &str) -> DesignerResult<FormModel> {
    let model: FormModel = serde_json::from_str(text)?;
    model.validate()?;
    Ok(model)
}

pub fn save_form(model: &FormModel, path: impl AsRef<Path>) -> DesignerResult<()> {
    let path = path.as_ref();
    std::fs::write(path, to_json_string(model)?)?;
    tracing::info!(form = %model.name, path = %path.display(), widgets = model.len(), "form saved");
    Ok(())
}

pub fn load_form(path: impl AsRef<Path>) -> DesignerResult<FormModel> {
    let path = path.as_ref();
    let model = from_json_str(&std::fs::read_to_string(path)?)?;
    tracing::info!(form = %model.name, path = %path.display(), widgets = model.len(), "form loaded");
    Ok(model)
}
