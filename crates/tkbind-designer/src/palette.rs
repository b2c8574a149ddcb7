//! Widget types offered by the designer, with defaults for new entries

use std::collections::BTreeMap;

use crate::error::{DesignerError, DesignerResult};
use crate::model::{FormModel, WidgetModel};

/// Every widget type the preview builder can materialize
pub const WIDGET_TYPES: [&str; 12] = [
    "Label",
    "Entry",
    "Button",
    "Checkbutton",
    "Radiobutton",
    "Frame",
    "GroupBox",
    "Notebook",
    "Tab",
    "Treeview",
    "Combobox",
    "Text",
];

pub fn is_supported(kind: &str) -> bool {
    WIDGET_TYPES.contains(&kind)
}

/// Initial properties of a freshly dropped widget
pub fn default_props(kind: &str) -> BTreeMap<String, String> {
    let text = match kind {
        "Label" => "Label",
        "Button" => "Button",
        "Checkbutton" => "Check",
        "Radiobutton" => "Radio",
        "GroupBox" => "Group",
        "Tab" => "Tab",
        _ => return BTreeMap::new(),
    };
    BTreeMap::from([("text".to_string(), text.to_string())])
}

/// Initial size of a freshly dropped widget; zero means natural size
pub fn default_size(kind: &str) -> (i32, i32) {
    match kind {
        "Frame" | "GroupBox" => (200, 150),
        "Notebook" | "Treeview" => (300, 200),
        "Text" => (200, 100),
        _ => (0, 0),
    }
}

/// Add a new widget of `kind` at `(x, y)` under `parent` (the form itself
/// when `None`) and return its generated id
pub fn place_new(
    model: &mut FormModel,
    kind: &str,
    parent: Option<&str>,
    x: i32,
    y: i32,
) -> DesignerResult<String> {
    if !is_supported(kind) {
        return Err(DesignerError::Inconsistent(format!("unsupported widget type '{kind}'")));
    }
    let parent_id = parent.map_or_else(|| model.name.clone(), str::to_string);
    let id = model.generate_id(kind);
    let (width, height) = default_size(kind);
    let mut widget = WidgetModel::new(&id, kind, parent_id).at(x, y).sized(width, height);
    widget.props = default_props(kind);
    model.add_widget(widget)?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_props() {
        assert_eq!(default_props("Checkbutton")["text"], "Check");
        assert!(default_props("Entry").is_empty());
        assert!(is_supported("GroupBox"));
        assert!(!is_supported("Canvas"));
    }

    #[test]
    fn test_place_new() {
        let mut form = FormModel::new("Form1", "");
        let frame = place_new(&mut form, "Frame", None, 10, 10).unwrap();
        let label = place_new(&mut form, "Label", Some(&frame), 4, 4).unwrap();

        assert_eq!(frame, "Frame1");
        assert_eq!(label, "Label2");
        assert_eq!(form.widget(&frame).unwrap().width, 200);
        assert_eq!(form.widget(&label).unwrap().prop("text"), "Label");
        assert!(place_new(&mut form, "Canvas", None, 0, 0).is_err());
        form.validate().unwrap();
    }
}
