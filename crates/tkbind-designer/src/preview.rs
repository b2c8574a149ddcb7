//! Materializes a [`FormModel`] onto a [`BaseForm`]

use std::collections::HashMap;

use tkbind::{Widget, WidgetKey};

use crate::error::{DesignerError, DesignerResult};
use crate::form::BaseForm;
use crate::model::{FormModel, WidgetModel};

/// Radio buttons without an explicit group share this variable
pub const DEFAULT_RADIO_GROUP: &str = "group1";

/// Builds live widgets from a form model
pub struct PreviewBuilder<'a> {
    form: &'a mut BaseForm,
    model: &'a FormModel,
    keys: HashMap<String, WidgetKey>,
}

impl<'a> PreviewBuilder<'a> {
    pub fn new(form: &'a mut BaseForm, model: &'a FormModel) -> Self {
        Self {
            form,
            model,
            keys: HashMap::new(),
        }
    }

    /// Clear the form and create every widget of the model, depth first.
    ///
    /// `register` is called once per created widget with its model id. A
    /// widget of an unknown type is skipped together with its subtree.
    /// Returns the key of every created widget by model id.
    pub fn build(
        mut self,
        mut register: impl FnMut(&Widget, WidgetKey, &str),
    ) -> DesignerResult<HashMap<String, WidgetKey>> {
        self.form.clear_widgets()?;
        let model = self.model;
        for id in &model.root_widgets {
            self.build_widget(id, None, &mut register)?;
        }
        tracing::debug!(form = %model.name, widgets = self.keys.len(), "preview built");
        Ok(self.keys)
    }

    fn build_widget(
        &mut self,
        id: &str,
        parent: Option<WidgetKey>,
        register: &mut impl FnMut(&Widget, WidgetKey, &str),
    ) -> DesignerResult<()> {
        let model = self.model;
        let widget = model
            .widget(id)
            .ok_or_else(|| DesignerError::UnknownWidget(id.to_string()))?;

        let Some(key) = self.create(widget, parent)? else {
            tracing::debug!(id, kind = %widget.kind, "skipping unsupported widget");
            return Ok(());
        };
        if let Some(live) = self.form.widget(key) {
            register(live, key, id);
        }
        self.keys.insert(id.to_string(), key);

        for child in &widget.children {
            self.build_widget(child, Some(key), register)?;
        }
        Ok(())
    }

    fn create(&mut self, w: &WidgetModel, parent: Option<WidgetKey>) -> DesignerResult<Option<WidgetKey>> {
        let form = &mut *self.form;
        let (x, y, width, height) = (w.x, w.y, w.width, w.height);
        let key = match w.kind.as_str() {
            "Label" => form.create_label(parent, x, y, w.prop("text"))?,
            "Entry" => form.create_entry(parent, x, y)?,
            "Button" => form.create_button(parent, x, y, w.prop("text"))?,
            "Combobox" => {
                let values = tkbind::value::split_words(w.prop("values"));
                let values: Vec<&str> = values.iter().map(String::as_str).collect();
                form.create_combobox(parent, x, y, &values)?
            }
            "Checkbutton" => form.create_checkbutton(parent, x, y, w.prop("text"))?,
            "Radiobutton" => {
                let group = match w.prop("group") {
                    "" => DEFAULT_RADIO_GROUP,
                    group => group,
                };
                form.create_radiobutton(parent, x, y, w.prop("text"), group, &w.id)?
            }
            "Frame" => form.create_frame(parent, x, y, width, height)?,
            "GroupBox" => form.create_labelframe(parent, x, y, width, height, w.prop("text"))?,
            "Notebook" => form.create_notebook(parent, x, y, width, height)?,
            "Tab" => {
                let Some(notebook) = parent else {
                    return Err(DesignerError::Inconsistent(format!(
                        "tab '{}' must be placed in a notebook",
                        w.id
                    )));
                };
                form.create_tab(notebook, w.prop("text"))?
            }
            "Treeview" => {
                let columns = tkbind::value::split_words(w.prop("columns"));
                let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
                form.create_treeview(parent, x, y, width, height, &columns)?
            }
            "Text" => form.create_text(parent, x, y, width, height)?,
            _ => return Ok(None),
        };
        Ok(Some(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::place_new;
    use std::rc::Rc;
    use tkbind::{HeadlessRuntime, Interp, Root, TkConfig};

    fn setup() -> (Rc<HeadlessRuntime>, Interp, Root) {
        let runtime = Rc::new(HeadlessRuntime::new());
        let interp = Interp::new(runtime.clone(), TkConfig::default()).unwrap();
        let root = Root::new(&interp).unwrap();
        (runtime, interp, root)
    }

    #[test]
    fn test_build_nested_widgets() {
        let (rt, _interp, root) = setup();
        let mut model = FormModel::new("Form1", "Preview");
        let frame = place_new(&mut model, "Frame", None, 0, 0).unwrap();
        let check = place_new(&mut model, "Checkbutton", Some(&frame), 10, 10).unwrap();
        let radio = place_new(&mut model, "Radiobutton", None, 10, 200).unwrap();

        let mut form = BaseForm::new(&root, &model.caption, model.width, model.height).unwrap();
        let mut seen = Vec::new();
        let keys = PreviewBuilder::new(&mut form, &model)
            .build(|_, _, id| seen.push(id.to_string()))
            .unwrap();

        assert_eq!(seen, vec![frame.clone(), check.clone(), radio.clone()]);
        assert_eq!(form.tree().children(keys[&frame]), &[keys[&check]]);

        let radio_name = form.widget(keys[&radio]).unwrap().name().to_string();
        assert_eq!(rt.widget_option(&radio_name, "variable").as_deref(), Some(DEFAULT_RADIO_GROUP));
        assert_eq!(rt.widget_option(&radio_name, "value").as_deref(), Some(radio.as_str()));
    }

    #[test]
    fn test_unknown_types_skip_subtree() {
        let (_rt, _interp, root) = setup();
        let mut model = FormModel::new("Form1", "");
        model
            .add_widget(WidgetModel::new("Canvas1", "Canvas", "Form1"))
            .unwrap();
        model
            .add_widget(WidgetModel::new("Label2", "Label", "Canvas1"))
            .unwrap();
        let entry = place_new(&mut model, "Entry", None, 0, 0).unwrap();

        let mut form = BaseForm::new(&root, "", 100, 100).unwrap();
        let keys = PreviewBuilder::new(&mut form, &model).build(|_, _, _| {}).unwrap();

        assert_eq!(keys.len(), 1);
        assert!(keys.contains_key(&entry));
        assert_eq!(form.len(), 1);
    }

    #[test]
    fn test_rebuild_replaces_widgets() {
        let (_rt, _interp, root) = setup();
        let mut model = FormModel::new("Form1", "");
        let notebook = place_new(&mut model, "Notebook", None, 0, 0).unwrap();
        place_new(&mut model, "Tab", Some(&notebook), 0, 0).unwrap();

        let mut form = BaseForm::new(&root, "", 400, 300).unwrap();
        PreviewBuilder::new(&mut form, &model).build(|_, _, _| {}).unwrap();
        let keys = PreviewBuilder::new(&mut form, &model).build(|_, _, _| {}).unwrap();

        assert_eq!(keys.len(), 2);
        assert_eq!(form.len(), 2);
    }
}
