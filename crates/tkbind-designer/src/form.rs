//! The window a designed form is previewed in
//!
//! [`BaseForm`] owns a toplevel window and a [`WidgetTree`] of everything
//! placed on it. Widgets are positioned with the `place` geometry manager
//! at absolute coordinates, the way the designer lays them out.

use tkbind::widgets::{classic, ttk};
use tkbind::{options, Options, TkError, Toplevel, Widget, WidgetKey, WidgetTree, WindowManager};

use crate::error::{DesignerError, DesignerResult};

/// Toplevel window hosting a form's widgets
#[derive(Debug)]
pub struct BaseForm {
    // Declared first so the widgets are destroyed before their window
    tree: WidgetTree,
    window: Toplevel,
}

fn place_at(widget: &Widget, x: i32, y: i32) -> Result<(), TkError> {
    widget.place(&options! { "x" => x, "y" => y })
}

fn place_sized(widget: &Widget, x: i32, y: i32, width: i32, height: i32) -> Result<(), TkError> {
    widget.place(&options! { "x" => x, "y" => y, "width" => width, "height" => height })
}

impl BaseForm {
    /// Open a form window of the given size under `parent`
    pub fn new(parent: &Widget, caption: &str, width: i32, height: i32) -> DesignerResult<Self> {
        let window = Toplevel::new(parent)?;
        window.title(caption)?;
        window.geometry(&format!("{width}x{height}"))?;
        let tree = WidgetTree::new(window.interp(), window.name());
        Ok(Self { tree, window })
    }

    pub fn window(&self) -> &Toplevel {
        &self.window
    }

    pub fn tree(&self) -> &WidgetTree {
        &self.tree
    }

    pub fn widget(&self, key: WidgetKey) -> Option<&Widget> {
        self.tree.get(key)
    }

    /// Number of widgets on the form
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    fn parent_widget(&self, parent: Option<WidgetKey>) -> DesignerResult<&Widget> {
        match parent {
            None => Ok(&self.window),
            Some(key) => self.tree.get(key).ok_or(DesignerError::Tk(TkError::UnknownWidget)),
        }
    }

    fn adopt(&mut self, parent: Option<WidgetKey>, widget: impl Into<Widget>) -> DesignerResult<WidgetKey> {
        Ok(self.tree.adopt(parent, widget)?)
    }

    pub fn create_label(&mut self, parent: Option<WidgetKey>, x: i32, y: i32, text: &str) -> DesignerResult<WidgetKey> {
        let label = ttk::Label::new(self.parent_widget(parent)?)?;
        label.text(text)?;
        place_at(&label, x, y)?;
        self.adopt(parent, label)
    }

    pub fn create_entry(&mut self, parent: Option<WidgetKey>, x: i32, y: i32) -> DesignerResult<WidgetKey> {
        let entry = ttk::Entry::new(self.parent_widget(parent)?)?;
        place_at(&entry, x, y)?;
        self.adopt(parent, entry)
    }

    pub fn create_button(&mut self, parent: Option<WidgetKey>, x: i32, y: i32, text: &str) -> DesignerResult<WidgetKey> {
        let button = ttk::Button::new(self.parent_widget(parent)?)?;
        button.text(text)?;
        place_at(&button, x, y)?;
        self.adopt(parent, button)
    }

    pub fn create_combobox(
        &mut self,
        parent: Option<WidgetKey>,
        x: i32,
        y: i32,
        values: &[&str],
    ) -> DesignerResult<WidgetKey> {
        let combo = ttk::Combobox::new(self.parent_widget(parent)?)?;
        if !values.is_empty() {
            combo.values(values)?;
        }
        place_at(&combo, x, y)?;
        self.adopt(parent, combo)
    }

    pub fn create_checkbutton(&mut self, parent: Option<WidgetKey>, x: i32, y: i32, text: &str) -> DesignerResult<WidgetKey> {
        let check = ttk::Checkbutton::new(self.parent_widget(parent)?)?;
        check.text(text)?;
        place_at(&check, x, y)?;
        self.adopt(parent, check)
    }

    /// Radio buttons sharing `group` are linked through the runtime variable of that name
    pub fn create_radiobutton(
        &mut self,
        parent: Option<WidgetKey>,
        x: i32,
        y: i32,
        text: &str,
        group: &str,
        value: &str,
    ) -> DesignerResult<WidgetKey> {
        let radio = ttk::Radiobutton::new(self.parent_widget(parent)?)?;
        radio.config(&options! { "text" => text, "variable" => group, "value" => value })?;
        place_at(&radio, x, y)?;
        self.adopt(parent, radio)
    }

    pub fn create_treeview(
        &mut self,
        parent: Option<WidgetKey>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        columns: &[&str],
    ) -> DesignerResult<WidgetKey> {
        let tree = ttk::Treeview::new(self.parent_widget(parent)?)?;
        if !columns.is_empty() {
            tree.columns(columns)?;
            for column in columns {
                tree.heading(column, &options! { "text" => *column })?;
            }
        }
        place_sized(&tree, x, y, width, height)?;
        self.adopt(parent, tree)
    }

    pub fn create_frame(
        &mut self,
        parent: Option<WidgetKey>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> DesignerResult<WidgetKey> {
        let frame = ttk::Frame::new(self.parent_widget(parent)?)?;
        place_sized(&frame, x, y, width, height)?;
        self.adopt(parent, frame)
    }

    /// Titled frame (a group box)
    pub fn create_labelframe(
        &mut self,
        parent: Option<WidgetKey>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        text: &str,
    ) -> DesignerResult<WidgetKey> {
        let group = ttk::Labelframe::new(self.parent_widget(parent)?)?;
        group.text(text)?;
        place_sized(&group, x, y, width, height)?;
        self.adopt(parent, group)
    }

    pub fn create_notebook(
        &mut self,
        parent: Option<WidgetKey>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> DesignerResult<WidgetKey> {
        let notebook = ttk::Notebook::new(self.parent_widget(parent)?)?;
        place_sized(&notebook, x, y, width, height)?;
        self.adopt(parent, notebook)
    }

    /// Add a page to a notebook created with [`BaseForm::create_notebook`]
    pub fn create_tab(&mut self, notebook: WidgetKey, label: &str) -> DesignerResult<WidgetKey> {
        let host = self.parent_widget(Some(notebook))?;
        if host.class() != ttk::Notebook::COMMAND {
            return Err(DesignerError::Inconsistent(format!(
                "{} is a {}, not a notebook",
                host.name(),
                host.class()
            )));
        }
        let page = ttk::Frame::new(host)?;
        host.interp().evaluate(&format!(
            "{} add {} -text {}",
            host.name(),
            page.name(),
            tkbind::ArgValue::from(label).render()
        ))?;
        self.adopt(Some(notebook), page)
    }

    /// Multi-line text area; the size is given in pixels and converted to
    /// character cells
    pub fn create_text(
        &mut self,
        parent: Option<WidgetKey>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> DesignerResult<WidgetKey> {
        let text = classic::Text::new(self.parent_widget(parent)?)?;
        let cells: Options = options! { "width" => width / 10, "height" => height / 10 };
        text.config(&cells)?;
        place_at(&text, x, y)?;
        self.adopt(parent, text)
    }

    /// Destroy every widget on the form, keeping the window
    pub fn clear_widgets(&mut self) -> DesignerResult<()> {
        Ok(self.tree.clear()?)
    }
}
