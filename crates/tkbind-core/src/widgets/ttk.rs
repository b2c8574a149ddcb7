//! Themed (`ttk::`) widgets

use crate::error::TkResult;
use crate::value::{list_text, parse_double, parse_int, render_options, split_words, ArgValue, Options};
use crate::widget::Widget;

widget_type!(Frame, "ttk::frame", "frame");
widget_type!(Label, "ttk::label", "label");
widget_type!(Button, "ttk::button", "button");
widget_type!(Checkbutton, "ttk::checkbutton", "checkbutton");
widget_type!(Radiobutton, "ttk::radiobutton", "radiobutton");
widget_type!(Entry, "ttk::entry", "entry");
widget_type!(
    /// Entry with a drop-down list of values
    Combobox, "ttk::combobox", "combobox"
);
widget_type!(
    /// Tabbed container; each tab shows one child widget
    Notebook, "ttk::notebook", "notebook"
);
widget_type!(
    /// Hierarchical list with optional columns
    Treeview, "ttk::treeview", "treeview"
);
widget_type!(Labelframe, "ttk::labelframe", "labelframe");
widget_type!(Progressbar, "ttk::progressbar", "progressbar");
widget_type!(Separator, "ttk::separator", "separator");

option_setters!(Frame { padding => "padding": &str, width => "width": i64, height => "height": i64 });
option_setters!(Label { text => "text": &str, anchor => "anchor": &str, style => "style": &str });
option_setters!(Button { text => "text": &str, width => "width": i64, style => "style": &str });
option_setters!(Checkbutton { text => "text": &str });
option_setters!(Radiobutton { text => "text": &str, value => "value": &str });
option_setters!(Entry { state => "state": &str, width => "width": i64, show => "show": &str });
option_setters!(Combobox { state => "state": &str, width => "width": i64 });
option_setters!(Treeview { show => "show": &str, selectmode => "selectmode": &str, height => "height": i64 });
option_setters!(Labelframe { text => "text": &str, padding => "padding": &str });
option_setters!(Progressbar { mode => "mode": &str, maximum => "maximum": f64, length => "length": i64, orient => "orient": &str });
option_setters!(Separator { orient => "orient": &str });

var_setters!(Checkbutton { variable => "variable" });
var_setters!(Radiobutton { variable => "variable" });
var_setters!(Entry { textvariable => "textvariable" });
var_setters!(Combobox { textvariable => "textvariable" });
var_setters!(Progressbar { variable => "variable" });

command_setter!(Button, Checkbutton, Radiobutton);
entry_ops!(Entry, Combobox);

impl Button {
    pub fn invoke(&self) -> TkResult<String> {
        self.interp().evaluate(&format!("{} invoke", self.name()))
    }
}

impl Checkbutton {
    pub fn invoke(&self) -> TkResult<()> {
        self.interp().evaluate(&format!("{} invoke", self.name())).map(drop)
    }
}

impl Radiobutton {
    pub fn invoke(&self) -> TkResult<()> {
        self.interp().evaluate(&format!("{} invoke", self.name())).map(drop)
    }
}

impl Combobox {
    /// Replace the drop-down values
    pub fn values(&self, values: &[&str]) -> TkResult<&Self> {
        self.config_one("values", ArgValue::Str(list_text(values)))?;
        Ok(self)
    }

    /// Index of the current text among the values, `None` when it is not one of them
    pub fn current(&self) -> TkResult<Option<usize>> {
        let index = parse_int(&self.interp().evaluate(&format!("{} current", self.name()))?);
        Ok(usize::try_from(index).ok())
    }

    /// Show the value at `index`
    pub fn set_current(&self, index: usize) -> TkResult<&Self> {
        self.interp()
            .evaluate(&format!("{} current {index}", self.name()))?;
        Ok(self)
    }
}

impl Notebook {
    /// Append `child` as a new tab labelled `label`
    pub fn add_tab(&self, child: &Widget, label: &str) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} add {} -text {}",
            self.name(),
            child.name(),
            ArgValue::from(label).render()
        ))?;
        Ok(self)
    }

    pub fn select(&self, index: usize) -> TkResult<&Self> {
        self.interp()
            .evaluate(&format!("{} select {index}", self.name()))?;
        Ok(self)
    }

    /// Path of the selected tab's widget, empty when there are no tabs
    pub fn selected(&self) -> TkResult<String> {
        self.interp().evaluate(&format!("{} select", self.name()))
    }

    pub fn tabs(&self) -> TkResult<Vec<String>> {
        self.interp()
            .evaluate(&format!("{} tabs", self.name()))
            .map(|s| split_words(&s))
    }
}

impl Treeview {
    /// Insert an item under `parent` (`""` is the root) and return its id.
    ///
    /// `index` is a position or `end`; `iid` picks the id, otherwise one is
    /// generated.
    pub fn insert(&self, parent: &str, index: &str, iid: Option<&str>, options: &Options) -> TkResult<String> {
        let iid = iid
            .map(|id| format!(" -id {}", ArgValue::from(id).render()))
            .unwrap_or_default();
        self.interp().evaluate(&format!(
            "{} insert {} {}{iid}{}",
            self.name(),
            ArgValue::from(parent).render(),
            ArgValue::from(index).render(),
            render_options(options)
        ))
    }

    /// Delete items and everything below them
    pub fn delete(&self, items: &[&str]) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} delete {}",
            self.name(),
            ArgValue::Str(list_text(items)).render()
        ))?;
        Ok(self)
    }

    /// Configure an item, e.g. its `text` or `values`
    pub fn item(&self, iid: &str, options: &Options) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} item {}{}",
            self.name(),
            ArgValue::from(iid).render(),
            render_options(options)
        ))?;
        Ok(self)
    }

    pub fn heading(&self, column: &str, options: &Options) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} heading {}{}",
            self.name(),
            ArgValue::from(column).render(),
            render_options(options)
        ))?;
        Ok(self)
    }

    pub fn column(&self, column: &str, options: &Options) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} column {}{}",
            self.name(),
            ArgValue::from(column).render(),
            render_options(options)
        ))?;
        Ok(self)
    }

    /// Set the display columns
    pub fn columns(&self, columns: &[&str]) -> TkResult<&Self> {
        self.config_one("columns", ArgValue::Str(list_text(columns)))?;
        Ok(self)
    }

    pub fn children(&self, parent: &str) -> TkResult<Vec<String>> {
        self.interp()
            .evaluate(&format!("{} children {}", self.name(), ArgValue::from(parent).render()))
            .map(|s| split_words(&s))
    }

    pub fn selection(&self) -> TkResult<Vec<String>> {
        self.interp()
            .evaluate(&format!("{} selection", self.name()))
            .map(|s| split_words(&s))
    }

    fn change_selection(&self, op: &str, items: &[&str]) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} selection {op} {}",
            self.name(),
            ArgValue::Str(list_text(items)).render()
        ))?;
        Ok(self)
    }

    /// Make `items` the whole selection
    pub fn selection_set(&self, items: &[&str]) -> TkResult<&Self> {
        self.change_selection("set", items)
    }

    pub fn selection_add(&self, items: &[&str]) -> TkResult<&Self> {
        self.change_selection("add", items)
    }

    pub fn selection_remove(&self, items: &[&str]) -> TkResult<&Self> {
        self.change_selection("remove", items)
    }
}

impl Progressbar {
    pub fn value(&self, value: f64) -> TkResult<&Self> {
        self.config_one("value", value)?;
        Ok(self)
    }

    /// Current value; reads the linked variable when there is one
    pub fn get(&self) -> TkResult<f64> {
        let variable = self.cget("variable")?;
        let text = if variable.is_empty() {
            self.cget("value")?
        } else {
            self.interp().get_var_or_empty(&variable)
        };
        Ok(parse_double(&text))
    }

    /// Advance by `amount`, wrapping at the maximum
    pub fn step(&self, amount: f64) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} step {}",
            self.name(),
            ArgValue::from(amount).render()
        ))?;
        Ok(self)
    }

    /// Start the indeterminate animation, one step every `interval_ms`
    pub fn start(&self, interval_ms: u64) -> TkResult<&Self> {
        self.interp()
            .evaluate(&format!("{} start {interval_ms}", self.name()))?;
        Ok(self)
    }

    pub fn stop(&self) -> TkResult<&Self> {
        self.interp().evaluate(&format!("{} stop", self.name()))?;
        Ok(self)
    }
}
