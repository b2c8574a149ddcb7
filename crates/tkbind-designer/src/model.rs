//! Form and widget model
//!
//! A form is a flat map of widget entries plus the ordered list of entries
//! placed directly on the form. Every entry names its parent: either the
//! form itself (by the form's `name`) or another entry, whose `children`
//! list it appears in.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{DesignerError, DesignerResult};

const DEFAULT_FORM_WIDTH: i32 = 800;
const DEFAULT_FORM_HEIGHT: i32 = 600;

fn default_id_counter() -> u32 {
    1
}

/// One widget placed on a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetModel {
    /// Unique id within the form (`Label1`, `Frame2`, ...)
    pub id: String,
    /// Widget type name, see [`crate::palette::WIDGET_TYPES`]
    #[serde(rename = "type")]
    pub kind: String,
    /// Id of the parent entry, or the form name for top-level entries
    pub parent_id: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Widget options such as `text`
    #[serde(default)]
    pub props: BTreeMap<String, String>,
    /// Event name to handler name
    #[serde(default)]
    pub events: BTreeMap<String, String>,
    /// Child entry ids in creation order
    #[serde(default)]
    pub children: Vec<String>,
}

impl WidgetModel {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            parent_id: parent_id.into(),
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            props: BTreeMap::new(),
            events: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    #[must_use]
    pub fn sized(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Property value, empty when unset
    pub fn prop(&self, key: &str) -> &str {
        self.props.get(key).map_or("", String::as_str)
    }
}

/// A designed form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormModel {
    /// Form name (`Form1`); top-level entries use it as their parent id
    pub name: String,
    /// Window title
    pub caption: String,
    pub width: i32,
    pub height: i32,
    /// Ids of entries placed directly on the form, in creation order
    #[serde(default)]
    pub root_widgets: Vec<String>,
    /// Every entry, keyed by id
    #[serde(default)]
    pub widgets: BTreeMap<String, WidgetModel>,
    /// Next number handed out by [`FormModel::generate_id`]
    #[serde(default = "default_id_counter")]
    pub id_counter: u32,
}

impl FormModel {
    pub fn new(name: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            caption: caption.into(),
            width: DEFAULT_FORM_WIDTH,
            height: DEFAULT_FORM_HEIGHT,
            root_widgets: Vec::new(),
            widgets: BTreeMap::new(),
            id_counter: default_id_counter(),
        }
    }

    /// Allocate a new id from the form-wide counter: `Label1`, `Button2`, ...
    pub fn generate_id(&mut self, base: &str) -> String {
        let id = format!("{base}{}", self.id_counter);
        self.id_counter += 1;
        id
    }

    pub fn widget(&self, id: &str) -> Option<&WidgetModel> {
        self.widgets.get(id)
    }

    pub fn widget_mut(&mut self, id: &str) -> Option<&mut WidgetModel> {
        self.widgets.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Add an entry under its parent. The entry's own `children` must be empty.
    pub fn add_widget(&mut self, widget: WidgetModel) -> DesignerResult<()> {
        if self.widgets.contains_key(&widget.id) || widget.id == self.name {
            return Err(DesignerError::DuplicateId(widget.id));
        }
        if !widget.children.is_empty() {
            return Err(DesignerError::Inconsistent(format!(
                "new widget '{}' already lists children",
                widget.id
            )));
        }

        if widget.parent_id == self.name {
            self.root_widgets.push(widget.id.clone());
        } else {
            let parent = self
                .widgets
                .get_mut(&widget.parent_id)
                .ok_or_else(|| DesignerError::MissingParent {
                    id: widget.id.clone(),
                    parent: widget.parent_id.clone(),
                })?;
            parent.children.push(widget.id.clone());
        }
        tracing::debug!(id = %widget.id, kind = %widget.kind, parent = %widget.parent_id, "widget added");
        self.widgets.insert(widget.id.clone(), widget);
        Ok(())
    }

    /// Remove an entry and everything below it; returns the removed ids,
    /// parents before children
    pub fn remove_widget(&mut self, id: &str) -> DesignerResult<Vec<String>> {
        let parent_id = self
            .widgets
            .get(id)
            .map(|w| w.parent_id.clone())
            .ok_or_else(|| DesignerError::UnknownWidget(id.to_string()))?;

        if parent_id == self.name {
            self.root_widgets.retain(|r| r != id);
        } else if let Some(parent) = self.widgets.get_mut(&parent_id) {
            parent.children.retain(|c| c != id);
        }

        let mut removed = Vec::new();
        let mut pending = vec![id.to_string()];
        while let Some(next) = pending.pop() {
            if let Some(widget) = self.widgets.remove(&next) {
                pending.extend(widget.children.into_iter().rev());
                removed.push(next);
            }
        }
        tracing::debug!(id, count = removed.len(), "widget removed");
        Ok(removed)
    }

    /// Shift an entry by a delta
    pub fn move_widget(&mut self, id: &str, dx: i32, dy: i32) -> DesignerResult<()> {
        let widget = self
            .widgets
            .get_mut(id)
            .ok_or_else(|| DesignerError::UnknownWidget(id.to_string()))?;
        widget.x += dx;
        widget.y += dy;
        Ok(())
    }

    /// Entry ids in depth-first creation order
    pub fn walk(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.widgets.len());
        let mut pending: Vec<&str> = self.root_widgets.iter().rev().map(String::as_str).collect();
        while let Some(id) = pending.pop() {
            out.push(id);
            if let Some(widget) = self.widgets.get(id) {
                pending.extend(widget.children.iter().rev().map(String::as_str));
            }
        }
        out
    }

    /// Check the structural invariants: parents resolve, every entry is
    /// listed exactly once under its parent, and everything is reachable
    /// from the form
    pub fn validate(&self) -> DesignerResult<()> {
        let mut listed: HashMap<&str, usize> = HashMap::new();
        for id in &self.root_widgets {
            *listed.entry(id).or_default() += 1;
        }
        for widget in self.widgets.values() {
            for child in &widget.children {
                *listed.entry(child).or_default() += 1;
            }
        }

        for (key, widget) in &self.widgets {
            if *key != widget.id {
                return Err(DesignerError::Inconsistent(format!(
                    "entry '{key}' carries id '{}'",
                    widget.id
                )));
            }
            if widget.parent_id == self.name {
                if !self.root_widgets.contains(&widget.id) {
                    return Err(DesignerError::Inconsistent(format!(
                        "'{}' is a form child but not in root_widgets",
                        widget.id
                    )));
                }
            } else {
                let parent = self
                    .widgets
                    .get(&widget.parent_id)
                    .ok_or_else(|| DesignerError::MissingParent {
                        id: widget.id.clone(),
                        parent: widget.parent_id.clone(),
                    })?;
                if !parent.children.contains(&widget.id) {
                    return Err(DesignerError::Inconsistent(format!(
                        "'{}' is missing from the children of '{}'",
                        widget.id, parent.id
                    )));
                }
            }
            if let Some(n) = listed.get(widget.id.as_str()).filter(|n| **n > 1) {
                return Err(DesignerError::Inconsistent(format!(
                    "'{}' is listed {n} times",
                    widget.id
                )));
            }
        }

        if let Some(ghost) = listed.keys().find(|id| !self.widgets.contains_key(**id)) {
            return Err(DesignerError::Inconsistent(format!("'{ghost}' is listed but not defined")));
        }

        // Parent cycles pass the checks above but are not reachable from the form
        let reachable = self.walk().len();
        if reachable != self.widgets.len() {
            return Err(DesignerError::Inconsistent(format!(
                "{} widgets are not reachable from the form",
                self.widgets.len() - reachable
            )));
        }
        Ok(())
    }
}
