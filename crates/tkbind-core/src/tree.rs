//! Owning arena of widgets
//!
//! [`WidgetTree`] keeps widgets in a slotmap, each node holding a non-owning
//! parent key and its ordered child keys. Destroying a node destroys the
//! runtime object once (the runtime takes its children with it) and drops
//! the whole native subtree together with the callbacks it registered.
//! Keys of removed widgets simply stop resolving.

use slotmap::{new_key_type, SlotMap};

use crate::error::{TkError, TkResult};
use crate::interp::Interp;
use crate::value::Options;
use crate::widget::Widget;

new_key_type! {
    /// Key of a widget stored in a [`WidgetTree`]
    pub struct WidgetKey;
}

#[derive(Debug)]
struct Node {
    widget: Widget,
    parent: Option<WidgetKey>,
    children: Vec<WidgetKey>,
}

/// Widgets created under one host window
#[derive(Debug)]
pub struct WidgetTree {
    interp: Interp,
    host: String,
    nodes: SlotMap<WidgetKey, Node>,
    roots: Vec<WidgetKey>,
}

impl WidgetTree {
    /// Create an empty tree whose top-level widgets live under `host`
    pub fn new(interp: &Interp, host: &str) -> Self {
        Self {
            interp: interp.clone(),
            host: host.to_string(),
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
        }
    }

    /// Runtime name of the host window
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Runtime name a new child of `parent` is created under
    pub fn parent_name(&self, parent: Option<WidgetKey>) -> TkResult<&str> {
        match parent {
            None => Ok(&self.host),
            Some(key) => self
                .nodes
                .get(key)
                .map(|node| node.widget.name())
                .ok_or(TkError::UnknownWidget),
        }
    }

    /// Create a widget under `parent` (or under the host window) and store it
    pub fn insert(
        &mut self,
        parent: Option<WidgetKey>,
        class: &str,
        tag: &str,
        options: &Options,
    ) -> TkResult<WidgetKey> {
        let widget = Widget::create(&self.interp, self.parent_name(parent)?, class, tag, options)?;
        self.adopt(parent, widget)
    }

    /// Store a widget that was created elsewhere under `parent`
    pub fn adopt(&mut self, parent: Option<WidgetKey>, widget: impl Into<Widget>) -> TkResult<WidgetKey> {
        if let Some(p) = parent {
            if !self.nodes.contains_key(p) {
                return Err(TkError::UnknownWidget);
            }
        }
        let key = self.nodes.insert(Node {
            widget: widget.into(),
            parent,
            children: Vec::new(),
        });
        match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(node) => node.children.push(key),
            None => self.roots.push(key),
        }
        Ok(key)
    }

    #[must_use]
    pub fn get(&self, key: WidgetKey) -> Option<&Widget> {
        self.nodes.get(key).map(|node| &node.widget)
    }

    #[must_use]
    pub fn contains(&self, key: WidgetKey) -> bool {
        self.nodes.contains_key(key)
    }

    #[must_use]
    pub fn parent(&self, key: WidgetKey) -> Option<WidgetKey> {
        self.nodes.get(key)?.parent
    }

    /// Child keys in insertion order; empty for unknown keys
    #[must_use]
    pub fn children(&self, key: WidgetKey) -> &[WidgetKey] {
        self.nodes.get(key).map_or(&[], |node| node.children.as_slice())
    }

    /// Keys of widgets created directly under the host window
    #[must_use]
    pub fn roots(&self) -> &[WidgetKey] {
        &self.roots
    }

    /// Find a widget by its runtime name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<WidgetKey> {
        self.nodes
            .iter()
            .find(|(_, node)| node.widget.name() == name)
            .map(|(key, _)| key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Destroy a widget and everything below it
    pub fn destroy(&mut self, key: WidgetKey) -> TkResult<()> {
        let Some(parent) = self.nodes.get(key).map(|node| node.parent) else {
            return Err(TkError::UnknownWidget);
        };
        match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(node) => node.children.retain(|k| *k != key),
            None => self.roots.retain(|k| *k != key),
        }

        let mut pending: Vec<WidgetKey> = self.children(key).to_vec();
        let Some(top) = self.nodes.remove(key) else {
            return Err(TkError::UnknownWidget);
        };
        // The runtime removes descendants itself; only their callbacks remain
        while let Some(k) = pending.pop() {
            if let Some(node) = self.nodes.remove(k) {
                pending.extend(node.children);
                node.widget.release_callbacks();
            }
        }
        top.widget.destroy()
    }

    /// Destroy every widget in the tree; reports the first failure
    pub fn clear(&mut self) -> TkResult<()> {
        let mut first_error = None;
        for key in self.roots.clone() {
            if let Err(err) = self.destroy(key) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for WidgetTree {
    fn drop(&mut self) {
        if let Err(err) = self.clear() {
            tracing::warn!(host = %self.host, error = %err, "failed to destroy widgets on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TkConfig;
    use crate::options;
    use crate::runtime::HeadlessRuntime;
    use std::rc::Rc;

    fn setup() -> (Rc<HeadlessRuntime>, Interp) {
        let runtime = Rc::new(HeadlessRuntime::new());
        let interp = Interp::new(runtime.clone(), TkConfig::default()).unwrap();
        (runtime, interp)
    }

    #[test]
    fn test_insert_builds_hierarchy() {
        let (rt, interp) = setup();
        let mut tree = WidgetTree::new(&interp, ".");
        let frame = tree.insert(None, "frame", "frame", &options! {}).unwrap();
        let a = tree.insert(Some(frame), "label", "label", &options! { "text" => "a" }).unwrap();
        let b = tree.insert(Some(frame), "label", "label", &options! { "text" => "b" }).unwrap();

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.roots(), &[frame]);
        assert_eq!(tree.children(frame), &[a, b]);
        assert_eq!(tree.parent(a), Some(frame));
        let frame_name = tree.get(frame).unwrap().name().to_string();
        assert_eq!(
            rt.children(&frame_name),
            vec![tree.get(a).unwrap().name().to_string(), tree.get(b).unwrap().name().to_string()]
        );
        assert_eq!(tree.find(&frame_name), Some(frame));
    }

    #[test]
    fn test_destroy_subtree() {
        let (rt, interp) = setup();
        let mut tree = WidgetTree::new(&interp, ".");
        let frame = tree.insert(None, "frame", "frame", &options! {}).unwrap();
        let button = tree.insert(Some(frame), "button", "button", &options! {}).unwrap();
        tree.get(button).unwrap().set_command(|| {}).unwrap();
        let other = tree.insert(None, "label", "label", &options! {}).unwrap();
        let frame_name = tree.get(frame).unwrap().name().to_string();
        assert_eq!(interp.callback_count(), 1);

        tree.destroy(frame).unwrap();
        assert!(tree.get(frame).is_none());
        assert!(tree.get(button).is_none());
        assert_eq!(tree.roots(), &[other]);
        assert_eq!(interp.callback_count(), 0);
        assert!(!rt.widget_exists(&frame_name));
        assert!(matches!(tree.destroy(frame), Err(TkError::UnknownWidget)));
    }

    #[test]
    fn test_unknown_parent() {
        let (_rt, interp) = setup();
        let mut tree = WidgetTree::new(&interp, ".");
        let frame = tree.insert(None, "frame", "frame", &options! {}).unwrap();
        tree.destroy(frame).unwrap();
        assert!(matches!(
            tree.insert(Some(frame), "label", "label", &options! {}),
            Err(TkError::UnknownWidget)
        ));
    }

    #[test]
    fn test_clear_and_drop() {
        let (rt, interp) = setup();
        let mut tree = WidgetTree::new(&interp, ".");
        tree.insert(None, "frame", "frame", &options! {}).unwrap();
        tree.insert(None, "frame", "frame", &options! {}).unwrap();
        tree.clear().unwrap();
        assert!(tree.is_empty());
        assert!(rt.children(".").is_empty());

        let key = tree.insert(None, "label", "label", &options! {}).unwrap();
        let name = tree.get(key).unwrap().name().to_string();
        drop(tree);
        assert!(!rt.widget_exists(&name));
    }
}
