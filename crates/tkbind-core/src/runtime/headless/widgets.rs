//! Widget state kept by the headless runtime
//!
//! Paths follow the toolkit convention: `.` is the root window, and a child
//! path is its parent's path plus `.leaf` (the root's children are `.leaf`).

use std::collections::{BTreeMap, HashMap};

/// Creation commands and the widget class each one produces
const CLASSES: &[(&str, &str)] = &[
    ("button", "Button"),
    ("canvas", "Canvas"),
    ("checkbutton", "Checkbutton"),
    ("entry", "Entry"),
    ("frame", "Frame"),
    ("label", "Label"),
    ("labelframe", "Labelframe"),
    ("listbox", "Listbox"),
    ("menu", "Menu"),
    ("menubutton", "Menubutton"),
    ("message", "Message"),
    ("panedwindow", "Panedwindow"),
    ("radiobutton", "Radiobutton"),
    ("scale", "Scale"),
    ("scrollbar", "Scrollbar"),
    ("spinbox", "Spinbox"),
    ("text", "Text"),
    ("toplevel", "Toplevel"),
    ("ttk::button", "TButton"),
    ("ttk::checkbutton", "TCheckbutton"),
    ("ttk::combobox", "TCombobox"),
    ("ttk::entry", "TEntry"),
    ("ttk::frame", "TFrame"),
    ("ttk::label", "TLabel"),
    ("ttk::labelframe", "TLabelframe"),
    ("ttk::notebook", "TNotebook"),
    ("ttk::panedwindow", "TPanedwindow"),
    ("ttk::progressbar", "TProgressbar"),
    ("ttk::radiobutton", "TRadiobutton"),
    ("ttk::scale", "TScale"),
    ("ttk::scrollbar", "TScrollbar"),
    ("ttk::separator", "TSeparator"),
    ("ttk::sizegrip", "TSizegrip"),
    ("ttk::spinbox", "TSpinbox"),
    ("ttk::treeview", "Treeview"),
];

/// Values reported by `cget` for options never configured
const DEFAULT_OPTIONS: &[(&str, &str)] = &[
    ("activebackground", "#ececec"),
    ("anchor", "center"),
    ("background", "#d9d9d9"),
    ("bg", "#d9d9d9"),
    ("borderwidth", "0"),
    ("command", ""),
    ("compound", "none"),
    ("cursor", ""),
    ("fg", "#000000"),
    ("font", "TkDefaultFont"),
    ("foreground", "#000000"),
    ("from", "0"),
    ("height", "0"),
    ("image", ""),
    ("justify", "left"),
    ("label", ""),
    ("length", "100"),
    ("maximum", "100"),
    ("mode", "determinate"),
    ("offvalue", "0"),
    ("onvalue", "1"),
    ("orient", "horizontal"),
    ("padding", ""),
    ("padx", "0"),
    ("pady", "0"),
    ("relief", "flat"),
    ("resolution", "1"),
    ("show", ""),
    ("state", "normal"),
    ("style", ""),
    ("takefocus", ""),
    ("text", ""),
    ("textvariable", ""),
    ("to", "100"),
    ("underline", "-1"),
    ("value", ""),
    ("values", ""),
    ("variable", ""),
    ("width", "0"),
    ("wrap", "char"),
    ("wraplength", "0"),
];

/// Class produced by a creation command
pub(super) fn class_for_command(command: &str) -> Option<&'static str> {
    CLASSES
        .iter()
        .find(|(cmd, _)| *cmd == command)
        .map(|(_, class)| *class)
}

/// Default value of an option that was never configured
pub(super) fn default_option(option: &str) -> Option<&'static str> {
    DEFAULT_OPTIONS
        .iter()
        .find(|(name, _)| *name == option)
        .map(|(_, value)| *value)
}

/// Parse `-name value` pairs; names are returned without the dash
pub(super) fn parse_option_pairs(args: &[String]) -> Result<Vec<(String, String)>, String> {
    if args.len() % 2 != 0 {
        let last = args.last().map_or("", String::as_str);
        return Err(format!("value for \"{last}\" missing"));
    }
    args.chunks(2)
        .map(|pair| match pair[0].strip_prefix('-') {
            Some(name) if !name.is_empty() => Ok((name.to_string(), pair[1].clone())),
            _ => Err(format!("bad option \"{}\": must be -option value", pair[0])),
        })
        .collect()
}

/// Parent path of a widget path
pub(super) fn parent_path(path: &str) -> Option<&str> {
    if path == "." {
        return None;
    }
    match path.rfind('.') {
        Some(0) => Some("."),
        Some(i) => Some(&path[..i]),
        None => None,
    }
}

fn leaf_name(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Whether a class is one of the text-entry family that holds a single line
pub(super) fn is_entry_class(class: &str) -> bool {
    matches!(class, "Entry" | "TEntry" | "TCombobox" | "Spinbox" | "TSpinbox")
}

/// Whether a class is a top-level window
pub(super) fn is_toplevel_class(class: &str) -> bool {
    matches!(class, "Tk" | "Toplevel")
}

/// State of one live widget
#[derive(Debug, Clone, Default)]
pub(super) struct WidgetState {
    pub class: String,
    /// Configured options, keyed without the leading dash
    pub options: BTreeMap<String, String>,
    /// Geometry manager currently managing the widget
    pub manager: Option<String>,
    /// Options given to the geometry manager
    pub layout: BTreeMap<String, String>,
    /// Text held by entry-family and text widgets without a text variable
    pub content: String,
    /// Listbox rows, canvas item ids, notebook tabs, tree items, menu entries
    pub items: Vec<String>,
    /// Tree item parents, keyed by item id
    pub item_parents: BTreeMap<String, String>,
    /// Menu entry commands, parallel to `items`
    pub item_commands: Vec<String>,
    /// Selected tree items
    pub selection: Vec<String>,
    pub next_item: u64,
    /// Window-manager state of top-level windows
    pub wm: BTreeMap<String, String>,
    /// Window-manager protocol handlers
    pub protocols: BTreeMap<String, String>,
    /// Grid row/column weights and sizes, keyed by `row N` / `column N`
    pub grid_config: BTreeMap<String, BTreeMap<String, String>>,
    seq: u64,
}

impl WidgetState {
    /// Option value as configured, falling back to the class-independent default
    pub fn option(&self, name: &str) -> Option<String> {
        self.options
            .get(name)
            .cloned()
            .or_else(|| default_option(name).map(str::to_string))
    }

    /// Configured option value, `None` when unset or empty
    pub fn configured(&self, name: &str) -> Option<&str> {
        self.options
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// All live widgets of one runtime
#[derive(Debug)]
pub(super) struct WidgetStore {
    widgets: HashMap<String, WidgetState>,
    next_seq: u64,
}

impl WidgetStore {
    pub fn new(root_title: &str) -> Self {
        let mut root = WidgetState {
            class: "Tk".to_string(),
            ..WidgetState::default()
        };
        root.wm.insert("title".into(), root_title.to_string());
        root.wm.insert("state".into(), "normal".into());

        let mut widgets = HashMap::new();
        widgets.insert(".".to_string(), root);
        Self { widgets, next_seq: 1 }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.widgets.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&WidgetState> {
        self.widgets.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut WidgetState> {
        self.widgets.get_mut(path)
    }

    /// Look up a widget, with the toolkit's diagnostic when it does not exist
    pub fn require(&self, path: &str) -> Result<&WidgetState, String> {
        self.widgets
            .get(path)
            .ok_or_else(|| format!("bad window path name \"{path}\""))
    }

    pub fn require_mut(&mut self, path: &str) -> Result<&mut WidgetState, String> {
        self.widgets
            .get_mut(path)
            .ok_or_else(|| format!("bad window path name \"{path}\""))
    }

    pub fn create(
        &mut self,
        path: &str,
        class: &str,
        options: Vec<(String, String)>,
    ) -> Result<(), String> {
        let bad_path = || format!("bad window path name \"{path}\"");
        if !path.starts_with('.') || path.len() < 2 || path.ends_with('.') || path.contains("..") {
            return Err(bad_path());
        }
        let parent = parent_path(path).ok_or_else(bad_path)?;
        if !self.widgets.contains_key(parent) {
            return Err(bad_path());
        }
        if self.widgets.contains_key(path) {
            return Err(format!(
                "window name \"{}\" already exists in parent",
                leaf_name(path)
            ));
        }

        let mut state = WidgetState {
            class: class.to_string(),
            options: options.into_iter().collect(),
            seq: self.next_seq,
            ..WidgetState::default()
        };
        self.next_seq += 1;
        if is_toplevel_class(class) {
            state.wm.insert("title".into(), leaf_name(path).to_string());
            state.wm.insert("state".into(), "normal".into());
        }
        self.widgets.insert(path.to_string(), state);
        Ok(())
    }

    /// Direct children in creation order
    pub fn children(&self, path: &str) -> Vec<String> {
        let mut children: Vec<(&String, u64)> = self
            .widgets
            .iter()
            .filter(|(child, _)| parent_path(child) == Some(path))
            .map(|(child, state)| (child, state.seq))
            .collect();
        children.sort_by_key(|(_, seq)| *seq);
        children.into_iter().map(|(child, _)| child.clone()).collect()
    }

    /// Remove a widget and all of its descendants; returns the removed paths
    pub fn remove_tree(&mut self, path: &str) -> Vec<String> {
        if !self.widgets.contains_key(path) {
            return Vec::new();
        }
        let removed: Vec<String> = if path == "." {
            self.widgets.keys().cloned().collect()
        } else {
            let prefix = format!("{path}.");
            self.widgets
                .keys()
                .filter(|p| p.as_str() == path || p.starts_with(&prefix))
                .cloned()
                .collect()
        };
        for p in &removed {
            self.widgets.remove(p);
        }
        removed
    }

    /// The top-level window containing a widget
    pub fn toplevel_of(&self, path: &str) -> String {
        let mut current = path;
        loop {
            if let Some(state) = self.widgets.get(current) {
                if is_toplevel_class(&state.class) {
                    return current.to_string();
                }
            }
            match parent_path(current) {
                Some(parent) => current = parent,
                None => return ".".to_string(),
            }
        }
    }

    /// Require that a path names a top-level window
    pub fn require_toplevel_mut(&mut self, path: &str) -> Result<&mut WidgetState, String> {
        let state = self.require_mut(path)?;
        if is_toplevel_class(&state.class) {
            Ok(state)
        } else {
            Err(format!("window \"{path}\" isn't a top-level window"))
        }
    }
}

/// Parse `WxH`, `+X+Y` or `WxH+X+Y`
pub(super) fn parse_geometry(spec: &str) -> (Option<(i64, i64)>, Option<(i64, i64)>) {
    let (size_part, pos_part) = match spec.find(['+', '-']) {
        Some(i) => (&spec[..i], &spec[i..]),
        None => (spec, ""),
    };

    let size = size_part
        .split_once('x')
        .and_then(|(w, h)| Some((w.parse().ok()?, h.parse().ok()?)));

    let position = parse_offsets(pos_part);
    (size, position)
}

fn parse_offsets(s: &str) -> Option<(i64, i64)> {
    if s.is_empty() {
        return None;
    }
    let split = s[1..].find(['+', '-'])? + 1;
    let x = s[..split].trim_start_matches('+').parse().ok()?;
    let y = s[split..].trim_start_matches('+').parse().ok()?;
    Some((x, y))
}

/// Map a position index (`end`, `insert` or a number) into `0..=len`
pub(super) fn entry_index(index: &str, len: usize) -> Result<usize, String> {
    match index {
        "end" | "insert" => Ok(len),
        _ => index
            .parse::<i64>()
            .map(|i| usize::try_from(i.max(0)).unwrap_or(0).min(len))
            .map_err(|_| format!("bad entry index \"{index}\"")),
    }
}

/// Map a `line.char` text index into a character offset
pub(super) fn text_index(content: &str, index: &str) -> Result<usize, String> {
    let chars: Vec<char> = content.chars().collect();
    if index.starts_with("end") || index == "insert" {
        return Ok(chars.len());
    }
    let bad = || format!("bad text index \"{index}\"");
    let (line, column) = index.split_once('.').ok_or_else(bad)?;
    let line: usize = line.parse().map_err(|_| bad())?;

    let mut offset = 0;
    for (n, text) in content.split('\n').enumerate() {
        let len = text.chars().count();
        if n + 1 == line.max(1) {
            let col = if column == "end" {
                len
            } else {
                column.parse::<usize>().map_err(|_| bad())?.min(len)
            };
            return Ok(offset + col);
        }
        offset += len + 1;
    }
    Ok(chars.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parent_path() {
        assert_eq!(parent_path("."), None);
        assert_eq!(parent_path(".f1"), Some("."));
        assert_eq!(parent_path(".f1.b2"), Some(".f1"));
    }

    #[test]
    fn test_create_validates_paths() {
        let mut store = WidgetStore::new("tk");
        store.create(".f1", "Frame", opts(&[])).unwrap();
        store.create(".f1.b2", "Button", opts(&[("text", "Go")])).unwrap();

        assert!(store.create(".f1", "Frame", opts(&[])).unwrap_err().contains("already exists"));
        assert!(store.create(".missing.b", "Button", opts(&[])).unwrap_err().contains("bad window path"));
        assert!(store.create("noDot", "Button", opts(&[])).is_err());
        assert_eq!(store.get(".f1.b2").unwrap().option("text").as_deref(), Some("Go"));
    }

    #[test]
    fn test_children_in_creation_order_and_remove() {
        let mut store = WidgetStore::new("tk");
        store.create(".z", "Frame", opts(&[])).unwrap();
        store.create(".a", "Frame", opts(&[])).unwrap();
        store.create(".z.inner", "Label", opts(&[])).unwrap();
        assert_eq!(store.children("."), vec![".z", ".a"]);

        let mut removed = store.remove_tree(".z");
        removed.sort();
        assert_eq!(removed, vec![".z", ".z.inner"]);
        assert!(store.contains(".a"));
        assert!(store.remove_tree(".z").is_empty());
    }

    #[test]
    fn test_toplevel_of() {
        let mut store = WidgetStore::new("tk");
        store.create(".t", "Toplevel", opts(&[])).unwrap();
        store.create(".t.f", "Frame", opts(&[])).unwrap();
        store.create(".b", "Button", opts(&[])).unwrap();
        assert_eq!(store.toplevel_of(".t.f"), ".t");
        assert_eq!(store.toplevel_of(".b"), ".");
        assert!(store.require_toplevel_mut(".b").is_err());
    }

    #[test]
    fn test_parse_option_pairs() {
        let args: Vec<String> = ["-text", "hi", "-width", "3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(parse_option_pairs(&args).unwrap().len(), 2);
        assert!(parse_option_pairs(&args[..3]).is_err());
        assert!(parse_option_pairs(&["text".to_string(), "hi".to_string()]).is_err());
    }

    #[test]
    fn test_parse_geometry() {
        assert_eq!(parse_geometry("300x200+10+20"), (Some((300, 200)), Some((10, 20))));
        assert_eq!(parse_geometry("640x480"), (Some((640, 480)), None));
        assert_eq!(parse_geometry("+5-7"), (None, Some((5, -7))));
        assert_eq!(parse_geometry(""), (None, None));
    }

    #[test]
    fn test_indices() {
        assert_eq!(entry_index("end", 5).unwrap(), 5);
        assert_eq!(entry_index("2", 5).unwrap(), 2);
        assert_eq!(entry_index("99", 5).unwrap(), 5);
        assert!(entry_index("nope", 5).is_err());

        let text = "ab\ncde";
        assert_eq!(text_index(text, "1.0").unwrap(), 0);
        assert_eq!(text_index(text, "2.1").unwrap(), 4);
        assert_eq!(text_index(text, "1.end").unwrap(), 2);
        assert_eq!(text_index(text, "end").unwrap(), 6);
    }
}
