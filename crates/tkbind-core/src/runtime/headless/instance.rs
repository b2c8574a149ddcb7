//! Widget creation and per-widget subcommands

use super::builtins::wrong_args;
use super::parser::{join_list, quote_word};
use super::widgets::{entry_index, is_entry_class, parse_option_pairs, text_index, WidgetState};
use super::HeadlessRuntime;
use crate::value::{parse_double, split_words};

fn is_check(class: &str) -> bool {
    matches!(class, "Checkbutton" | "TCheckbutton")
}

fn is_radio(class: &str) -> bool {
    matches!(class, "Radiobutton" | "TRadiobutton")
}

fn is_scale(class: &str) -> bool {
    matches!(class, "Scale" | "TScale")
}

fn is_spinbox(class: &str) -> bool {
    matches!(class, "Spinbox" | "TSpinbox")
}

/// Drop the fractional part of whole numbers, the way the toolkit prints them
fn number_text(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

fn splice(content: &str, start: usize, end: usize, insert: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let end = end.clamp(start, chars.len());
    let mut out: String = chars[..start].iter().collect();
    out.push_str(insert);
    out.extend(&chars[end..]);
    out
}

/// Resolve a list index (`end` or a number) against a length
fn list_index(index: &str, len: usize) -> Result<usize, String> {
    if index == "end" {
        return Ok(len);
    }
    index
        .parse::<i64>()
        .map(|i| usize::try_from(i.max(0)).unwrap_or(0))
        .map_err(|_| format!("bad listbox index \"{index}\": must be active, anchor, end, @x,y, or a number"))
}

impl HeadlessRuntime {
    pub(super) fn create_widget(
        &self,
        command: &str,
        class: &str,
        args: &[String],
    ) -> Result<String, String> {
        let Some((path, options)) = args.split_first() else {
            return Err(wrong_args(&format!("{command} pathName ?-option value ...?")));
        };
        let options = parse_option_pairs(options)?;
        self.widgets.borrow_mut().create(path, class, options)?;
        tracing::trace!(command, path = %path, "widget created");
        Ok(path.clone())
    }

    pub(super) fn widget_command(&self, path: &str, args: &[String]) -> Result<String, String> {
        let Some((sub, rest)) = args.split_first() else {
            return Err(wrong_args(&format!("{path} option ?arg ...?")));
        };
        let class = self.widgets.borrow().require(path)?.class.clone();

        match sub.as_str() {
            "configure" | "config" => self.configure(path, rest),
            "cget" => match rest {
                [option] => self.cget(path, option),
                _ => Err(wrong_args(&format!("{path} cget option"))),
            },
            "invoke" => self.invoke_widget(path, &class, rest),
            "select" | "deselect" | "toggle" if is_check(&class) || is_radio(&class) => {
                self.select(path, &class, sub)
            }
            "select" if class == "TNotebook" => self.notebook_select(path, rest),
            "insert" => self.widget_insert(path, &class, rest),
            "delete" => self.widget_delete(path, &class, rest),
            "get" => self.widget_get(path, &class, rest),
            "index" => self.widget_index(path, &class, rest),
            "set" => self.widget_set(path, &class, rest),
            "current" if class == "TCombobox" => self.combobox_current(path, rest),
            "create" if class == "Canvas" => Ok(self.next_item_id(path, false)),
            "selection" if class == "Treeview" => self.tree_selection(path, rest),
            "add" => self.widget_add(path, &class, rest),
            "step" if class == "TProgressbar" => self.progress_step(path, rest),
            "size" | "tabs" | "find" | "children" | "panes" => self.list_items(path, &class, sub, rest),
            _ => Ok(String::new()),
        }
    }

    fn with_state<T>(&self, path: &str, f: impl FnOnce(&WidgetState) -> T) -> Result<T, String> {
        let widgets = self.widgets.borrow();
        widgets.require(path).map(f)
    }

    fn with_state_mut<T>(
        &self,
        path: &str,
        f: impl FnOnce(&mut WidgetState) -> T,
    ) -> Result<T, String> {
        let mut widgets = self.widgets.borrow_mut();
        widgets.require_mut(path).map(f)
    }

    // ------------------------------------------------------------------
    // Options
    // ------------------------------------------------------------------

    fn configure(&self, path: &str, args: &[String]) -> Result<String, String> {
        match args {
            [] => self.with_state(path, |state| {
                state
                    .options
                    .iter()
                    .map(|(k, v)| format!("-{k} {}", quote_word(v)))
                    .collect::<Vec<_>>()
                    .join(" ")
            }),
            [option] => self.cget(path, option),
            _ => {
                let pairs = parse_option_pairs(args)?;
                self.with_state_mut(path, |state| state.options.extend(pairs))?;
                Ok(String::new())
            }
        }
    }

    fn cget(&self, path: &str, option: &str) -> Result<String, String> {
        let name = option.trim_start_matches('-');
        self.with_state(path, |state| state.option(name))?
            .ok_or_else(|| format!("unknown option \"{option}\""))
    }

    fn configured(&self, path: &str, option: &str) -> Option<String> {
        self.with_state(path, |state| state.configured(option).map(str::to_string))
            .ok()
            .flatten()
    }

    fn option_or_default(&self, path: &str, option: &str) -> String {
        self.with_state(path, |state| state.option(option))
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    fn is_disabled(&self, path: &str) -> bool {
        self.option_or_default(path, "state") == "disabled"
    }

    /// Run a widget's `-command`, with optional extra argument words
    fn run_command(&self, path: &str, extra: &[&str]) -> Result<String, String> {
        let Some(command) = self.configured(path, "command") else {
            return Ok(String::new());
        };
        let mut script = command;
        for word in extra {
            script.push(' ');
            script.push_str(&quote_word(word));
        }
        self.eval_script(&script)
    }

    // ------------------------------------------------------------------
    // Buttons
    // ------------------------------------------------------------------

    fn invoke_widget(&self, path: &str, class: &str, args: &[String]) -> Result<String, String> {
        if self.is_disabled(path) {
            return Ok(String::new());
        }
        if is_check(class) {
            self.select(path, class, "toggle")?;
        } else if is_radio(class) {
            self.select(path, class, "select")?;
        } else if is_spinbox(class) {
            let step = match args.first().map(String::as_str) {
                Some("buttondown") => -1.0,
                _ => 1.0,
            };
            self.spin(path, step)?;
        } else if class == "Menu" {
            let [index] = args else {
                return Err(wrong_args(&format!("{path} invoke index")));
            };
            return self.invoke_menu_entry(path, index);
        }
        self.run_command(path, &[])
    }

    fn select(&self, path: &str, class: &str, action: &str) -> Result<String, String> {
        let Some(variable) = self.configured(path, "variable") else {
            return Ok(String::new());
        };
        let current = self.read_var(&variable).unwrap_or_default();

        let new_value = if is_check(class) {
            let on = self.option_or_default(path, "onvalue");
            let off = self.option_or_default(path, "offvalue");
            match action {
                "select" => on,
                "deselect" => off,
                _ if current == on => off,
                _ => on,
            }
        } else {
            let value = self.option_or_default(path, "value");
            match action {
                "deselect" if current == value => String::new(),
                "deselect" => return Ok(String::new()),
                _ => value,
            }
        };
        self.write_var(&variable, &new_value);
        Ok(String::new())
    }

    fn spin(&self, path: &str, direction: f64) -> Result<(), String> {
        let from = parse_double(&self.option_or_default(path, "from"));
        let to = parse_double(&self.option_or_default(path, "to"));
        let increment = match self.configured(path, "increment") {
            Some(v) => parse_double(&v),
            None => 1.0,
        };
        let current = parse_double(&self.content(path));
        let next = (current + direction * increment).clamp(from.min(to), from.max(to));
        self.set_content(path, &number_text(next));
        Ok(())
    }

    fn invoke_menu_entry(&self, path: &str, index: &str) -> Result<String, String> {
        let command = self.with_state(path, |state| {
            let position = match index {
                "end" | "last" => state.item_commands.len().checked_sub(1),
                _ => index.parse::<usize>().ok(),
            };
            position.and_then(|i| state.item_commands.get(i).cloned())
        })?;
        match command {
            Some(script) if !script.is_empty() => self.eval_script(&script),
            _ => Ok(String::new()),
        }
    }

    // ------------------------------------------------------------------
    // Text content
    // ------------------------------------------------------------------

    /// Current text of an entry-family or text widget
    fn content(&self, path: &str) -> String {
        match self.configured(path, "textvariable") {
            Some(variable) => self.read_var(&variable).unwrap_or_default(),
            None => self
                .with_state(path, |state| state.content.clone())
                .unwrap_or_default(),
        }
    }

    /// Replace the text of a widget, writing through its text variable
    fn set_content(&self, path: &str, value: &str) {
        match self.configured(path, "textvariable") {
            Some(variable) => self.write_var(&variable, value),
            None => {
                let _ = self.with_state_mut(path, |state| state.content = value.to_string());
            }
        }
    }

    fn text_position(&self, class: &str, content: &str, index: &str) -> Result<usize, String> {
        if class == "Text" {
            text_index(content, index)
        } else {
            entry_index(index, content.chars().count())
        }
    }

    fn widget_insert(&self, path: &str, class: &str, args: &[String]) -> Result<String, String> {
        if is_entry_class(class) || class == "Text" {
            let [index, text @ ..] = args else {
                return Err(wrong_args(&format!("{path} insert index text")));
            };
            if text.is_empty() {
                return Err(wrong_args(&format!("{path} insert index text")));
            }
            if self.is_disabled(path) {
                return Ok(String::new());
            }
            // Text widgets take `chars ?tagList chars ...?`
            let inserted: String = text.iter().step_by(2).map(String::as_str).collect();
            let content = self.content(path);
            let at = self.text_position(class, &content, index)?;
            self.set_content(path, &splice(&content, at, at, &inserted));
            return Ok(String::new());
        }

        match class {
            "Listbox" => {
                let [index, items @ ..] = args else {
                    return Err(wrong_args(&format!("{path} insert index ?element ...?")));
                };
                self.with_state_mut(path, |state| -> Result<(), String> {
                    let at = list_index(index, state.items.len())?.min(state.items.len());
                    for (offset, item) in items.iter().enumerate() {
                        state.items.insert(at + offset, item.clone());
                    }
                    Ok(())
                })??;
                Ok(String::new())
            }
            "Treeview" => self.tree_insert(path, args),
            "Menu" => self.widget_add(path, class, args.get(1..).unwrap_or(&[])),
            _ => Ok(String::new()),
        }
    }

    fn widget_delete(&self, path: &str, class: &str, args: &[String]) -> Result<String, String> {
        if is_entry_class(class) || class == "Text" {
            let (first, last) = match args {
                [first] => (first, None),
                [first, last] => (first, Some(last)),
                _ => return Err(wrong_args(&format!("{path} delete firstIndex ?lastIndex?"))),
            };
            if self.is_disabled(path) {
                return Ok(String::new());
            }
            let content = self.content(path);
            let start = self.text_position(class, &content, first)?;
            let end = match last {
                Some(last) => self.text_position(class, &content, last)?,
                None => start + 1,
            };
            let remaining = splice(&content, start, end, "");
            if remaining != content {
                self.set_content(path, &remaining);
            }
            return Ok(String::new());
        }

        match class {
            "Listbox" | "Menu" => {
                let (first, last) = match args {
                    [first] => (first, first),
                    [first, last] => (first, last),
                    _ => return Err(wrong_args(&format!("{path} delete first ?last?"))),
                };
                self.with_state_mut(path, |state| -> Result<(), String> {
                    let len = state.items.len();
                    let start = list_index(first, len.saturating_sub(1))?;
                    let end = list_index(last, len.saturating_sub(1))?.min(len.saturating_sub(1));
                    if start <= end && start < len {
                        state.items.drain(start..=end);
                        if class == "Menu" && end < state.item_commands.len() {
                            state.item_commands.drain(start..=end);
                        }
                    }
                    Ok(())
                })??;
                Ok(String::new())
            }
            "Treeview" => {
                self.with_state_mut(path, |state| {
                    let mut doomed: Vec<String> = args.iter().flat_map(|list| split_words(list)).collect();
                    let mut i = 0;
                    while i < doomed.len() {
                        let children: Vec<String> = state
                            .item_parents
                            .iter()
                            .filter(|(id, parent)| **parent == doomed[i] && !doomed.contains(*id))
                            .map(|(id, _)| id.clone())
                            .collect();
                        doomed.extend(children);
                        i += 1;
                    }
                    state.items.retain(|id| !doomed.contains(id));
                    state.selection.retain(|id| !doomed.contains(id));
                    state.item_parents.retain(|id, _| !doomed.contains(id));
                })?;
                Ok(String::new())
            }
            "Canvas" => {
                self.with_state_mut(path, |state| {
                    if args.iter().any(|a| a == "all") {
                        state.items.clear();
                    } else {
                        state.items.retain(|id| !args.contains(id));
                    }
                })?;
                Ok(String::new())
            }
            _ => Ok(String::new()),
        }
    }

    fn widget_get(&self, path: &str, class: &str, args: &[String]) -> Result<String, String> {
        if is_entry_class(class) {
            return Ok(self.content(path));
        }
        match class {
            "Text" => {
                let content = self.content(path);
                let (start, end) = match args {
                    [] => (0, content.chars().count()),
                    [first] => {
                        let start = text_index(&content, first)?;
                        (start, start + 1)
                    }
                    [first, last, ..] => (text_index(&content, first)?, text_index(&content, last)?),
                };
                Ok(content
                    .chars()
                    .skip(start)
                    .take(end.saturating_sub(start))
                    .collect())
            }
            "Listbox" => self.with_state(path, |state| -> Result<String, String> {
                let last_index = state.items.len().saturating_sub(1);
                match args {
                    [index] => Ok(state
                        .items
                        .get(list_index(index, last_index)?)
                        .cloned()
                        .unwrap_or_default()),
                    [first, last] => {
                        let start = list_index(first, last_index)?;
                        let end = list_index(last, last_index)?.min(last_index);
                        let slice = state.items.get(start..=end).unwrap_or(&[]);
                        Ok(join_list(slice))
                    }
                    _ => Err(wrong_args(&format!("{path} get first ?last?"))),
                }
            })?,
            _ if is_scale(class) => Ok(self.scale_value(path)),
            "Scrollbar" | "TScrollbar" => {
                let view = self.configured(path, "view");
                Ok(view.unwrap_or_else(|| "0.0 1.0".to_string()))
            }
            _ => Ok(String::new()),
        }
    }

    fn widget_index(&self, path: &str, class: &str, args: &[String]) -> Result<String, String> {
        let [index] = args else {
            return Err(wrong_args(&format!("{path} index index")));
        };
        if is_entry_class(class) {
            let len = self.content(path).chars().count();
            return entry_index(index, len).map(|i| i.to_string());
        }
        match class {
            "Listbox" => {
                let len = self.with_state(path, |state| state.items.len())?;
                list_index(index, len).map(|i| i.min(len).to_string())
            }
            "Text" => Ok(index.clone()),
            _ => Ok(String::new()),
        }
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    fn scale_value(&self, path: &str) -> String {
        if let Some(variable) = self.configured(path, "variable") {
            if let Some(value) = self.read_var(&variable) {
                return value;
            }
        }
        self.configured(path, "value")
            .unwrap_or_else(|| self.option_or_default(path, "from"))
    }

    fn widget_set(&self, path: &str, class: &str, args: &[String]) -> Result<String, String> {
        if is_scale(class) {
            let [value] = args else {
                return Err(wrong_args(&format!("{path} set value")));
            };
            if self.is_disabled(path) {
                return Ok(String::new());
            }
            let value = number_text(parse_double(value));
            self.with_state_mut(path, |state| {
                state.options.insert("value".into(), value.clone());
            })?;
            if let Some(variable) = self.configured(path, "variable") {
                self.write_var(&variable, &value);
            }
            self.run_command(path, &[value.as_str()])?;
            return Ok(String::new());
        }
        if is_entry_class(class) {
            let [value] = args else {
                return Err(wrong_args(&format!("{path} set value")));
            };
            self.set_content(path, value);
            return Ok(String::new());
        }
        if matches!(class, "Scrollbar" | "TScrollbar") {
            let view = args.join(" ");
            self.with_state_mut(path, |state| {
                state.options.insert("view".into(), view);
            })?;
        }
        Ok(String::new())
    }

    fn combobox_current(&self, path: &str, args: &[String]) -> Result<String, String> {
        let values = split_words(&self.option_or_default(path, "values"));
        match args {
            [] => {
                let content = self.content(path);
                Ok(values
                    .iter()
                    .position(|v| *v == content)
                    .map_or_else(|| "-1".to_string(), |i| i.to_string()))
            }
            [index] => {
                let value = index
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| values.get(i))
                    .ok_or_else(|| format!("index \"{index}\" out of range"))?;
                self.set_content(path, value);
                Ok(String::new())
            }
            _ => Err(wrong_args(&format!("{path} current ?newIndex?"))),
        }
    }

    fn progress_step(&self, path: &str, args: &[String]) -> Result<String, String> {
        let amount = args.first().map_or(1.0, |a| parse_double(a));
        let maximum = parse_double(&self.option_or_default(path, "maximum"));
        let variable = self.configured(path, "variable");
        let current = match &variable {
            Some(v) => parse_double(&self.read_var(v).unwrap_or_default()),
            None => parse_double(&self.option_or_default(path, "value")),
        };
        let mut next = current + amount;
        if maximum > 0.0 {
            next %= maximum;
        }
        let text = number_text(next);
        match variable {
            Some(v) => self.write_var(&v, &text),
            None => {
                self.with_state_mut(path, |state| {
                    state.options.insert("value".into(), text);
                })?;
            }
        }
        Ok(String::new())
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    fn next_item_id(&self, path: &str, tree: bool) -> String {
        self.with_state_mut(path, |state| {
            state.next_item += 1;
            let id = if tree {
                format!("I{:03X}", state.next_item)
            } else {
                state.next_item.to_string()
            };
            state.items.push(id.clone());
            id
        })
        .unwrap_or_default()
    }

    fn tree_insert(&self, path: &str, args: &[String]) -> Result<String, String> {
        let [parent, _index, options @ ..] = args else {
            return Err(wrong_args(&format!("{path} insert parent index ?-id id? ?-option value ...?")));
        };
        let options = parse_option_pairs(options)?;
        let requested = options
            .iter()
            .find(|(key, _)| key == "id")
            .map(|(_, id)| id.clone());

        let id = match requested {
            Some(id) => {
                self.with_state_mut(path, |state| {
                    if state.items.contains(&id) {
                        Err(format!("Item {id} already exists"))
                    } else {
                        state.items.push(id.clone());
                        Ok(id)
                    }
                })??
            }
            None => self.next_item_id(path, true),
        };
        self.with_state_mut(path, |state| {
            state.item_parents.insert(id.clone(), parent.clone());
        })?;
        Ok(id)
    }

    fn tree_selection(&self, path: &str, args: &[String]) -> Result<String, String> {
        let Some((op, lists)) = args.split_first() else {
            return self.with_state(path, |state| join_list(&state.selection));
        };
        let items: Vec<String> = lists.iter().flat_map(|list| split_words(list)).collect();
        self.with_state_mut(path, |state| -> Result<(), String> {
            if let Some(missing) = items.iter().find(|id| !state.items.contains(id)) {
                return Err(format!("Item {missing} not found"));
            }
            match op.as_str() {
                "set" => state.selection.clone_from(&items),
                "add" => {
                    for id in items {
                        if !state.selection.contains(&id) {
                            state.selection.push(id);
                        }
                    }
                }
                "remove" => state.selection.retain(|id| !items.contains(id)),
                "toggle" => {
                    for id in items {
                        if let Some(at) = state.selection.iter().position(|s| *s == id) {
                            state.selection.remove(at);
                        } else {
                            state.selection.push(id);
                        }
                    }
                }
                other => return Err(format!("bad selection operation \"{other}\": must be add, remove, set, or toggle")),
            }
            Ok(())
        })??;
        Ok(String::new())
    }

    fn widget_add(&self, path: &str, class: &str, args: &[String]) -> Result<String, String> {
        match class {
            "Menu" => {
                let [kind, options @ ..] = args else {
                    return Err(wrong_args(&format!("{path} add type ?-option value ...?")));
                };
                let options = parse_option_pairs(options)?;
                let command = options
                    .iter()
                    .find(|(key, _)| key == "command")
                    .map(|(_, c)| c.clone())
                    .unwrap_or_default();
                self.with_state_mut(path, |state| {
                    state.items.push(kind.clone());
                    state.item_commands.push(command);
                })?;
                Ok(String::new())
            }
            "TNotebook" | "Panedwindow" | "TPanedwindow" => {
                let Some(child) = args.first() else {
                    return Err(wrong_args(&format!("{path} add window ?-option value ...?")));
                };
                self.widgets.borrow().require(child)?;
                self.with_state_mut(path, |state| {
                    if !state.items.contains(child) {
                        state.items.push(child.clone());
                    }
                })?;
                Ok(String::new())
            }
            _ => Ok(String::new()),
        }
    }

    fn notebook_select(&self, path: &str, args: &[String]) -> Result<String, String> {
        match args {
            [] => Ok(self.configured(path, "current").unwrap_or_default()),
            [tab] => {
                let tab = self.with_state(path, |state| {
                    tab.parse::<usize>()
                        .ok()
                        .and_then(|i| state.items.get(i).cloned())
                        .or_else(|| state.items.contains(tab).then(|| tab.clone()))
                })?;
                let tab = tab.ok_or_else(|| format!("invalid slave \"{}\"", args[0]))?;
                self.with_state_mut(path, |state| {
                    state.options.insert("current".into(), tab);
                })?;
                Ok(String::new())
            }
            _ => Err(wrong_args(&format!("{path} select ?tab?"))),
        }
    }

    fn list_items(&self, path: &str, class: &str, sub: &str, args: &[String]) -> Result<String, String> {
        self.with_state(path, |state| match (sub, class) {
            ("size", _) => state.items.len().to_string(),
            ("children", "Treeview") => {
                let parent = args.first().map_or("", String::as_str);
                let children: Vec<&String> = state
                    .items
                    .iter()
                    .filter(|id| state.item_parents.get(*id).map(String::as_str) == Some(parent))
                    .collect();
                join_list(&children)
            }
            ("tabs" | "find" | "panes", _) => join_list(&state.items),
            _ => String::new(),
        })
    }
}
