//! Global commands of the headless runtime

use super::parser::{join_list, quote_word};
use super::widgets::{is_toplevel_class, parse_geometry, parse_option_pairs, parent_path};
use super::HeadlessRuntime;
use crate::value::parse_int;

/// Event types understood in binding sequences
const EVENT_TYPES: &[&str] = &[
    "Activate",
    "ButtonPress",
    "ButtonRelease",
    "Configure",
    "Deactivate",
    "Destroy",
    "Enter",
    "Expose",
    "FocusIn",
    "FocusOut",
    "KeyPress",
    "KeyRelease",
    "Leave",
    "Map",
    "MouseWheel",
    "Motion",
    "Unmap",
    "Visibility",
];

const MODIFIERS: &[&str] = &[
    "Alt", "Any", "B1", "B2", "B3", "B4", "B5", "Button1", "Button2", "Button3", "Button4",
    "Button5", "Command", "Control", "Double", "Lock", "Meta", "Mod1", "Mod2", "Mod3", "Mod4",
    "Mod5", "Option", "Quadruple", "Shift", "Triple",
];

/// Window-manager properties stored and reported verbatim
const WM_PROPERTIES: &[&str] = &[
    "aspect",
    "client",
    "colormapwindows",
    "command",
    "focusmodel",
    "frame",
    "group",
    "iconbitmap",
    "iconmask",
    "iconname",
    "iconphoto",
    "iconposition",
    "iconwindow",
    "maxsize",
    "minsize",
    "overrideredirect",
    "positionfrom",
    "resizable",
    "sizefrom",
    "title",
    "transient",
];

const WINDOW_STATES: &[&str] = &["normal", "iconic", "withdrawn", "zoomed"];

const FONT_DEFAULTS: &[(&str, &str)] = &[
    ("family", "TkDefaultFont"),
    ("size", "0"),
    ("weight", "normal"),
    ("slant", "roman"),
    ("underline", "0"),
    ("overstrike", "0"),
];

const MESSAGE_BOX_TYPES: &[(&str, &str)] = &[
    ("abortretryignore", "abort"),
    ("ok", "ok"),
    ("okcancel", "ok"),
    ("retrycancel", "retry"),
    ("yesno", "yes"),
    ("yesnocancel", "yes"),
];

pub(super) fn wrong_args(usage: &str) -> String {
    format!("wrong # args: should be \"{usage}\"")
}

fn bad_option(option: &str, choices: &str) -> String {
    format!("bad option \"{option}\": must be {choices}")
}

fn bool_text(b: bool) -> String {
    if b { "1" } else { "0" }.to_string()
}

fn option_value<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Render stored pairs as a `-key value ...` list
fn option_list<'a>(pairs: impl Iterator<Item = (&'a String, &'a String)>) -> String {
    pairs
        .map(|(key, value)| format!("-{key} {}", quote_word(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize an event sequence so that equivalent spellings compare equal
/// (`<Button-1>`, `<1>` and `<ButtonPress-1>` are the same event)
pub(super) fn canonical_sequence(sequence: &str) -> Result<String, String> {
    if sequence.len() > 4 && sequence.starts_with("<<") && sequence.ends_with(">>") {
        return Ok(sequence.to_string());
    }
    let Some(inner) = sequence
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
    else {
        let mut chars = sequence.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(format!("<KeyPress-{c}>")),
            _ => Err(format!("bad event type or keysym \"{sequence}\"")),
        };
    };

    let mut parts: Vec<String> = inner
        .split('-')
        .filter(|p| !p.is_empty())
        .map(|p| match p {
            "Button" => "ButtonPress".to_string(),
            "Key" => "KeyPress".to_string(),
            other => other.to_string(),
        })
        .collect();

    let Some(detail) = parts.last().cloned() else {
        return Err("no event type or button # or keysym".to_string());
    };
    if !parts.iter().any(|p| EVENT_TYPES.contains(&p.as_str())) {
        if MODIFIERS.contains(&detail.as_str()) {
            return Err("no event type or button # or keysym".to_string());
        }
        let kind = if matches!(detail.as_str(), "1" | "2" | "3" | "4" | "5") {
            "ButtonPress"
        } else {
            "KeyPress"
        };
        parts.insert(parts.len() - 1, kind.to_string());
    }
    Ok(format!("<{}>", parts.join("-")))
}

/// Event type name of a canonical sequence
fn event_kind(canonical: &str) -> String {
    if canonical.starts_with("<<") {
        return "VirtualEvent".to_string();
    }
    canonical
        .trim_matches(['<', '>'])
        .split('-')
        .find(|p| EVENT_TYPES.contains(p))
        .unwrap_or("")
        .to_string()
}

/// Button number or keysym following the event type, if any
fn event_detail(canonical: &str) -> Option<String> {
    if canonical.starts_with("<<") {
        return None;
    }
    let parts: Vec<&str> = canonical.trim_matches(['<', '>']).split('-').collect();
    let type_at = parts.iter().position(|p| EVENT_TYPES.contains(p))?;
    parts.get(type_at + 1).map(|s| (*s).to_string())
}

/// The same sequence without its detail, matching any button or key
fn generic_sequence(canonical: &str) -> Option<String> {
    event_detail(canonical)?;
    let inner = canonical.trim_matches(['<', '>']);
    let (head, _) = inner.rsplit_once('-')?;
    Some(format!("<{head}>"))
}

/// Replace `%` codes in a binding script; values are quoted as single words
fn substitute_percents(script: &str, fields: &[(char, String)]) -> String {
    let mut out = String::with_capacity(script.len());
    let mut chars = script.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some(code) => {
                let value = fields
                    .iter()
                    .find(|(k, _)| *k == code)
                    .map_or("??", |(_, v)| v.as_str());
                out.push_str(&quote_word(value));
            }
            None => out.push('%'),
        }
    }
    out
}

impl HeadlessRuntime {
    /// Run a builtin command; `None` when the name is not a builtin
    pub(super) fn builtin(&self, words: &[String]) -> Option<Result<String, String>> {
        let name = words[0].as_str();
        let args = &words[1..];
        let result = match name {
            "set" => self.cmd_set(args),
            "unset" => self.cmd_unset(args),
            "incr" => self.cmd_incr(args),
            "list" => Ok(join_list(args)),
            "after" => self.cmd_after(args),
            "update" => self.cmd_update(args),
            "vwait" => self.cmd_vwait(args),
            "bind" => self.cmd_bind(args),
            "event" => self.cmd_event(args),
            "destroy" => self.cmd_destroy(args),
            "winfo" => self.cmd_winfo(args),
            "pack" | "grid" | "place" => self.cmd_geometry(name, args),
            "wm" => self.cmd_wm(args),
            "raise" | "lower" => self.cmd_restack(name, args),
            "focus" => self.cmd_focus(args),
            "grab" => self.cmd_grab(args),
            "font" => self.cmd_font(args),
            "tk_messageBox" | "tk_getOpenFile" | "tk_getSaveFile" | "tk_chooseDirectory"
            | "tk_chooseColor" => self.cmd_dialog(name, args),
            _ => return None,
        };
        Some(result)
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    fn cmd_set(&self, args: &[String]) -> Result<String, String> {
        match args {
            [name] => self
                .read_var(name)
                .ok_or_else(|| format!("can't read \"{name}\": no such variable")),
            [name, value] => {
                self.write_var(name, value);
                Ok(value.clone())
            }
            _ => Err(wrong_args("set varName ?newValue?")),
        }
    }

    fn cmd_unset(&self, args: &[String]) -> Result<String, String> {
        let mut vars = self.vars.borrow_mut();
        for name in args.iter().filter(|a| a.as_str() != "-nocomplain") {
            vars.remove(name);
        }
        Ok(String::new())
    }

    fn cmd_incr(&self, args: &[String]) -> Result<String, String> {
        let not_int = |v: &str| format!("expected integer but got \"{v}\"");
        let (name, step) = match args {
            [name] => (name, 1),
            [name, step] => (name, step.trim().parse::<i64>().map_err(|_| not_int(step))?),
            _ => return Err(wrong_args("incr varName ?increment?")),
        };
        let current = match self.read_var(name) {
            Some(v) => v.trim().parse::<i64>().map_err(|_| not_int(&v))?,
            None => 0,
        };
        let next = current.saturating_add(step).to_string();
        self.write_var(name, &next);
        Ok(next)
    }

    // ------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------

    fn cmd_after(&self, args: &[String]) -> Result<String, String> {
        let Some((first, rest)) = args.split_first() else {
            return Err(wrong_args("after option ?arg ...?"));
        };
        match first.as_str() {
            "idle" => {
                if rest.is_empty() {
                    return Err(wrong_args("after idle script ?script ...?"));
                }
                Ok(self.scheduler.borrow_mut().schedule_idle(rest.join(" ")))
            }
            "cancel" => {
                if rest.is_empty() {
                    return Err(wrong_args("after cancel id|command"));
                }
                let cancelled = self.scheduler.borrow_mut().cancel(&rest.join(" "));
                tracing::trace!(target_id = %rest.join(" "), cancelled, "after cancel");
                Ok(String::new())
            }
            "info" => match rest {
                [] => Ok(join_list(&self.scheduler.borrow().tokens())),
                [id] => self
                    .scheduler
                    .borrow()
                    .describe(id)
                    .map(|(script, queue)| join_list(&[script.as_str(), queue.as_str()]))
                    .ok_or_else(|| format!("event \"{id}\" doesn't exist")),
                _ => Err(wrong_args("after info ?id?")),
            },
            ms => {
                let delay = ms.parse::<i64>().map_err(|_| {
                    format!("bad argument \"{ms}\": must be cancel, idle, info, or an integer")
                })?;
                let delay = u64::try_from(delay.max(0)).unwrap_or(0);
                let mut scheduler = self.scheduler.borrow_mut();
                if rest.is_empty() {
                    scheduler.sleep(delay);
                    Ok(String::new())
                } else {
                    Ok(scheduler.schedule(delay, rest.join(" ")))
                }
            }
        }
    }

    fn cmd_update(&self, args: &[String]) -> Result<String, String> {
        match args {
            [] => self.drain_due(false).map(|_| String::new()),
            [opt] if opt == "idletasks" => self.drain_due(true).map(|_| String::new()),
            [opt] => Err(bad_option(opt, "idletasks")),
            _ => Err(wrong_args("update ?idletasks?")),
        }
    }

    fn cmd_vwait(&self, args: &[String]) -> Result<String, String> {
        match args {
            [name] => self.wait_for_write(name).map(|()| String::new()),
            _ => Err(wrong_args("vwait name")),
        }
    }

    // ------------------------------------------------------------------
    // Bindings and events
    // ------------------------------------------------------------------

    fn require_tag(&self, tag: &str) -> Result<(), String> {
        if tag.starts_with('.') {
            self.widgets.borrow().require(tag)?;
        }
        Ok(())
    }

    fn cmd_bind(&self, args: &[String]) -> Result<String, String> {
        match args {
            [tag] => {
                self.require_tag(tag)?;
                let bindings = self.bindings.borrow();
                let sequences: Vec<&String> = bindings
                    .get(tag)
                    .map(|table| table.keys().collect())
                    .unwrap_or_default();
                Ok(join_list(&sequences))
            }
            [tag, sequence] => {
                self.require_tag(tag)?;
                let sequence = canonical_sequence(sequence)?;
                Ok(self
                    .bindings
                    .borrow()
                    .get(tag)
                    .and_then(|table| table.get(&sequence))
                    .cloned()
                    .unwrap_or_default())
            }
            [tag, sequence, script] => {
                self.require_tag(tag)?;
                let sequence = canonical_sequence(sequence)?;
                let mut bindings = self.bindings.borrow_mut();
                let table = bindings.entry(tag.clone()).or_default();
                if script.is_empty() {
                    table.remove(&sequence);
                } else if let Some(extra) = script.strip_prefix('+') {
                    let combined = match table.get(&sequence) {
                        Some(existing) => format!("{existing}\n{extra}"),
                        None => extra.to_string(),
                    };
                    table.insert(sequence, combined);
                } else {
                    table.insert(sequence, script.clone());
                }
                Ok(String::new())
            }
            _ => Err(wrong_args("bind window ?pattern? ?command?")),
        }
    }

    /// Scripts bound for an event on a window, in binding-tag order: the
    /// window, its class, its top-level window, then `all`
    fn matching_bindings(&self, window: &str, sequence: &str) -> Vec<String> {
        let tags = {
            let widgets = self.widgets.borrow();
            let mut tags = vec![window.to_string()];
            if let Some(state) = widgets.get(window) {
                tags.push(state.class.clone());
            }
            let top = widgets.toplevel_of(window);
            if top != window {
                tags.push(top);
            }
            tags.push("all".to_string());
            tags
        };

        let mut candidates = vec![sequence.to_string()];
        candidates.extend(generic_sequence(sequence));

        let bindings = self.bindings.borrow();
        tags.iter()
            .filter_map(|tag| {
                let table = bindings.get(tag)?;
                candidates.iter().find_map(|c| table.get(c).cloned())
            })
            .collect()
    }

    fn cmd_event(&self, args: &[String]) -> Result<String, String> {
        let Some((sub, rest)) = args.split_first() else {
            return Err(wrong_args("event option ?arg ...?"));
        };
        match sub.as_str() {
            "generate" => {
                let [window, sequence, options @ ..] = rest else {
                    return Err(wrong_args("event generate window event ?-option value ...?"));
                };
                self.generate_event(window, sequence, options)
            }
            "add" | "delete" | "info" => Ok(String::new()),
            other => Err(bad_option(other, "add, delete, generate, or info")),
        }
    }

    fn generate_event(
        &self,
        window: &str,
        sequence: &str,
        options: &[String],
    ) -> Result<String, String> {
        let sequence = canonical_sequence(sequence)?;
        let options = parse_option_pairs(options)?;
        let (origin_x, origin_y) = self.root_position(window)?;

        let kind = event_kind(&sequence);
        let is_key = kind.starts_with("Key");
        let detail = event_detail(&sequence);
        let opt = |name: &str| option_value(&options, name).map(str::to_string);

        let x = opt("x").unwrap_or_else(|| "0".to_string());
        let y = opt("y").unwrap_or_else(|| "0".to_string());
        let x_root = opt("rootx").unwrap_or_else(|| (origin_x + parse_int(&x)).to_string());
        let y_root = opt("rooty").unwrap_or_else(|| (origin_y + parse_int(&y)).to_string());
        let keysym = opt("keysym")
            .or_else(|| detail.clone().filter(|_| is_key))
            .unwrap_or_else(|| "??".to_string());
        let keycode = opt("keycode").unwrap_or_else(|| if is_key { "0" } else { "??" }.to_string());
        let character = opt("character")
            .or_else(|| (is_key && keysym.chars().count() == 1).then(|| keysym.clone()))
            .unwrap_or_else(|| if is_key { "" } else { "??" }.to_string());

        let fields = [
            ('x', x),
            ('y', y),
            ('X', x_root),
            ('Y', y_root),
            ('W', window.to_string()),
            ('K', keysym),
            ('k', keycode),
            ('c', character),
            ('t', kind),
            ('b', detail.filter(|_| !is_key).unwrap_or_else(|| "??".to_string())),
        ];

        for script in self.matching_bindings(window, &sequence) {
            self.run_background(&substitute_percents(&script, &fields));
        }
        Ok(String::new())
    }

    // ------------------------------------------------------------------
    // Windows
    // ------------------------------------------------------------------

    fn cmd_destroy(&self, args: &[String]) -> Result<String, String> {
        for path in args {
            let removed = self.widgets.borrow_mut().remove_tree(path);
            if removed.is_empty() {
                continue;
            }
            let mut bindings = self.bindings.borrow_mut();
            for gone in &removed {
                bindings.remove(gone);
            }
            for slot in [&self.focus, &self.grab] {
                let mut slot = slot.borrow_mut();
                if slot.as_ref().is_some_and(|w| removed.contains(w)) {
                    *slot = None;
                }
            }
            tracing::trace!(path = %path, count = removed.len(), "destroyed");
        }
        Ok(String::new())
    }

    /// Screen position of a widget's origin
    fn root_position(&self, path: &str) -> Result<(i64, i64), String> {
        let widgets = self.widgets.borrow();
        widgets.require(path)?;
        let (mut x, mut y) = (0, 0);
        let mut current = path.to_string();
        loop {
            let state = widgets.require(&current)?;
            if is_toplevel_class(&state.class) {
                if let Some((gx, gy)) = state.wm.get("geometry").and_then(|g| parse_geometry(g).1) {
                    x += gx;
                    y += gy;
                }
                break;
            }
            x += state.layout.get("x").map_or(0, |v| parse_int(v));
            y += state.layout.get("y").map_or(0, |v| parse_int(v));
            match parent_path(&current) {
                Some(parent) => current = parent.to_string(),
                None => break,
            }
        }
        Ok((x, y))
    }

    /// Width (`axis` 0) or height (`axis` 1) of a widget
    fn dimension(&self, path: &str, axis: usize) -> Result<String, String> {
        let key = if axis == 0 { "width" } else { "height" };
        let widgets = self.widgets.borrow();
        let state = widgets.require(path)?;
        if is_toplevel_class(&state.class) {
            if let Some((w, h)) = state.wm.get("geometry").and_then(|g| parse_geometry(g).0) {
                return Ok(if axis == 0 { w } else { h }.to_string());
            }
        }
        if let Some(v) = state.layout.get(key) {
            return Ok(v.clone());
        }
        match state.configured(key) {
            Some(v) if v != "0" => Ok(v.to_string()),
            _ => Ok("1".to_string()),
        }
    }

    fn coordinate(&self, path: &str, axis: usize) -> Result<String, String> {
        let key = if axis == 0 { "x" } else { "y" };
        let widgets = self.widgets.borrow();
        let state = widgets.require(path)?;
        if is_toplevel_class(&state.class) {
            let position = state.wm.get("geometry").and_then(|g| parse_geometry(g).1);
            return Ok(position.map_or(0, |(x, y)| if axis == 0 { x } else { y }).to_string());
        }
        Ok(state.layout.get(key).cloned().unwrap_or_else(|| "0".to_string()))
    }

    fn cmd_winfo(&self, args: &[String]) -> Result<String, String> {
        let Some((sub, rest)) = args.split_first() else {
            return Err(wrong_args("winfo option ?arg ...?"));
        };
        let [path] = rest else {
            return Err(wrong_args(&format!("winfo {sub} window")));
        };
        match sub.as_str() {
            "exists" => Ok(bool_text(self.widgets.borrow().contains(path))),
            "screenwidth" => Ok(self.config.screen_width.to_string()),
            "screenheight" => Ok(self.config.screen_height.to_string()),
            "width" | "reqwidth" => self.dimension(path, 0),
            "height" | "reqheight" => self.dimension(path, 1),
            "x" => self.coordinate(path, 0),
            "y" => self.coordinate(path, 1),
            "rootx" => self.root_position(path).map(|(x, _)| x.to_string()),
            "rooty" => self.root_position(path).map(|(_, y)| y.to_string()),
            _ => {
                let widgets = self.widgets.borrow();
                let state = widgets.require(path)?;
                match sub.as_str() {
                    "children" => Ok(join_list(&widgets.children(path))),
                    "class" => Ok(state.class.clone()),
                    "toplevel" => Ok(widgets.toplevel_of(path)),
                    "parent" => Ok(parent_path(path).unwrap_or("").to_string()),
                    "manager" => Ok(state.manager.clone().unwrap_or_default()),
                    "name" => Ok(path.rsplit('.').next().unwrap_or("").to_string()),
                    "ismapped" | "viewable" => Ok(bool_text(if is_toplevel_class(&state.class) {
                        state.wm.get("state").map_or(true, |s| s == "normal" || s == "zoomed")
                    } else {
                        state.manager.is_some()
                    })),
                    other => Err(bad_option(
                        other,
                        "children, class, exists, height, ismapped, manager, name, parent, \
                         rootx, rooty, screenheight, screenwidth, toplevel, viewable, width, x, or y",
                    )),
                }
            }
        }
    }

    fn cmd_geometry(&self, manager: &str, args: &[String]) -> Result<String, String> {
        let Some((sub, rest)) = args.split_first() else {
            return Err(wrong_args(&format!("{manager} option arg ?arg ...?")));
        };
        if sub.starts_with('.') {
            return self.manage(manager, args);
        }
        match sub.as_str() {
            "configure" => self.manage(manager, rest),
            "forget" | "remove" => {
                let mut widgets = self.widgets.borrow_mut();
                for path in rest {
                    let state = widgets.require_mut(path)?;
                    if state.manager.as_deref() == Some(manager) {
                        state.manager = None;
                        if sub != "remove" {
                            state.layout.clear();
                        }
                    }
                }
                Ok(String::new())
            }
            "info" => {
                let [path] = rest else {
                    return Err(wrong_args(&format!("{manager} info window")));
                };
                let widgets = self.widgets.borrow();
                let state = widgets.require(path)?;
                if state.manager.as_deref() != Some(manager) {
                    let verb = match manager {
                        "pack" => "packed",
                        "grid" => "managed by grid",
                        _ => "placed",
                    };
                    return Err(format!("window \"{path}\" isn't {verb}"));
                }
                Ok(option_list(state.layout.iter()))
            }
            "slaves" | "content" => {
                let [master] = rest else {
                    return Err(wrong_args(&format!("{manager} {sub} window")));
                };
                let widgets = self.widgets.borrow();
                widgets.require(master)?;
                let managed: Vec<String> = widgets
                    .children(master)
                    .into_iter()
                    .filter(|c| {
                        widgets.get(c).and_then(|w| w.manager.as_deref()) == Some(manager)
                    })
                    .collect();
                Ok(join_list(&managed))
            }
            "rowconfigure" | "columnconfigure" if manager == "grid" => {
                self.grid_configure(sub.trim_end_matches("configure"), rest)
            }
            "propagate" => Ok("1".to_string()),
            "size" if manager == "grid" => Ok("0 0".to_string()),
            "bbox" if manager == "grid" => Ok("0 0 0 0".to_string()),
            other => Err(bad_option(other, "configure, forget, info, or slaves")),
        }
    }

    fn manage(&self, manager: &str, args: &[String]) -> Result<String, String> {
        let split = args
            .iter()
            .position(|a| !a.starts_with('.'))
            .unwrap_or(args.len());
        let (paths, options) = args.split_at(split);
        if paths.is_empty() {
            return Err(wrong_args(&format!("{manager} configure window ?-option value ...?")));
        }
        let options = parse_option_pairs(options)?;

        let mut widgets = self.widgets.borrow_mut();
        for path in paths {
            let master = {
                let state = widgets.require(path)?;
                if is_toplevel_class(&state.class) {
                    return Err(format!("can't manage \"{path}\": it's a top-level window"));
                }
                option_value(&options, "in")
                    .or_else(|| parent_path(path))
                    .unwrap_or(".")
                    .to_string()
            };

            if manager != "place" {
                let other = if manager == "pack" { "grid" } else { "pack" };
                let conflict = widgets.children(&master).iter().any(|child| {
                    child != path
                        && widgets.get(child).and_then(|w| w.manager.as_deref()) == Some(other)
                });
                if conflict {
                    return Err(format!(
                        "cannot use geometry manager {manager} inside {master} which already has slaves managed by {other}"
                    ));
                }
            }

            let state = widgets.require_mut(path)?;
            if state.manager.as_deref() != Some(manager) {
                state.layout.clear();
            }
            state.manager = Some(manager.to_string());
            state.layout.extend(options.iter().cloned());
        }
        Ok(String::new())
    }

    fn grid_configure(&self, kind: &str, args: &[String]) -> Result<String, String> {
        let [master, index, options @ ..] = args else {
            return Err(wrong_args(&format!("grid {kind}configure master index ?-option value ...?")));
        };
        let mut widgets = self.widgets.borrow_mut();
        let state = widgets.require_mut(master)?;
        let key = format!("{kind} {index}");
        if options.is_empty() {
            let settings = state.grid_config.get(&key).cloned().unwrap_or_default();
            return Ok(option_list(settings.iter()));
        }
        let settings = state.grid_config.entry(key).or_default();
        settings.extend(parse_option_pairs(options)?);
        Ok(String::new())
    }

    fn cmd_wm(&self, args: &[String]) -> Result<String, String> {
        let [sub, window, rest @ ..] = args else {
            return Err(wrong_args("wm option window ?arg ...?"));
        };
        let mut widgets = self.widgets.borrow_mut();
        let state = widgets.require_toplevel_mut(window)?;

        match sub.as_str() {
            "protocol" => match rest {
                [] => Ok(join_list(&state.protocols.keys().collect::<Vec<_>>())),
                [name] => Ok(state.protocols.get(name).cloned().unwrap_or_default()),
                [name, script] => {
                    if script.is_empty() {
                        state.protocols.remove(name);
                    } else {
                        state.protocols.insert(name.clone(), script.clone());
                    }
                    Ok(String::new())
                }
                _ => Err(wrong_args("wm protocol window ?name? ?command?")),
            },
            "attributes" => match rest {
                [] => Ok(state
                    .wm
                    .iter()
                    .filter_map(|(k, v)| k.strip_prefix('-').map(|name| format!("-{name} {}", quote_word(v))))
                    .collect::<Vec<_>>()
                    .join(" ")),
                [name] => Ok(state.wm.get(&format!("-{}", name.trim_start_matches('-'))).cloned().unwrap_or_default()),
                pairs => {
                    for (name, value) in parse_option_pairs(pairs)? {
                        state.wm.insert(format!("-{name}"), value);
                    }
                    Ok(String::new())
                }
            },
            "iconify" | "deiconify" | "withdraw" => {
                let new_state = match sub.as_str() {
                    "iconify" => "iconic",
                    "deiconify" => "normal",
                    _ => "withdrawn",
                };
                state.wm.insert("state".into(), new_state.into());
                Ok(String::new())
            }
            "state" => match rest {
                [] => Ok(state.wm.get("state").cloned().unwrap_or_else(|| "normal".into())),
                [new_state] if WINDOW_STATES.contains(&new_state.as_str()) => {
                    state.wm.insert("state".into(), new_state.clone());
                    Ok(String::new())
                }
                [other] => Err(bad_option(other, "normal, iconic, withdrawn, or zoomed")),
                _ => Err(wrong_args("wm state window ?state?")),
            },
            "geometry" => match rest {
                [] => Ok(state
                    .wm
                    .get("geometry")
                    .cloned()
                    .unwrap_or_else(|| "1x1+0+0".into())),
                [geometry] => {
                    if parse_geometry(geometry) == (None, None) && !geometry.is_empty() {
                        return Err(format!("bad geometry specifier \"{geometry}\""));
                    }
                    state.wm.insert("geometry".into(), geometry.clone());
                    Ok(String::new())
                }
                _ => Err(wrong_args("wm geometry window ?newGeometry?")),
            },
            property if WM_PROPERTIES.contains(&property) => {
                if rest.is_empty() {
                    let default = if property == "resizable" { "1 1" } else { "" };
                    Ok(state.wm.get(property).cloned().unwrap_or_else(|| default.into()))
                } else {
                    state.wm.insert(property.to_string(), rest.join(" "));
                    Ok(String::new())
                }
            }
            other => Err(bad_option(
                other,
                "attributes, deiconify, geometry, iconify, protocol, state, title, withdraw, ...",
            )),
        }
    }

    fn cmd_restack(&self, name: &str, args: &[String]) -> Result<String, String> {
        match args {
            [path] | [path, _] => {
                self.widgets.borrow().require(path)?;
                Ok(String::new())
            }
            _ => Err(wrong_args(&format!("{name} window ?belowThis?"))),
        }
    }

    fn cmd_focus(&self, args: &[String]) -> Result<String, String> {
        let path = match args {
            [] => return Ok(self.focus.borrow().clone().unwrap_or_default()),
            [opt, _] if opt == "-displayof" || opt == "-lastfor" => {
                return Ok(self.focus.borrow().clone().unwrap_or_default());
            }
            [path] | [_, path] => path,
            _ => return Err(wrong_args("focus ?-force? window")),
        };
        self.widgets.borrow().require(path)?;
        *self.focus.borrow_mut() = Some(path.clone());
        Ok(String::new())
    }

    fn cmd_grab(&self, args: &[String]) -> Result<String, String> {
        match args {
            [] => Err(wrong_args("grab ?-global? window")),
            [sub] if sub == "current" => Ok(self.grab.borrow().clone().unwrap_or_default()),
            [sub, path] if sub == "release" => {
                let mut grab = self.grab.borrow_mut();
                if grab.as_deref() == Some(path.as_str()) {
                    *grab = None;
                }
                Ok(String::new())
            }
            [sub, path] if sub == "status" => Ok(if self.grab.borrow().as_deref() == Some(path.as_str()) {
                "local"
            } else {
                "none"
            }
            .to_string()),
            [path] | [_, path] => {
                self.widgets.borrow().require(path)?;
                *self.grab.borrow_mut() = Some(path.clone());
                Ok(String::new())
            }
            _ => Err(wrong_args("grab ?-global? window")),
        }
    }

    // ------------------------------------------------------------------
    // Fonts
    // ------------------------------------------------------------------

    fn validate_font_options(pairs: &[(String, String)]) -> Result<(), String> {
        for (key, _) in pairs {
            if !FONT_DEFAULTS.iter().any(|(name, _)| name == key) {
                return Err(bad_option(
                    &format!("-{key}"),
                    "-family, -size, -weight, -slant, -underline, or -overstrike",
                ));
            }
        }
        Ok(())
    }

    fn cmd_font(&self, args: &[String]) -> Result<String, String> {
        let Some((sub, rest)) = args.split_first() else {
            return Err(wrong_args("font option ?arg?"));
        };
        let missing = |name: &str| format!("named font \"{name}\" doesn't exist");

        match sub.as_str() {
            "create" => {
                let (name, options) = match rest.split_first() {
                    Some((name, options)) if !name.starts_with('-') => (name.clone(), options),
                    _ => {
                        let n = self.next_font.get();
                        self.next_font.set(n + 1);
                        (format!("font{n}"), rest)
                    }
                };
                let pairs = parse_option_pairs(options)?;
                Self::validate_font_options(&pairs)?;

                let mut fonts = self.fonts.borrow_mut();
                if fonts.contains_key(&name) {
                    return Err(format!("named font \"{name}\" already exists"));
                }
                let mut attributes: std::collections::BTreeMap<String, String> = FONT_DEFAULTS
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect();
                attributes.extend(pairs);
                fonts.insert(name.clone(), attributes);
                Ok(name)
            }
            "configure" | "actual" => {
                let Some((name, options)) = rest.split_first() else {
                    return Err(wrong_args(&format!("font {sub} fontname ?-option value ...?")));
                };
                let mut fonts = self.fonts.borrow_mut();
                let attributes = fonts.get_mut(name).ok_or_else(|| missing(name))?;
                match options {
                    [] => Ok(option_list(attributes.iter())),
                    [option] => attributes
                        .get(option.trim_start_matches('-'))
                        .cloned()
                        .ok_or_else(|| bad_option(option, "-family, -size, -weight, -slant, -underline, or -overstrike")),
                    _ if sub == "actual" => Err(wrong_args("font actual font ?-option?")),
                    _ => {
                        let pairs = parse_option_pairs(options)?;
                        Self::validate_font_options(&pairs)?;
                        attributes.extend(pairs);
                        Ok(String::new())
                    }
                }
            }
            "delete" => {
                let mut fonts = self.fonts.borrow_mut();
                for name in rest {
                    fonts.remove(name).ok_or_else(|| missing(name))?;
                }
                Ok(String::new())
            }
            "names" => Ok(join_list(&self.fonts.borrow().keys().collect::<Vec<_>>())),
            "families" => Ok(String::new()),
            "measure" | "metrics" => Ok("0".to_string()),
            other => Err(bad_option(
                other,
                "actual, configure, create, delete, families, measure, metrics, or names",
            )),
        }
    }

    // ------------------------------------------------------------------
    // Dialogs
    // ------------------------------------------------------------------

    fn cmd_dialog(&self, name: &str, args: &[String]) -> Result<String, String> {
        let options = parse_option_pairs(args)?;
        if let Some(parent) = option_value(&options, "parent") {
            self.widgets.borrow().require(parent)?;
        }

        let default_answer = match name {
            "tk_messageBox" => {
                let kind = option_value(&options, "type").unwrap_or("ok");
                let Some(&(_, first)) = MESSAGE_BOX_TYPES.iter().find(|(t, _)| *t == kind) else {
                    return Err(format!(
                        "bad -type value \"{kind}\": must be abortretryignore, ok, okcancel, retrycancel, yesno, or yesnocancel"
                    ));
                };
                option_value(&options, "default").unwrap_or(first).to_string()
            }
            "tk_chooseColor" => option_value(&options, "initialcolor").unwrap_or("").to_string(),
            _ => String::new(),
        };

        let queued = self
            .dialog_answers
            .borrow_mut()
            .get_mut(name)
            .and_then(std::collections::VecDeque::pop_front);
        let answer = queued
            .or_else(|| self.config.dialog_answers.get(name).cloned())
            .unwrap_or(default_answer);

        tracing::debug!(dialog = name, answer = %answer, "dialog answered");
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn eval(rt: &HeadlessRuntime, script: &str) -> String {
        rt.eval(script).unwrap()
    }

    fn recorder(rt: &HeadlessRuntime, name: &str) -> Rc<RefCell<Vec<Vec<String>>>> {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();
        rt.create_command(
            name,
            Rc::new(move |args: &[String]| {
                sink.borrow_mut().push(args[1..].to_vec());
                Ok(String::new())
            }),
        );
        calls
    }

    #[test]
    fn test_canonical_sequences() {
        assert_eq!(canonical_sequence("<Button-1>").unwrap(), "<ButtonPress-1>");
        assert_eq!(canonical_sequence("<1>").unwrap(), "<ButtonPress-1>");
        assert_eq!(canonical_sequence("<ButtonPress-1>").unwrap(), "<ButtonPress-1>");
        assert_eq!(canonical_sequence("<Return>").unwrap(), "<KeyPress-Return>");
        assert_eq!(canonical_sequence("<Key>").unwrap(), "<KeyPress>");
        assert_eq!(canonical_sequence("<Control-s>").unwrap(), "<Control-KeyPress-s>");
        assert_eq!(canonical_sequence("<B1-Motion>").unwrap(), "<B1-Motion>");
        assert_eq!(canonical_sequence("<<Paste>>").unwrap(), "<<Paste>>");
        assert_eq!(canonical_sequence("a").unwrap(), "<KeyPress-a>");
        assert!(canonical_sequence("<Control>").is_err());
        assert!(canonical_sequence("<>").is_err());
    }

    #[test]
    fn test_percent_substitution_quotes_values() {
        let fields = [('W', ".b 1".to_string()), ('x', "3".to_string())];
        assert_eq!(substitute_percents("cb %x %W %% %q", &fields), "cb 3 .b\\ 1 % ??");
        assert_eq!(substitute_percents("cb %c", &[('c', String::new())]), "cb {}");
    }

    #[test]
    fn test_after_and_vwait() {
        let rt = HeadlessRuntime::new();
        eval(&rt, "after 100 {set done yes}");
        eval(&rt, "after 10 {set first 1}");
        let idle = eval(&rt, "after idle {set idle 1}");
        assert!(idle.starts_with("after#"));

        eval(&rt, "vwait done");
        assert_eq!(rt.get_var("done").as_deref(), Some("yes"));
        assert_eq!(rt.get_var("first").as_deref(), Some("1"));
        assert_eq!(rt.get_var("idle").as_deref(), Some("1"));
        assert_eq!(rt.now_ms(), 100);

        let err = rt.eval("vwait never").unwrap_err();
        assert!(err.contains("would wait forever"));
    }

    #[test]
    fn test_after_cancel_and_info() {
        let rt = HeadlessRuntime::new();
        let id = eval(&rt, "after 50 {set fired 1}");
        assert_eq!(eval(&rt, &format!("after info {id}")), "set\\ fired\\ 1 timer");

        eval(&rt, &format!("after cancel {id}"));
        eval(&rt, &format!("after cancel {id}"));
        eval(&rt, "after cancel after#999");
        assert_eq!(eval(&rt, "after info"), "");
        rt.advance(100).unwrap();
        assert_eq!(rt.get_var("fired"), None);
        assert!(rt.eval("after soon {x}").is_err());
    }

    #[test]
    fn test_update_runs_only_due_work() {
        let rt = HeadlessRuntime::new();
        eval(&rt, "after 0 {set now 1}");
        eval(&rt, "after 500 {set later 1}");
        eval(&rt, "update");
        assert_eq!(rt.get_var("now").as_deref(), Some("1"));
        assert_eq!(rt.get_var("later"), None);
        assert_eq!(rt.pending_count(), 1);
    }

    #[test]
    fn test_bind_and_generate() {
        let rt = HeadlessRuntime::new();
        let calls = recorder(&rt, "on_click");
        eval(&rt, "button .b1");
        eval(&rt, "bind .b1 <Button-1> {on_click %x %y %X %Y %W %K %k %c %t}");
        eval(&rt, "event generate .b1 <ButtonPress-1> -x 3 -y 4");

        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec!["3", "4", "3", "4", ".b1", "??", "??", "??", "ButtonPress"]);
    }

    #[test]
    fn test_bind_replace_append_and_generic_key() {
        let rt = HeadlessRuntime::new();
        let keys = recorder(&rt, "on_key");
        eval(&rt, "entry .e");
        eval(&rt, "bind .e <Key> {on_key %K %c}");
        eval(&rt, "bind .e <Key> {+on_key again}");
        assert_eq!(eval(&rt, "bind .e"), "<KeyPress>");

        eval(&rt, "event generate .e <KeyPress-a>");
        assert_eq!(*keys.borrow(), vec![vec!["a", "a"], vec!["again"]]);

        eval(&rt, "bind .e <Key> {}");
        assert_eq!(eval(&rt, "bind .e <Key>"), "");
        assert!(rt.eval("bind .nope <Key> {x}").is_err());
    }

    #[test]
    fn test_class_and_all_bindings_fire_after_widget_binding() {
        let rt = HeadlessRuntime::new();
        let seen = recorder(&rt, "note");
        eval(&rt, "button .b");
        eval(&rt, "bind all <Enter> {note all}");
        eval(&rt, "bind Button <Enter> {note class}");
        eval(&rt, "bind .b <Enter> {note widget}");
        eval(&rt, "event generate .b <Enter>");

        let order: Vec<String> = seen.borrow().iter().map(|c| c[0].clone()).collect();
        assert_eq!(order, vec!["widget", "class", "all"]);
    }

    #[test]
    fn test_destroy_and_winfo() {
        let rt = HeadlessRuntime::new();
        eval(&rt, "frame .f");
        eval(&rt, "label .f.l -text hi");
        assert_eq!(eval(&rt, "winfo children .f"), ".f.l");
        assert_eq!(eval(&rt, "winfo class .f.l"), "Label");
        assert_eq!(eval(&rt, "winfo exists .f.l"), "1");

        eval(&rt, "destroy .f .never");
        assert_eq!(eval(&rt, "winfo exists .f.l"), "0");
        assert!(rt.eval("winfo class .f").is_err());
        assert!(rt.eval(".f configure").is_err());
    }

    #[test]
    fn test_winfo_geometry() {
        let rt = HeadlessRuntime::new();
        eval(&rt, "wm geometry . 400x300+100+50");
        eval(&rt, "frame .f -width 120");
        eval(&rt, "place .f -x 10 -y 20");
        assert_eq!(eval(&rt, "winfo width ."), "400");
        assert_eq!(eval(&rt, "winfo width .f"), "120");
        assert_eq!(eval(&rt, "winfo height .f"), "1");
        assert_eq!(eval(&rt, "winfo x .f"), "10");
        assert_eq!(eval(&rt, "winfo rootx .f"), "110");
        assert_eq!(eval(&rt, "winfo rooty .f"), "70");
        assert_eq!(eval(&rt, "winfo screenwidth ."), "1920");
    }

    #[test]
    fn test_geometry_managers() {
        let rt = HeadlessRuntime::new();
        eval(&rt, "frame .a; frame .b; frame .c");
        eval(&rt, "pack .a -side left -fill x");
        assert_eq!(eval(&rt, "winfo manager .a"), "pack");
        assert_eq!(eval(&rt, "pack info .a"), "-fill x -side left");

        let err = rt.eval("grid .b -row 0").unwrap_err();
        assert!(err.contains("cannot use geometry manager grid"));
        eval(&rt, "place .c -x 5 -y 5");

        eval(&rt, "pack forget .a");
        assert_eq!(eval(&rt, "winfo manager .a"), "");
        eval(&rt, "grid .b -row 1 -column 2");
        eval(&rt, "grid rowconfigure . 1 -weight 3");
        assert_eq!(eval(&rt, "grid rowconfigure . 1"), "-weight 3");
        assert_eq!(eval(&rt, "grid slaves ."), ".b");
    }

    #[test]
    fn test_wm_commands() {
        let rt = HeadlessRuntime::new();
        assert_eq!(eval(&rt, "wm title ."), "tk");
        eval(&rt, "wm title . {My App}");
        assert_eq!(eval(&rt, "wm title ."), "My App");

        eval(&rt, "toplevel .t");
        eval(&rt, "wm withdraw .t");
        assert_eq!(eval(&rt, "wm state .t"), "withdrawn");
        eval(&rt, "wm protocol .t WM_DELETE_WINDOW {set closing 1}");
        assert_eq!(eval(&rt, "wm protocol .t WM_DELETE_WINDOW"), "set closing 1");

        rt.request_close(".t").unwrap();
        assert_eq!(rt.get_var("closing").as_deref(), Some("1"));
        assert!(rt.widget_exists(".t"));

        eval(&rt, "frame .f");
        assert!(rt.eval("wm title .f x").unwrap_err().contains("isn't a top-level window"));
    }

    #[test]
    fn test_focus_and_grab() {
        let rt = HeadlessRuntime::new();
        eval(&rt, "entry .e");
        eval(&rt, "focus .e");
        eval(&rt, "grab set .e");
        assert_eq!(eval(&rt, "focus"), ".e");
        assert_eq!(eval(&rt, "grab current"), ".e");
        eval(&rt, "grab release .e");
        assert_eq!(rt.grab_window(), None);
        eval(&rt, "destroy .e");
        assert_eq!(rt.focus_window(), None);
    }

    #[test]
    fn test_fonts() {
        let rt = HeadlessRuntime::new();
        eval(&rt, "font create heading -family Helvetica -size 14");
        assert_eq!(eval(&rt, "font configure heading -size"), "14");
        assert_eq!(eval(&rt, "font configure heading -weight"), "normal");
        eval(&rt, "font configure heading -weight bold");
        assert_eq!(rt.font_option("heading", "weight").as_deref(), Some("bold"));

        assert!(rt.eval("font create heading").unwrap_err().contains("already exists"));
        assert!(rt.eval("font create other -colour red").is_err());
        assert_eq!(eval(&rt, "font create"), "font1");

        eval(&rt, "font delete heading");
        assert!(!rt.font_exists("heading"));
        assert!(rt.eval("font delete heading").is_err());
    }

    #[test]
    fn test_dialog_answers() {
        let mut config = crate::config::HeadlessConfig::default();
        config.dialog_answers.insert("tk_getOpenFile".into(), "/tmp/a.txt".into());
        let rt = HeadlessRuntime::with_config(config);

        assert_eq!(eval(&rt, "tk_messageBox -type yesno -message {Sure?}"), "yes");
        assert_eq!(eval(&rt, "tk_messageBox -type yesno -default no"), "no");
        rt.push_dialog_answer("tk_messageBox", "cancel");
        assert_eq!(eval(&rt, "tk_messageBox -type okcancel"), "cancel");
        assert_eq!(eval(&rt, "tk_getOpenFile -title Open"), "/tmp/a.txt");
        assert_eq!(eval(&rt, "tk_chooseDirectory"), "");
        assert_eq!(eval(&rt, "tk_chooseColor -initialcolor #ff0000"), "#ff0000");
        assert!(rt.eval("tk_messageBox -type maybe").is_err());
    }

    #[test]
    fn test_incr_and_list() {
        let rt = HeadlessRuntime::new();
        assert_eq!(eval(&rt, "incr n"), "1");
        assert_eq!(eval(&rt, "incr n 5"), "6");
        eval(&rt, "set s abc");
        assert!(rt.eval("incr s").is_err());
        assert_eq!(eval(&rt, "list a {b c} {}"), "a b\\ c {}");
    }
}
