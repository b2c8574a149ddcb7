//! Classic Tk widgets

use std::cell::Cell;

use crate::callback::{Callback, CallbackId};
use crate::error::TkResult;
use crate::font::Font;
use crate::widget::Widget;
use crate::value::{parse_double, parse_int, render_options, sanitize, split_words, ArgValue, Options};

widget_type!(
    /// Container for grouping and laying out other widgets
    Frame, "frame", "frame"
);
widget_type!(Label, "label", "label");
widget_type!(Button, "button", "button");
widget_type!(Checkbutton, "checkbutton", "checkbutton");
widget_type!(Radiobutton, "radiobutton", "radiobutton");
widget_type!(
    /// Single-line text input
    Entry, "entry", "entry"
);
widget_type!(Spinbox, "spinbox", "spinbox");
widget_type!(Scale, "scale", "scale");
widget_type!(Scrollbar, "scrollbar", "scrollbar");
widget_type!(
    /// Multi-line text editor
    Text, "text", "text"
);
widget_type!(Canvas, "canvas", "canvas");
widget_type!(Listbox, "listbox", "listbox");

option_setters!(Frame { width => "width": i64, height => "height": i64 });
option_setters!(Label { text => "text": &str, anchor => "anchor": &str, relief => "relief": &str });
option_setters!(Button { text => "text": &str, width => "width": i64, height => "height": i64 });
option_setters!(Checkbutton { text => "text": &str });
option_setters!(Radiobutton { text => "text": &str, value => "value": &str });
option_setters!(Entry { state => "state": &str, width => "width": i64 });
option_setters!(Spinbox { from => "from": f64, to => "to": f64, increment => "increment": f64 });
option_setters!(Scale { from => "from": f64, to => "to": f64, orient => "orient": &str });
option_setters!(Scrollbar { orient => "orient": &str });
option_setters!(Text { wrap => "wrap": &str, state => "state": &str });
option_setters!(Canvas { width => "width": i64, height => "height": i64, background => "background": &str });
option_setters!(Listbox { selectmode => "selectmode": &str, height => "height": i64 });

var_setters!(Checkbutton { variable => "variable" });
var_setters!(Radiobutton { variable => "variable" });
var_setters!(Entry { textvariable => "textvariable" });
var_setters!(Spinbox { textvariable => "textvariable" });
var_setters!(Scale { variable => "variable" });

command_setter!(Button, Checkbutton, Radiobutton, Spinbox);
entry_ops!(Entry, Spinbox);

impl Label {
    pub fn font(&self, font: &Font) -> TkResult<&Self> {
        self.config_one("font", font)?;
        Ok(self)
    }
}

impl Button {
    pub fn font(&self, font: &Font) -> TkResult<&Self> {
        self.config_one("font", font)?;
        Ok(self)
    }

    /// Run the button's command as if it had been clicked
    pub fn invoke(&self) -> TkResult<String> {
        self.interp().evaluate(&format!("{} invoke", self.name()))
    }
}

impl Checkbutton {
    pub fn select(&self) -> TkResult<()> {
        self.interp().evaluate(&format!("{} select", self.name())).map(drop)
    }

    pub fn deselect(&self) -> TkResult<()> {
        self.interp().evaluate(&format!("{} deselect", self.name())).map(drop)
    }

    pub fn toggle(&self) -> TkResult<()> {
        self.interp().evaluate(&format!("{} toggle", self.name())).map(drop)
    }

    /// Toggle and run the command, like a click
    pub fn invoke(&self) -> TkResult<()> {
        self.interp().evaluate(&format!("{} invoke", self.name())).map(drop)
    }
}

impl Radiobutton {
    pub fn select(&self) -> TkResult<()> {
        self.interp().evaluate(&format!("{} select", self.name())).map(drop)
    }

    pub fn invoke(&self) -> TkResult<()> {
        self.interp().evaluate(&format!("{} invoke", self.name())).map(drop)
    }
}

impl Scale {
    /// Called with the new value whenever the slider moves
    pub fn command(&self, f: impl Fn(f64) + 'static) -> TkResult<&Self> {
        self.set_option_callback("command", "command_cb", Callback::double(f))?;
        Ok(self)
    }

    pub fn get(&self) -> TkResult<f64> {
        self.interp()
            .evaluate(&format!("{} get", self.name()))
            .map(|s| parse_double(&s))
    }

    pub fn set(&self, value: f64) -> TkResult<()> {
        self.interp()
            .evaluate(&format!("{} set {}", self.name(), ArgValue::from(value).render()))
            .map(drop)
    }
}

impl Scrollbar {
    /// Called with the scroll request (`moveto 0.5`, `scroll 1 units`)
    pub fn command(&self, f: impl Fn(&str) + 'static) -> TkResult<&Self> {
        self.set_option_callback("command", "command_cb", Callback::string(f))?;
        Ok(self)
    }

    /// Set the visible fraction
    pub fn set(&self, first: f64, last: f64) -> TkResult<()> {
        self.interp()
            .evaluate(&format!(
                "{} set {} {}",
                self.name(),
                ArgValue::from(first).render(),
                ArgValue::from(last).render()
            ))
            .map(drop)
    }

    /// Visible fraction as `(first, last)`
    pub fn get(&self) -> TkResult<(f64, f64)> {
        let text = self.interp().evaluate(&format!("{} get", self.name()))?;
        let parts = split_words(&text);
        let at = |i: usize| parts.get(i).map_or(0.0, |s| parse_double(s));
        Ok((at(0), at(1)))
    }
}

impl Text {
    pub fn insert(&self, index: &str, text: &str) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} insert {} {}",
            self.name(),
            ArgValue::from(index).render(),
            ArgValue::from(text).render()
        ))?;
        Ok(self)
    }

    pub fn erase(&self, start: &str, end: &str) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} delete {} {}",
            self.name(),
            ArgValue::from(start).render(),
            ArgValue::from(end).render()
        ))?;
        Ok(self)
    }

    pub fn get(&self, start: &str, end: &str) -> TkResult<String> {
        self.interp().evaluate(&format!(
            "{} get {} {}",
            self.name(),
            ArgValue::from(start).render(),
            ArgValue::from(end).render()
        ))
    }

    /// Whole content without the trailing newline
    pub fn content(&self) -> TkResult<String> {
        self.get("1.0", "end-1c")
    }

    /// Called with the visible fraction (`first last`) when the view changes
    pub fn yscrollcommand(&self, f: impl Fn(&str) + 'static) -> TkResult<&Self> {
        self.set_option_callback("yscrollcommand", "yscroll_cb", Callback::string(f))?;
        Ok(self)
    }

    /// Adjust the vertical view, e.g. `moveto 0.5`
    pub fn yview(&self, args: &str) -> TkResult<()> {
        self.interp().evaluate(&format!("{} yview {args}", self.name())).map(drop)
    }

    pub fn tag_add(&self, tag: &str, start: &str, end: &str) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} tag add {} {} {}",
            self.name(),
            ArgValue::from(tag).render(),
            ArgValue::from(start).render(),
            ArgValue::from(end).render()
        ))?;
        Ok(self)
    }

    pub fn tag_remove(&self, tag: &str, start: &str, end: &str) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} tag remove {} {} {}",
            self.name(),
            ArgValue::from(tag).render(),
            ArgValue::from(start).render(),
            ArgValue::from(end).render()
        ))?;
        Ok(self)
    }

    pub fn tag_config(&self, tag: &str, options: &Options) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} tag configure {}{}",
            self.name(),
            ArgValue::from(tag).render(),
            render_options(options)
        ))?;
        Ok(self)
    }

    pub fn mark_set(&self, mark: &str, index: &str) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} mark set {} {}",
            self.name(),
            ArgValue::from(mark).render(),
            ArgValue::from(index).render()
        ))?;
        Ok(self)
    }

    pub fn mark_unset(&self, mark: &str) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} mark unset {}",
            self.name(),
            ArgValue::from(mark).render()
        ))?;
        Ok(self)
    }
}

impl Canvas {
    fn create(&self, kind: &str, coords: &[i64], options: &Options) -> TkResult<String> {
        let coords: Vec<String> = coords.iter().map(ToString::to_string).collect();
        self.interp().evaluate(&format!(
            "{} create {kind} {}{}",
            self.name(),
            coords.join(" "),
            render_options(options)
        ))
    }

    /// Draw a line; returns the item id
    pub fn create_line(&self, x1: i64, y1: i64, x2: i64, y2: i64, options: &Options) -> TkResult<String> {
        self.create("line", &[x1, y1, x2, y2], options)
    }

    pub fn create_rectangle(&self, x1: i64, y1: i64, x2: i64, y2: i64, options: &Options) -> TkResult<String> {
        self.create("rectangle", &[x1, y1, x2, y2], options)
    }

    pub fn create_oval(&self, x1: i64, y1: i64, x2: i64, y2: i64, options: &Options) -> TkResult<String> {
        self.create("oval", &[x1, y1, x2, y2], options)
    }

    pub fn create_arc(&self, x1: i64, y1: i64, x2: i64, y2: i64, options: &Options) -> TkResult<String> {
        self.create("arc", &[x1, y1, x2, y2], options)
    }

    pub fn create_polygon(&self, coords: &[i64], options: &Options) -> TkResult<String> {
        self.create("polygon", coords, options)
    }

    pub fn create_text(&self, x: i64, y: i64, options: &Options) -> TkResult<String> {
        self.create("text", &[x, y], options)
    }

    /// Embed another widget at `(x, y)`
    pub fn create_window(&self, x: i64, y: i64, widget: &Widget, options: &Options) -> TkResult<String> {
        let mut options = options.clone();
        options.insert("window".into(), ArgValue::from(widget.name()));
        self.create("window", &[x, y], &options)
    }

    pub fn itemconfig(&self, item: &str, options: &Options) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} itemconfigure {}{}",
            self.name(),
            ArgValue::from(item).render(),
            render_options(options)
        ))?;
        Ok(self)
    }

    /// Move an item (or every item with a tag) by a delta
    pub fn move_item(&self, item: &str, dx: i64, dy: i64) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} move {} {dx} {dy}",
            self.name(),
            ArgValue::from(item).render()
        ))?;
        Ok(self)
    }

    pub fn moveto(&self, item: &str, x: i64, y: i64) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} moveto {} {x} {y}",
            self.name(),
            ArgValue::from(item).render()
        ))?;
        Ok(self)
    }

    /// Replace an item's coordinates
    pub fn coords(&self, item: &str, coords: &[i64]) -> TkResult<&Self> {
        let coords: Vec<String> = coords.iter().map(ToString::to_string).collect();
        self.interp().evaluate(&format!(
            "{} coords {} {}",
            self.name(),
            ArgValue::from(item).render(),
            coords.join(" ")
        ))?;
        Ok(self)
    }

    pub fn addtag(&self, tag: &str, search: &str) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} addtag {} {search}",
            self.name(),
            ArgValue::from(tag).render()
        ))?;
        Ok(self)
    }

    pub fn dtag(&self, item: &str, tag: &str) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} dtag {} {}",
            self.name(),
            ArgValue::from(item).render(),
            ArgValue::from(tag).render()
        ))?;
        Ok(self)
    }

    /// Delete an item, a tag, or `all`
    pub fn delete(&self, item: &str) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} delete {}",
            self.name(),
            ArgValue::from(item).render()
        ))?;
        Ok(self)
    }

    /// Ids of every item, in stacking order
    pub fn find_all(&self) -> TkResult<Vec<String>> {
        self.interp()
            .evaluate(&format!("{} find all", self.name()))
            .map(|s| split_words(&s))
    }
}

impl Listbox {
    /// Insert rows before `index` (`end` appends)
    pub fn insert(&self, index: &str, items: &[&str]) -> TkResult<&Self> {
        let items: Vec<String> = items.iter().map(|i| ArgValue::from(*i).render()).collect();
        self.interp().evaluate(&format!(
            "{} insert {} {}",
            self.name(),
            ArgValue::from(index).render(),
            items.join(" ")
        ))?;
        Ok(self)
    }

    pub fn erase(&self, first: &str, last: &str) -> TkResult<&Self> {
        self.interp().evaluate(&format!(
            "{} delete {} {}",
            self.name(),
            ArgValue::from(first).render(),
            ArgValue::from(last).render()
        ))?;
        Ok(self)
    }

    pub fn get(&self, index: usize) -> TkResult<String> {
        self.interp().evaluate(&format!("{} get {index}", self.name()))
    }

    pub fn size(&self) -> TkResult<i64> {
        self.interp()
            .evaluate(&format!("{} size", self.name()))
            .map(|s| parse_int(&s))
    }

    pub fn yscrollcommand(&self, f: impl Fn(&str) + 'static) -> TkResult<&Self> {
        self.set_option_callback("yscrollcommand", "yscroll_cb", Callback::string(f))?;
        Ok(self)
    }

    /// Replace every row at once through `-listvariable`-free configuration
    pub fn set_items(&self, items: &[&str]) -> TkResult<&Self> {
        self.erase("0", "end")?.insert("end", items)
    }
}

/// Menu bar or popup menu
#[derive(Debug)]
pub struct Menu {
    widget: Widget,
    entries: Cell<u64>,
}

impl Menu {
    pub fn new(parent: &Widget, options: &Options) -> TkResult<Self> {
        let widget = Widget::create(parent.interp(), parent.name(), "menu", "menu", options)?;
        Ok(Self {
            widget,
            entries: Cell::new(0),
        })
    }

    /// Append a command entry that runs `f`
    pub fn add_command(&self, label: &str, f: impl Fn() + 'static) -> TkResult<CallbackId> {
        let n = self.entries.get();
        self.entries.set(n + 1);
        let name = format!("{}_menu_cb_{n}", sanitize(self.widget.name()));
        let interp = self.widget.interp();
        let id = interp.register_callback(&name, Callback::void(f));
        if let Err(err) = interp.evaluate(&format!(
            "{} add command -label {} -command {name}",
            self.widget.name(),
            ArgValue::from(label).render()
        )) {
            interp.unregister_callback(id);
            return Err(err);
        }
        Ok(self.widget.track(id))
    }

    /// Append a submenu entry
    pub fn add_cascade(&self, label: &str, submenu: &Menu) -> TkResult<&Self> {
        self.widget.interp().evaluate(&format!(
            "{} add cascade -label {} -menu {}",
            self.widget.name(),
            ArgValue::from(label).render(),
            submenu.name()
        ))?;
        Ok(self)
    }

    pub fn add_separator(&self) -> TkResult<&Self> {
        self.widget
            .interp()
            .evaluate(&format!("{} add separator", self.widget.name()))?;
        Ok(self)
    }

    /// Remove the entry at `index`
    pub fn delete_item(&self, index: &str) -> TkResult<&Self> {
        self.widget.interp().evaluate(&format!(
            "{} delete {}",
            self.widget.name(),
            ArgValue::from(index).render()
        ))?;
        Ok(self)
    }

    /// Run the entry at `index`
    pub fn invoke(&self, index: usize) -> TkResult<()> {
        self.widget
            .interp()
            .evaluate(&format!("{} invoke {index}", self.widget.name()))
            .map(drop)
    }

    pub fn destroy(self) -> TkResult<()> {
        self.widget.destroy()
    }
}

impl std::ops::Deref for Menu {
    type Target = Widget;

    fn deref(&self) -> &Widget {
        &self.widget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TkConfig;
    use crate::interp::Interp;
    use crate::options;
    use crate::runtime::HeadlessRuntime;
    use crate::var::{BooleanVar, IntVar, StringVar};
    use crate::window::Root;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup() -> (Rc<HeadlessRuntime>, Interp, Root) {
        let runtime = Rc::new(HeadlessRuntime::new());
        let interp = Interp::new(runtime.clone(), TkConfig::default()).unwrap();
        let root = Root::new(&interp).unwrap();
        (runtime, interp, root)
    }

    #[test]
    fn test_button_command() {
        let (rt, _interp, root) = setup();
        let clicks = Rc::new(Cell::new(0));
        let sink = clicks.clone();
        let button = Button::new(&root).unwrap();
        button.text("Go").unwrap().command(move || sink.set(sink.get() + 1)).unwrap();

        assert_eq!(button.name(), format!(".button{}", button.id()));
        assert_eq!(rt.widget_option(button.name(), "text").as_deref(), Some("Go"));
        button.invoke().unwrap();
        button.invoke().unwrap();
        assert_eq!(clicks.get(), 2);
    }

    #[test]
    fn test_checkbutton_with_var() {
        let (_rt, interp, root) = setup();
        let var = BooleanVar::new(&interp).unwrap();
        let check = Checkbutton::new(&root).unwrap();
        check.text("Enabled").unwrap().variable(&var).unwrap();

        check.invoke().unwrap();
        assert!(var.get());
        check.deselect().unwrap();
        assert!(!var.get());
        check.toggle().unwrap();
        assert!(var.get());
    }

    #[test]
    fn test_radiobuttons_share_var() {
        let (_rt, interp, root) = setup();
        let choice = StringVar::new(&interp).unwrap();
        let small = Radiobutton::new(&root).unwrap();
        small.value("small").unwrap().variable(&choice).unwrap();
        let large = Radiobutton::new(&root).unwrap();
        large.value("large").unwrap().variable(&choice).unwrap();

        large.select().unwrap();
        assert_eq!(choice.get(), "large");
        small.invoke().unwrap();
        assert_eq!(choice.get(), "small");
    }

    #[test]
    fn test_entry_editing() {
        let (_rt, interp, root) = setup();
        let text = StringVar::new(&interp).unwrap();
        let entry = Entry::new(&root).unwrap();
        entry.textvariable(&text).unwrap();

        entry.insert("end", "hello").unwrap().insert("end", " world").unwrap();
        assert_eq!(entry.get().unwrap(), "hello world");
        assert_eq!(text.get(), "hello world");
        entry.erase("0", Some("6")).unwrap();
        assert_eq!(entry.get().unwrap(), "world");
        entry.set("a \"quoted\" [value]").unwrap();
        assert_eq!(text.get(), "a \"quoted\" [value]");
    }

    #[test]
    fn test_scale_command_receives_value() {
        let (_rt, interp, root) = setup();
        let level = IntVar::new(&interp).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let scale = Scale::new(&root).unwrap();
        scale
            .from(0.0)
            .unwrap()
            .to(10.0)
            .unwrap()
            .variable(&level)
            .unwrap()
            .command(move |v| sink.borrow_mut().push(v))
            .unwrap();

        scale.set(4.0).unwrap();
        assert_eq!(*seen.borrow(), vec![4.0]);
        assert!((scale.get().unwrap() - 4.0).abs() < f64::EPSILON);
        assert_eq!(level.get(), 4);
    }

    #[test]
    fn test_text_and_scroll_callbacks() {
        let (_rt, interp, root) = setup();
        let text = Text::new(&root).unwrap();
        text.insert("end", "line one\nline two").unwrap();
        assert_eq!(text.content().unwrap(), "line one\nline two");
        assert_eq!(text.get("2.0", "2.4").unwrap(), "line");
        text.erase("1.0", "2.0").unwrap();
        assert_eq!(text.content().unwrap(), "line two");

        let seen = Rc::new(RefCell::new(String::new()));
        let sink = seen.clone();
        text.yscrollcommand(move |view| *sink.borrow_mut() = view.to_string()).unwrap();
        let callback = format!("{}_yscroll_cb", sanitize(text.name()));
        interp.evaluate(&format!("{callback} 0.0 0.5")).unwrap();
        assert_eq!(*seen.borrow(), "0.0 0.5");

        let bar = Scrollbar::new(&root).unwrap();
        bar.orient("vertical").unwrap();
        bar.set(0.25, 0.75).unwrap();
        assert_eq!(bar.get().unwrap(), (0.25, 0.75));
    }

    #[test]
    fn test_canvas_items() {
        let (_rt, _interp, root) = setup();
        let canvas = Canvas::new(&root).unwrap();
        canvas.width(200).unwrap().height(100).unwrap();
        let line = canvas.create_line(0, 0, 10, 10, &options! { "fill" => "red" }).unwrap();
        let rect = canvas.create_rectangle(5, 5, 20, 20, &options! {}).unwrap();
        let label = canvas.create_text(50, 50, &options! { "text" => "hi" }).unwrap();
        assert_eq!(canvas.find_all().unwrap(), vec![line.clone(), rect.clone(), label]);

        canvas.move_item(&rect, 5, 5).unwrap().coords(&line, &[1, 1, 2, 2]).unwrap();
        canvas.itemconfig(&rect, &options! { "outline" => "blue" }).unwrap();
        canvas.delete(&line).unwrap();
        assert_eq!(canvas.find_all().unwrap().len(), 2);
        canvas.delete("all").unwrap();
        assert!(canvas.find_all().unwrap().is_empty());
    }

    #[test]
    fn test_listbox_rows() {
        let (_rt, _interp, root) = setup();
        let list = Listbox::new(&root).unwrap();
        list.insert("end", &["alpha", "beta gamma", "delta"]).unwrap();
        assert_eq!(list.size().unwrap(), 3);
        assert_eq!(list.get(1).unwrap(), "beta gamma");
        list.erase("0", "0").unwrap();
        assert_eq!(list.get(0).unwrap(), "beta gamma");
        list.set_items(&["one"]).unwrap();
        assert_eq!(list.size().unwrap(), 1);
    }

    #[test]
    fn test_menu_commands() {
        let (_rt, interp, root) = setup();
        let menu = Menu::new(&root, &options! { "tearoff" => 0 }).unwrap();
        let opened = Rc::new(Cell::new(false));
        let sink = opened.clone();
        menu.add_command("Open", move || sink.set(true)).unwrap();
        menu.add_separator().unwrap();
        let quit = menu.add_command("Quit", || {}).unwrap();
        assert_eq!(
            interp.callback_name(quit),
            Some(format!("{}_menu_cb_1", sanitize(menu.name())))
        );

        menu.invoke(0).unwrap();
        assert!(opened.get());
        root.config_one("menu", menu.name()).unwrap();
        menu.destroy().unwrap();
        assert!(!interp.has_callback(quit));
    }

    #[test]
    fn test_spinbox_steps() {
        let (_rt, interp, root) = setup();
        let count = StringVar::new(&interp).unwrap();
        let spin = Spinbox::new(&root).unwrap();
        spin.from(0.0).unwrap().to(3.0).unwrap().increment(1.0).unwrap();
        spin.textvariable(&count).unwrap();
        interp.evaluate(&format!("{} invoke buttonup", spin.name())).unwrap();
        assert_eq!(count.get(), "1");
        spin.set("3").unwrap();
        assert_eq!(spin.get().unwrap(), "3");
    }
}
