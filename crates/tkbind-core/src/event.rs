//! Interaction events delivered to bound closures

use crate::value::parse_int;

/// Substitution tokens appended to every bound callback, in payload order:
/// local x/y, root x/y, source widget, key symbol, key code, character,
/// event type
pub const BIND_PAYLOAD: &str = "%x %y %X %Y %W %K %k %c %t";

/// A structured interaction event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    /// Pointer x relative to the widget
    pub x: i32,
    /// Pointer y relative to the widget
    pub y: i32,
    /// Pointer x relative to the screen
    pub x_root: i32,
    /// Pointer y relative to the screen
    pub y_root: i32,
    /// Full name of the widget that received the event
    pub widget: String,
    /// Key symbol, e.g. `Return`
    pub keysym: String,
    /// Numeric key code
    pub keycode: i32,
    /// Character produced by the key, if any
    pub character: String,
    /// Event type as reported by the runtime
    pub kind: String,
}

impl Event {
    /// Parse the positional payload produced by [`BIND_PAYLOAD`].
    ///
    /// Parsing never fails: missing or malformed numeric fields become zero
    /// and missing text fields become empty.
    #[must_use]
    pub fn from_args(args: &[String]) -> Self {
        let text = |i: usize| args.get(i).cloned().unwrap_or_default();
        let num = |i: usize| args.get(i).map_or(0, |s| clamp_i32(parse_int(s)));

        Self {
            x: num(0),
            y: num(1),
            x_root: num(2),
            y_root: num(3),
            widget: text(4),
            keysym: text(5),
            keycode: num(6),
            character: text(7),
            kind: text(8),
        }
    }
}

fn clamp_i32(v: i64) -> i32 {
    i32::try_from(v).unwrap_or(if v < 0 { i32::MIN } else { i32::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_full_payload() {
        let e = Event::from_args(&args(&["3", "4", "103", "204", ".b1", "Return", "36", "\r", "KeyPress"]));
        assert_eq!((e.x, e.y, e.x_root, e.y_root), (3, 4, 103, 204));
        assert_eq!(e.widget, ".b1");
        assert_eq!(e.keysym, "Return");
        assert_eq!(e.keycode, 36);
        assert_eq!(e.kind, "KeyPress");
    }

    #[test]
    fn test_sentinels_become_zero() {
        let e = Event::from_args(&args(&["??", "", "abc", "??", ".w", "??", "??"]));
        assert_eq!((e.x, e.y, e.x_root, e.y_root, e.keycode), (0, 0, 0, 0, 0));
        assert_eq!(e.keysym, "??");
        assert_eq!(e.character, "");
        assert_eq!(e.kind, "");
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(Event::from_args(&[]), Event::default());
    }
}
