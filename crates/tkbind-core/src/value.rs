//! Protocol-safe marshaling of typed values into command text
//!
//! Every option value passed to the runtime goes through [`ArgValue::render`],
//! which guarantees that the runtime's parser reads back exactly the value
//! that was written. Numeric text coming back from the runtime is parsed with
//! [`parse_int`] / [`parse_double`], which never fail: the runtime answers
//! `??` or an empty string when a value is not available yet.

use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Characters the runtime's command parser treats specially inside a
/// double-quoted word
const PROTOCOL_SPECIALS: [char; 7] = ['"', '\\', '$', '[', ']', '{', '}'];

/// The runtime's "value not known yet" answer for numeric queries
pub const UNKNOWN_SENTINEL: &str = "??";

/// A typed value to be rendered as a single protocol word
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ArgValue {
    /// No value; renders as empty output
    #[default]
    None,
    /// Text, rendered quoted and escaped
    Str(String),
    /// Integer, rendered in decimal
    Int(i64),
    /// Floating point, rendered in fixed six-decimal notation
    Double(f64),
    /// Boolean, rendered as `1` / `0`
    Bool(bool),
}

impl ArgValue {
    /// Render the value as protocol text
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Str(s) => format!("\"{}\"", escape(s)),
            Self::Int(i) => i.to_string(),
            Self::Double(d) => format_double(*d),
            Self::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        }
    }

    /// Whether this is the "no value" variant
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Borrow the text payload, if any
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&String> for ArgValue {
    fn from(s: &String) -> Self {
        Self::Str(s.clone())
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for ArgValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<usize> for ArgValue {
    fn from(v: usize) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::None, Into::into)
    }
}

/// Ordered option map; keys are option names without the leading dash
pub type Options = BTreeMap<String, ArgValue>;

/// Build an [`Options`] map
///
/// ```
/// use tkbind::options;
/// let opts = options! { "x" => 10, "text" => "hello" };
/// assert_eq!(opts.len(), 2);
/// ```
#[macro_export]
macro_rules! options {
    () => { $crate::value::Options::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::value::Options::new();
        $( map.insert(::std::string::String::from($key), $crate::value::ArgValue::from($value)); )+
        map
    }};
}

/// Backslash-escape every protocol-significant character
#[must_use]
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if PROTOCOL_SPECIALS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Format a floating-point value the way the runtime expects
#[must_use]
pub fn format_double(v: f64) -> String {
    format!("{v:.6}")
}

/// Render an option map as ` -key value` pairs; entries holding
/// [`ArgValue::None`] are left out
#[must_use]
pub fn render_options(options: &Options) -> String {
    let mut out = String::new();
    for (key, value) in options.iter().filter(|(_, v)| !v.is_none()) {
        let _ = write!(out, " -{} {}", key, value.render());
    }
    out
}

/// Parse runtime integer text; empty, `??` and malformed text yield zero
#[must_use]
pub fn parse_int(s: &str) -> i64 {
    let s = s.trim();
    if s.is_empty() || s == UNKNOWN_SENTINEL {
        return 0;
    }
    s.parse().unwrap_or(0)
}

/// Parse runtime floating-point text; empty, `??` and malformed text yield zero
#[must_use]
pub fn parse_double(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() || s == UNKNOWN_SENTINEL {
        return 0.0;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Replace every character that is not ASCII alphanumeric with `_`
#[must_use]
pub fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Format items as one runtime list, escaping whitespace and specials so
/// each item stays a single element
#[must_use]
pub fn list_text<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let item = item.as_ref();
        if item.is_empty() {
            out.push_str("{}");
            continue;
        }
        for c in item.chars() {
            match c {
                '\n' => out.push_str("\\n"),
                '\t' => out.push_str("\\t"),
                ' ' | ';' => {
                    out.push('\\');
                    out.push(c);
                }
                c if PROTOCOL_SPECIALS.contains(&c) => {
                    out.push('\\');
                    out.push(c);
                }
                c => out.push(c),
            }
        }
    }
    out
}

/// Split a whitespace-separated runtime result into words
#[must_use]
pub fn split_words(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}
