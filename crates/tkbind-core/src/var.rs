//! Typed bindings to runtime global variables
//!
//! A [`Var`] owns a uniquely named global slot (`int_var_12`). Widgets are
//! linked to it by passing the var as their `variable` or `textvariable`
//! option; both sides then see every write.

use std::marker::PhantomData;

use crate::callback::{TraceCallback, TraceId};
use crate::error::TkResult;
use crate::ident::{next_id, ObjectId};
use crate::interp::Interp;
use crate::value::{format_double, parse_double, parse_int, ArgValue};

/// A value type that can live in a runtime variable
pub trait VarValue: Sized + 'static {
    /// Prefix of generated variable names
    const TAG: &'static str;

    /// Text written when the variable is created
    const INITIAL: &'static str;

    /// Parse runtime text; never fails
    fn from_text(text: &str) -> Self;

    /// Render for the runtime
    fn to_text(&self) -> String;
}

impl VarValue for String {
    const TAG: &'static str = "string";
    const INITIAL: &'static str = "";

    fn from_text(text: &str) -> Self {
        text.to_string()
    }

    fn to_text(&self) -> String {
        self.clone()
    }
}

impl VarValue for bool {
    const TAG: &'static str = "bool";
    const INITIAL: &'static str = "0";

    fn from_text(text: &str) -> Self {
        text.trim() == "1"
    }

    fn to_text(&self) -> String {
        if *self { "1" } else { "0" }.to_string()
    }
}

impl VarValue for i64 {
    const TAG: &'static str = "int";
    const INITIAL: &'static str = "0";

    fn from_text(text: &str) -> Self {
        parse_int(text)
    }

    fn to_text(&self) -> String {
        self.to_string()
    }
}

impl VarValue for f64 {
    const TAG: &'static str = "double";
    const INITIAL: &'static str = "0.0";

    fn from_text(text: &str) -> Self {
        parse_double(text)
    }

    fn to_text(&self) -> String {
        format_double(*self)
    }
}

/// A runtime global variable holding a `T`
pub struct Var<T: VarValue> {
    id: ObjectId,
    name: String,
    interp: Interp,
    _marker: PhantomData<T>,
}

pub type StringVar = Var<String>;
pub type BooleanVar = Var<bool>;
pub type IntVar = Var<i64>;
pub type DoubleVar = Var<f64>;

impl<T: VarValue> Var<T> {
    /// Create the variable holding the type's initial text
    pub fn new(interp: &Interp) -> TkResult<Self> {
        let var = Self::unset(interp);
        var.set_text(T::INITIAL)?;
        Ok(var)
    }

    /// Create the variable holding `value`
    pub fn with_value(interp: &Interp, value: &T) -> TkResult<Self> {
        let var = Self::unset(interp);
        var.set(value)?;
        Ok(var)
    }

    fn unset(interp: &Interp) -> Self {
        let id = next_id();
        Self {
            id,
            name: format!("{}_var_{id}", T::TAG),
            interp: interp.clone(),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Runtime variable name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn get(&self) -> T {
        T::from_text(&self.get_text())
    }

    pub fn set(&self, value: &T) -> TkResult<()> {
        self.set_text(&value.to_text())
    }

    /// Raw runtime text; empty when the variable was unset
    #[must_use]
    pub fn get_text(&self) -> String {
        self.interp.get_var_or_empty(&self.name)
    }

    pub fn set_text(&self, text: &str) -> TkResult<()> {
        self.interp.set_var(&self.name, text)
    }

    /// Observe every write, including writes of the value already held
    pub fn trace(&self, f: impl Fn(T) + 'static) -> TraceId {
        self.interp
            .trace_var(&self.name, TraceCallback::string(move |text| f(T::from_text(text))))
    }

    /// Remove an observer installed with [`Var::trace`]
    pub fn untrace(&self, id: TraceId) -> bool {
        self.interp.untrace(id)
    }
}

impl<T: VarValue> From<&Var<T>> for ArgValue {
    fn from(var: &Var<T>) -> Self {
        ArgValue::Str(var.name.clone())
    }
}

impl<T: VarValue> std::fmt::Debug for Var<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Var").field("name", &self.name).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_names_and_defaults() {
        let interp = Interp::headless().unwrap();
        let s = StringVar::new(&interp).unwrap();
        let b = BooleanVar::new(&interp).unwrap();
        let i = IntVar::new(&interp).unwrap();
        let d = DoubleVar::new(&interp).unwrap();

        assert_eq!(s.name(), format!("string_var_{}", s.id()));
        assert_eq!(b.name(), format!("bool_var_{}", b.id()));
        assert_eq!(i.name(), format!("int_var_{}", i.id()));
        assert_eq!(d.name(), format!("double_var_{}", d.id()));

        assert_eq!(interp.get_var(s.name()).as_deref(), Some(""));
        assert_eq!(interp.get_var(b.name()).as_deref(), Some("0"));
        assert_eq!(interp.get_var(i.name()).as_deref(), Some("0"));
        assert_eq!(interp.get_var(d.name()).as_deref(), Some("0.0"));
        assert!(d.get().abs() < f64::EPSILON);
    }

    #[test]
    fn test_typed_get_set() {
        let interp = Interp::headless().unwrap();
        let b = BooleanVar::new(&interp).unwrap();
        b.set(&true).unwrap();
        assert_eq!(b.get_text(), "1");
        assert!(b.get());

        let d = DoubleVar::with_value(&interp, &1.5).unwrap();
        assert_eq!(d.get_text(), "1.500000");
        assert!((d.get() - 1.5).abs() < f64::EPSILON);

        let i = IntVar::new(&interp).unwrap();
        i.set_text("not a number").unwrap();
        assert_eq!(i.get(), 0);
        assert!(interp.evaluate(&format!("incr {} 5", i.name())).is_err());
        i.set(&0).unwrap();
        interp.evaluate(&format!("incr {} 5", i.name())).unwrap();
        assert_eq!(i.get(), 5);
    }

    #[test]
    fn test_trace_sees_every_write() {
        let interp = Interp::headless().unwrap();
        let v = StringVar::new(&interp).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = v.trace(move |value| sink.borrow_mut().push(value));

        v.set(&"a".to_string()).unwrap();
        v.set(&"a".to_string()).unwrap();
        interp.evaluate(&format!("set {} b", v.name())).unwrap();
        assert_eq!(*seen.borrow(), vec!["a", "a", "b"]);

        assert!(v.untrace(id));
        v.set(&"c".to_string()).unwrap();
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn test_renders_as_name() {
        let interp = Interp::headless().unwrap();
        let v = IntVar::new(&interp).unwrap();
        assert_eq!(ArgValue::from(&v).render(), format!("\"{}\"", v.name()));
    }
}
