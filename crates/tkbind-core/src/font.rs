//! Named fonts

use crate::error::TkResult;
use crate::ident::{next_id, ObjectId};
use crate::interp::Interp;
use crate::value::{parse_int, render_options, ArgValue, Options};

/// A named font resource; widgets use it through their `font` option
#[derive(Debug)]
pub struct Font {
    id: ObjectId,
    name: String,
    interp: Interp,
}

impl Font {
    /// Create a font from attributes such as `family`, `size` and `weight`
    pub fn new(interp: &Interp, options: &Options) -> TkResult<Self> {
        let id = next_id();
        let name = format!("font_{id}");
        interp.evaluate(&format!("font create {name}{}", render_options(options)))?;
        Ok(Self {
            id,
            name,
            interp: interp.clone(),
        })
    }

    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Change attributes
    pub fn config(&self, options: &Options) -> TkResult<()> {
        self.interp
            .evaluate(&format!("font configure {}{}", self.name, render_options(options)))
            .map(drop)
    }

    fn attribute(&self, key: &str) -> TkResult<String> {
        self.interp.evaluate(&format!("font configure {} -{key}", self.name))
    }

    pub fn family(&self) -> TkResult<String> {
        self.attribute("family")
    }

    /// Size in points; negative values are pixels
    pub fn size(&self) -> TkResult<i64> {
        self.attribute("size").map(|s| parse_int(&s))
    }

    pub fn weight(&self) -> TkResult<String> {
        self.attribute("weight")
    }

    pub fn slant(&self) -> TkResult<String> {
        self.attribute("slant")
    }

    pub fn underline(&self) -> TkResult<bool> {
        self.attribute("underline").map(|s| parse_int(&s) != 0)
    }

    pub fn overstrike(&self) -> TkResult<bool> {
        self.attribute("overstrike").map(|s| parse_int(&s) != 0)
    }

    /// Release the font
    pub fn delete(self) -> TkResult<()> {
        self.interp.evaluate(&format!("font delete {}", self.name)).map(drop)
    }
}

impl From<&Font> for ArgValue {
    fn from(font: &Font) -> Self {
        ArgValue::Str(font.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TkConfig;
    use crate::options;
    use crate::runtime::HeadlessRuntime;
    use crate::widget::{Widget, ROOT_NAME};
    use std::rc::Rc;

    #[test]
    fn test_font_lifecycle() {
        let runtime = Rc::new(HeadlessRuntime::new());
        let interp = Interp::new(runtime.clone(), TkConfig::default()).unwrap();
        let font = Font::new(&interp, &options! { "family" => "Courier", "size" => 12 }).unwrap();

        assert_eq!(font.name(), format!("font_{}", font.id()));
        assert_eq!(font.family().unwrap(), "Courier");
        assert_eq!(font.size().unwrap(), 12);
        assert_eq!(font.weight().unwrap(), "normal");
        assert!(!font.underline().unwrap());

        font.config(&options! { "weight" => "bold", "overstrike" => true }).unwrap();
        assert_eq!(font.weight().unwrap(), "bold");
        assert!(font.overstrike().unwrap());
        assert_eq!(font.slant().unwrap(), "roman");

        let label = Widget::create(&interp, ROOT_NAME, "label", "label", &options! { "font" => &font }).unwrap();
        assert_eq!(label.cget("font").unwrap(), font.name());

        let name = font.name().to_string();
        font.delete().unwrap();
        assert!(!runtime.font_exists(&name));
    }

    #[test]
    fn test_bad_attribute_is_an_error() {
        let interp = Interp::headless().unwrap();
        assert!(Font::new(&interp, &options! { "colour" => "red" }).is_err());
    }
}
