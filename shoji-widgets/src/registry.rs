use fxhash::FxHashMap;
use log::warn;
use shoji_core::{ViewId, Window};

use crate::value::ValueComponent;

/// A markup element under construction: it accumulates attributes by name
/// and instantiates a configured view once attached to a window.
///
/// Unknown attributes are ignored with a log line, never an error.
pub trait Element {
    fn set_attribute(&mut self, name: &str, value: &str);

    fn set_attribute_components(&mut self, name: &str, components: &[ValueComponent]);

    /// Free text content between the element's tags.
    fn set_text(&mut self, text: &str) {
        let _ = text;
    }

    /// Creates the element's view in the window's tree, detached; the
    /// caller attaches it wherever the surrounding markup dictates.
    fn instantiate(&self, window: &mut Window) -> ViewId;
}

type ElementConstructor = fn() -> Box<dyn Element>;

/// Factory-by-name table mapping element type names to constructors.
pub struct ElementRegistry {
    constructors: FxHashMap<String, ElementConstructor>,
}

impl Default for ElementRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementRegistry {
    /// A registry with the standard element types defined.
    pub fn new() -> Self {
        let mut registry = Self {
            constructors: FxHashMap::default(),
        };
        registry.define_element_type("view", || Box::new(crate::elements::ViewElement::new()));
        registry.define_element_type("image", || Box::new(crate::elements::ImageElement::new()));
        registry.define_element_type("text", || Box::new(crate::elements::TextElement::new()));
        registry.define_element_type("button", || Box::new(crate::elements::ButtonElement::new()));
        registry
    }

    pub fn empty() -> Self {
        Self {
            constructors: FxHashMap::default(),
        }
    }

    /// Registers (or replaces) a constructor for `name`.
    pub fn define_element_type(&mut self, name: &str, constructor: ElementConstructor) {
        self.constructors.insert(name.to_owned(), constructor);
    }

    /// Instantiates an element builder by type name.
    pub fn create(&self, name: &str) -> Option<Box<dyn Element>> {
        match self.constructors.get(name) {
            Some(constructor) => Some(constructor()),
            None => {
                warn!("unknown element type {name}");
                None
            }
        }
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }
}
