pub mod elements;
pub mod registry;
pub mod value;

pub use registry::{Element, ElementRegistry};
pub use value::{
    Command, ValueComponent, parse_command, sum_color_components, sum_number_components,
};
