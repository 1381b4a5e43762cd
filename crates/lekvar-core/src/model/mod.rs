//! Data model: sections, the section registry and the option store

pub mod registry;
pub mod section;
pub mod store;

pub use registry::{SectionRegistry, validate_section_name};
pub use section::{Directives, OptionView, Section};
pub use store::{OptionKey, OptionStore, OptionValue};
