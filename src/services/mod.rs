pub mod catalog;

pub use catalog::{default_icons, nest_categories};
