pub mod option_item;
pub use option_item::*;

pub mod option_filter;
pub use option_filter::*;

pub mod field_options;
pub use field_options::*;
