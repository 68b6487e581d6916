pub mod config;
pub use config::*;

pub mod field_types;
pub use field_types::*;

pub mod field_descriptor;
pub use field_descriptor::*;

pub mod order_by;
pub use order_by::*;

pub mod predicate;
pub use predicate::*;

pub mod selection_state;
pub use selection_state::*;
