pub mod normalize;
pub use normalize::*;

pub mod flat_table;
pub use flat_table::*;

pub mod csv_export;
pub use csv_export::*;

pub mod result_flattener;
pub use result_flattener::*;
