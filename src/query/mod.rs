pub mod value_formatter;
pub use value_formatter::*;

pub mod operators;
pub use operators::*;

pub mod where_clause;
pub use where_clause::*;

pub mod query_assembler;
pub use query_assembler::*;
