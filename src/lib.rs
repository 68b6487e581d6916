pub mod selection;
pub use selection::{BuilderConfig, FieldDescriptor, FieldTypeMap, FilterEdit, OrderBy, Predicate, SelectionState, SortDirection};

pub mod query;
pub use query::{OperatorResolver, QueryAssembler, ValueFormatter, WhereClauseCompiler};

pub mod flatten;
pub use flatten::{FlatRow, FlatTable, FlattenOutput, ResultFlattener};

pub mod options;

pub mod shell;
pub use shell::{MetadataService, QueryBuilderSession, QueryService, ServiceError, SessionError};
