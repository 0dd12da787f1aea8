pub mod error;
pub mod eval;
pub mod executor;
pub mod visitors;

pub use error::{FilterError, Result};
pub use eval::resolve::resolve_path;
pub use executor::{FilterExecutor, FilterSplit, split_filter_expression};
pub use visitors::{
    clone::clone_expression,
    extract::{collect_predicates, collect_predicates_ordered},
    in_memory::InMemoryFilter,
    normalize::normalize,
    pushdown::{PushdownOracle, SchemaPushdownOracle, extract_pushdown},
    rescope::{rescope, rescope_all},
    verifier::should_execute_in_memory,
};
