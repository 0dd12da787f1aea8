use crate::{
    error::Result,
    visitors::{
        in_memory::InMemoryFilter,
        pushdown::{PushdownOracle, extract_pushdown},
        verifier::should_execute_in_memory,
    },
};
use filter_syntax::FilterExpression;
use model::{access::FieldAccessor, core::value::Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// How one request's filter is divided between the store and process memory.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterSplit {
    /// Handed to the store query builder.
    pub store: Option<FilterExpression>,
    /// Evaluated over the instances the store returns. Always the whole expression when set.
    pub in_memory: Option<FilterExpression>,
}

impl FilterSplit {
    pub fn is_store_only(&self) -> bool {
        self.in_memory.is_none()
    }
}

/// Split `expr` for execution.
///
/// With `filter_in_memory` nothing is pushed down.
pub fn split_filter_expression(
    expr: &FilterExpression,
    oracle: &dyn PushdownOracle,
    filter_in_memory: bool,
) -> FilterSplit {
    if filter_in_memory {
        debug!("Filtering {} entirely in memory", expr);
        return FilterSplit {
            store: None,
            in_memory: Some(expr.clone()),
        };
    }

    let store = extract_pushdown(expr, oracle);
    let in_memory = should_execute_in_memory(expr, oracle).then(|| expr.clone());
    debug!(
        "Split filter: store={}, in_memory={}",
        store.is_some(),
        in_memory.is_some()
    );
    FilterSplit { store, in_memory }
}

/// Applies the in-memory half of a split to records the store already filtered.
pub struct FilterExecutor {
    accessor: Arc<dyn FieldAccessor>,
}

impl FilterExecutor {
    pub fn new(accessor: Arc<dyn FieldAccessor>) -> Self {
        FilterExecutor { accessor }
    }

    /// Keep the records matching `split.in_memory`; the first evaluation error aborts.
    pub fn apply(&self, records: Vec<Value>, split: &FilterSplit) -> Result<Vec<Value>> {
        let Some(filter) = self.compile(split)? else {
            return Ok(records);
        };
        let mut kept = Vec::with_capacity(records.len());
        for record in records {
            if filter.matches(&record)? {
                kept.push(record);
            }
        }
        Ok(kept)
    }

    /// Like [`apply`](Self::apply), but records that fail to evaluate are dropped with a warning.
    pub fn apply_lenient(&self, records: Vec<Value>, split: &FilterSplit) -> Result<Vec<Value>> {
        let Some(filter) = self.compile(split)? else {
            return Ok(records);
        };
        Ok(records
            .into_iter()
            .filter(|record| match filter.matches(record) {
                Ok(matched) => matched,
                Err(err) => {
                    warn!("Dropping record that could not be filtered: {}", err);
                    false
                }
            })
            .collect())
    }

    fn compile(&self, split: &FilterSplit) -> Result<Option<InMemoryFilter>> {
        split
            .in_memory
            .as_ref()
            .map(|expr| InMemoryFilter::compile(expr, Arc::clone(&self.accessor)))
            .transpose()
    }
}
