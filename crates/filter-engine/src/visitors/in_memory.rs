use crate::{error::Result, eval::operator::CompiledPredicate};
use filter_syntax::FilterExpression;
use model::{access::FieldAccessor, core::value::Value};
use std::{fmt, sync::Arc};

type Matcher = Box<dyn Fn(&dyn FieldAccessor, &Value) -> Result<bool> + Send + Sync>;

/// A filter expression compiled into one callable predicate over instances.
///
/// Compilation checks arity and coerces operands once, so evaluation only reads.
pub struct InMemoryFilter {
    accessor: Arc<dyn FieldAccessor>,
    matcher: Matcher,
}

impl InMemoryFilter {
    pub fn compile(expr: &FilterExpression, accessor: Arc<dyn FieldAccessor>) -> Result<Self> {
        Ok(InMemoryFilter {
            accessor,
            matcher: compile(expr)?,
        })
    }

    pub fn matches(&self, instance: &Value) -> Result<bool> {
        (self.matcher)(self.accessor.as_ref(), instance)
    }
}

impl fmt::Debug for InMemoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryFilter").finish_non_exhaustive()
    }
}

// Both sides of AND/OR are always evaluated.
fn compile(expr: &FilterExpression) -> Result<Matcher> {
    let matcher: Matcher = match expr {
        FilterExpression::Predicate(predicate) => {
            let compiled = CompiledPredicate::new(predicate)?;
            Box::new(
                move |accessor: &dyn FieldAccessor, instance: &Value| -> Result<bool> {
                    compiled.test(accessor, instance)
                },
            )
        }
        FilterExpression::And(left, right) => {
            let (left, right) = (compile(left)?, compile(right)?);
            Box::new(
                move |accessor: &dyn FieldAccessor, instance: &Value| -> Result<bool> {
                    let l = left(accessor, instance)?;
                    let r = right(accessor, instance)?;
                    Ok(l & r)
                },
            )
        }
        FilterExpression::Or(left, right) => {
            let (left, right) = (compile(left)?, compile(right)?);
            Box::new(
                move |accessor: &dyn FieldAccessor, instance: &Value| -> Result<bool> {
                    let l = left(accessor, instance)?;
                    let r = right(accessor, instance)?;
                    Ok(l | r)
                },
            )
        }
        FilterExpression::Not(operand) => {
            let operand = compile(operand)?;
            Box::new(
                move |accessor: &dyn FieldAccessor, instance: &Value| -> Result<bool> {
                    Ok(!operand(accessor, instance)?)
                },
            )
        }
    };
    Ok(matcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filter_syntax::{FilterPredicate, Operator, Path, PathSegment};
    use model::{access::RecordAccessor, core::data_type::DataType, records::record::Record};

    fn name_path() -> Path {
        Path::from_segment(PathSegment::new("author", "name", DataType::String))
    }

    fn author(name: Value) -> Value {
        let mut record = Record::new("author", vec![]);
        record.set("name", name);
        Value::Record(record)
    }

    #[test]
    fn test_infix_against_instance() {
        let expr = FilterPredicate::infix(name_path(), "For").into();
        let filter = InMemoryFilter::compile(&expr, Arc::new(RecordAccessor)).unwrap();
        assert!(filter.matches(&author(Value::string("AuthorForTest"))).unwrap());
        assert!(!filter.matches(&author(Value::Null)).unwrap());
    }

    #[test]
    fn test_operands_are_coerced_at_compile_time() {
        let age = Path::from_segment(PathSegment::new("author", "age", DataType::Int));
        let expr = FilterPredicate::single(age.clone(), Operator::Gt, "40").into();
        let filter = InMemoryFilter::compile(&expr, Arc::new(RecordAccessor)).unwrap();
        let record = Value::Record(Record::new("author", vec![]).with_field("age", 41_i64));
        assert!(filter.matches(&record).unwrap());

        let bad = FilterPredicate::single(age, Operator::Gt, "forty").into();
        assert!(InMemoryFilter::compile(&bad, Arc::new(RecordAccessor)).is_err());
    }

    #[test]
    fn test_composites() {
        let herbert = FilterExpression::from(FilterPredicate::single(
            name_path(),
            Operator::In,
            "Herbert",
        ));
        let asimov =
            FilterExpression::from(FilterPredicate::single(name_path(), Operator::In, "Asimov"));
        let expr = FilterExpression::and(
            FilterExpression::or(herbert.clone(), asimov),
            FilterExpression::not(herbert),
        );
        let filter = InMemoryFilter::compile(&expr, Arc::new(RecordAccessor)).unwrap();
        assert!(filter.matches(&author(Value::string("Asimov"))).unwrap());
        assert!(!filter.matches(&author(Value::string("Herbert"))).unwrap());
        assert!(!filter.matches(&author(Value::string("Verne"))).unwrap());
    }

    #[test]
    fn test_access_errors_propagate() {
        let expr = FilterPredicate::infix(name_path(), "x").into();
        let filter = InMemoryFilter::compile(&expr, Arc::new(RecordAccessor)).unwrap();
        assert!(filter.matches(&Value::Int(3)).is_err());
    }

    #[test]
    fn test_filter_is_shareable_across_threads() {
        let expr = FilterPredicate::infix(name_path(), "o").into();
        let filter = Arc::new(InMemoryFilter::compile(&expr, Arc::new(RecordAccessor)).unwrap());
        let handles: Vec<_> = ["Bob", "Amy"]
            .into_iter()
            .map(|name| {
                let filter = Arc::clone(&filter);
                std::thread::spawn(move || filter.matches(&author(Value::string(name))).unwrap())
            })
            .collect();
        let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, vec![true, false]);
    }
}
