mod common;

use common::{books, library_schema, rsql};
use filter_engine::{
    InMemoryFilter, PushdownOracle, SchemaPushdownOracle, extract_pushdown, normalize,
    should_execute_in_memory,
};
use filter_syntax::FilterPredicate;
use model::access::RecordAccessor;
use std::sync::Arc;

fn oracle() -> SchemaPushdownOracle {
    SchemaPushdownOracle::new(library_schema())
}

fn pushed(text: &str) -> Option<String> {
    extract_pushdown(&rsql(text), &oracle()).map(|expr| expr.to_string())
}

#[test]
fn test_computed_fields_stay_in_memory() {
    let oracle = oracle();
    let score = rsql("score=gt=4");
    let score_leaf = score.as_predicate().unwrap();
    assert!(!oracle.is_pushdown_eligible(score_leaf));
    assert!(oracle.is_pushdown_eligible(rsql("title==Dune").as_predicate().unwrap()));
    assert!(should_execute_in_memory(&score, &oracle));
    assert_eq!(extract_pushdown(&score, &oracle), None);
}

#[test]
fn test_and_keeps_eligible_side() {
    assert_eq!(
        pushed("genre==scifi;score=gt=4"),
        Some("book.genre IN [scifi]".to_string())
    );
    assert_eq!(
        pushed("genre==scifi;year>1960"),
        Some("(book.genre IN [scifi] AND book.year GT [1960])".to_string())
    );
}

#[test]
fn test_or_needs_both_sides() {
    assert_eq!(pushed("genre==scifi,score=gt=4"), None);
    assert_eq!(
        pushed("(genre==scifi;score=gt=4),year<1900"),
        Some("(book.genre IN [scifi] OR book.year LT [1900])".to_string())
    );
}

#[test]
fn test_not_of_partial_is_dropped() {
    let expr = filter_syntax::FilterExpression::not(rsql("genre==scifi;score=gt=4"));
    assert_eq!(extract_pushdown(&expr, &oracle()), None);

    let normalized = normalize(&expr).unwrap();
    assert_eq!(
        extract_pushdown(&normalized, &oracle()).map(|e| e.to_string()),
        None
    );

    let full = filter_syntax::FilterExpression::not(rsql("genre==scifi;year>1960"));
    assert!(extract_pushdown(&full, &oracle()).is_some());
}

#[test]
fn test_pushdown_is_implied_by_the_original() {
    let accessor = Arc::new(RecordAccessor);
    for text in [
        "genre==scifi;score=gt=4.5",
        "(genre==scifi;score=gt=4.5),year<1900",
        "tags=hasmember=classic;(score<4,authors.name==*Asimov)",
    ] {
        let original = rsql(text);
        let Some(store) = extract_pushdown(&original, &oracle()) else {
            continue;
        };
        let full = InMemoryFilter::compile(&original, accessor.clone()).unwrap();
        let weaker = InMemoryFilter::compile(&store, accessor.clone()).unwrap();
        for book in books() {
            if full.matches(&book).unwrap() {
                assert!(weaker.matches(&book).unwrap(), "{text} lost a match");
            }
        }
    }
}

#[test]
fn test_closure_oracles() {
    let no_to_many = |predicate: &FilterPredicate| !predicate.path.has_to_many();
    let expr = rsql("authors.name==*Asimov;genre==scifi");
    assert_eq!(
        extract_pushdown(&expr, &no_to_many).map(|e| e.to_string()),
        Some("book.genre IN [scifi]".to_string())
    );
    assert!(should_execute_in_memory(&expr, &no_to_many));
}
