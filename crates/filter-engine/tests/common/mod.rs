#![allow(dead_code)]

use filter_syntax::{FilterExpression, dialect::rsql::RsqlDialect};
use model::{
    core::{data_type::DataType, value::Value},
    records::record::Record,
    schema::{EntityDictionary, EntitySchema},
};
use serde_json::json;
use std::sync::Arc;

pub fn library_schema() -> Arc<EntityDictionary> {
    Arc::new(EntityDictionary::from_entities([
        EntitySchema::new("book")
            .id_field("id", DataType::Int)
            .attribute("title", DataType::String)
            .attribute("genre", DataType::String)
            .attribute("year", DataType::Int)
            .attribute("tags", DataType::collection_of(DataType::String))
            .computed_attribute("score", DataType::Float)
            .to_many("authors", "author")
            .to_one("publisher", "publisher"),
        EntitySchema::new("author")
            .id_field("id", DataType::Int)
            .attribute("name", DataType::String)
            .attribute("awards", DataType::collection_of(DataType::String))
            .to_many("books", "book"),
        EntitySchema::new("publisher")
            .id_field("id", DataType::Int)
            .attribute("name", DataType::String),
    ]))
}

pub fn books() -> Vec<Value> {
    let schema = library_schema();
    let raw = json!([
        {
            "id": 1, "title": "Dune", "genre": "scifi", "year": 1965, "score": 4.8,
            "tags": ["classic", "desert"],
            "authors": [{"id": 10, "name": "Frank Herbert", "awards": ["Hugo", "Nebula"]}],
            "publisher": {"id": 100, "name": "Chilton"}
        },
        {
            "id": 2, "title": "Foundation", "genre": "scifi", "year": 1951, "score": 4.2,
            "tags": ["classic"],
            "authors": [{"id": 11, "name": "Isaac Asimov", "awards": ["Hugo"]}],
            "publisher": {"id": 101, "name": "Gnome"}
        },
        {
            "id": 3, "title": "Emma", "genre": "romance", "year": 1815, "score": 3.9,
            "tags": [],
            "authors": [{"id": 12, "name": "Jane Austen", "awards": []}],
            "publisher": null
        },
        {
            "id": 4, "title": "Good Omens", "genre": null, "year": 1990, "score": 4.5,
            "tags": ["comedy"],
            "authors": [
                {"id": 13, "name": "Terry Pratchett", "awards": ["Locus"]},
                {"id": 14, "name": "Neil Gaiman", "awards": ["Hugo", "Locus"]}
            ],
            "publisher": {"id": 102, "name": "Gollancz"}
        }
    ]);
    raw.as_array()
        .unwrap()
        .iter()
        .map(|book| Value::Record(Record::from_json(schema.as_ref(), "book", book).unwrap()))
        .collect()
}

pub fn rsql(text: &str) -> FilterExpression {
    RsqlDialect::new(library_schema())
        .parse_expression("book", text)
        .unwrap()
}

pub fn titles(records: &[Value]) -> Vec<String> {
    records
        .iter()
        .map(|record| match record {
            Value::Record(record) => record.get_value("title").to_string(),
            other => other.to_string(),
        })
        .collect()
}
