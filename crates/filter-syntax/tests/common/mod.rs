#![allow(dead_code)]

use filter_syntax::{Path, PathSegment};
use model::{
    core::data_type::DataType,
    schema::{EntityDictionary, EntitySchema},
};
use std::sync::Arc;

pub fn library_schema() -> Arc<EntityDictionary> {
    Arc::new(EntityDictionary::from_entities([
        EntitySchema::new("book")
            .id_field("id", DataType::Int)
            .attribute("title", DataType::String)
            .attribute("genre", DataType::String)
            .attribute("year", DataType::Int)
            .attribute("price", DataType::Decimal)
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

pub fn book_path(field: &str, data_type: DataType) -> Path {
    Path::from_segment(PathSegment::new("book", field, data_type))
}

pub fn book_authors_path(field: &str, data_type: DataType) -> Path {
    Path::new(vec![
        PathSegment::new(
            "book",
            "authors",
            DataType::collection_of(DataType::Entity("author".to_string())),
        ),
        PathSegment::new("author", field, data_type),
    ])
    .unwrap()
}
