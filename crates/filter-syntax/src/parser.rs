use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "grammar/rsql.pest"]
pub struct RsqlParser;
