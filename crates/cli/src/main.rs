use crate::{
    commands::{Commands, FilterArgs},
    error::CliError,
};
use clap::Parser;
use filter_engine::{FilterExecutor, SchemaPushdownOracle, split_filter_expression};
use filter_syntax::{FilterExpression, FilterSettings, dialect::query_params};
use model::{
    access::RecordAccessor,
    core::value::Value,
    records::record::Record,
    schema::{EntityDictionary, SchemaLookup},
};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;

#[derive(Parser)]
#[command(name = "filterq", version = "0.1.0", about = "Filter expression toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { filter, json } => {
            let request = Request::load(&filter).await?;
            let rendered = if filter.typed {
                output::render_typed(&request.parse_typed()?, json)?
            } else {
                output::render_expression(&request.parse_global()?, json)?
            };
            println!("{rendered}");
        }
        Commands::Eval {
            filter,
            records,
            lenient,
        } => {
            if filter.typed {
                return Err(CliError::InvalidArguments(
                    "eval takes a single request filter, not --typed".to_string(),
                ));
            }
            let request = Request::load(&filter).await?;
            let expr = request.parse_global()?;
            let records = load_records(request.schema.as_ref(), &expr, &records).await?;
            info!("Evaluating {} over {} records", expr, records.len());

            let split = split_filter_expression(&expr, &request.oracle(), true);
            let executor = FilterExecutor::new(Arc::new(RecordAccessor));
            let kept = if lenient {
                executor.apply_lenient(records, &split)?
            } else {
                executor.apply(records, &split)?
            };
            println!("{}", output::render_records(&kept)?);
        }
        Commands::Split { filter, in_memory } => {
            let request = Request::load(&filter).await?;
            let expressions = if filter.typed {
                request.parse_typed()?.into_values().collect()
            } else {
                vec![request.parse_global()?]
            };
            for expr in expressions {
                let split = split_filter_expression(&expr, &request.oracle(), in_memory);
                println!("{}", output::render_split(&split)?);
            }
        }
    }

    Ok(())
}

/// Schema, settings and query parameters of one command invocation.
struct Request {
    schema: Arc<EntityDictionary>,
    settings: FilterSettings,
    url_path: String,
    pairs: Vec<(String, String)>,
}

impl Request {
    async fn load(args: &FilterArgs) -> Result<Self, CliError> {
        let source = tokio::fs::read_to_string(&args.schema).await?;
        let schema = Arc::new(EntityDictionary::from_json(&source)?);

        let settings = match &args.settings {
            Some(path) => {
                let source = tokio::fs::read_to_string(path).await?;
                FilterSettings::from_json(&source)?
            }
            None => FilterSettings::default(),
        };
        debug!("Using filter settings: {:?}", settings);

        let pairs = args.query_pairs();
        if pairs.is_empty() {
            return Err(CliError::InvalidArguments(
                "either --filter or --param is required".to_string(),
            ));
        }

        Ok(Request {
            schema,
            settings,
            url_path: args.path.clone(),
            pairs,
        })
    }

    fn parse_global(&self) -> Result<FilterExpression, CliError> {
        let chain = self.settings.build_chain(self.schema.clone());
        let params = query_params(self.pairs.iter().cloned());
        Ok(chain.parse_global_expression(&self.url_path, &params)?)
    }

    fn parse_typed(&self) -> Result<filter_syntax::dialect::TypedExpressions, CliError> {
        let chain = self.settings.build_chain(self.schema.clone());
        let params = query_params(self.pairs.iter().cloned());
        Ok(chain.parse_typed_expression(&self.url_path, &params)?)
    }

    fn oracle(&self) -> SchemaPushdownOracle {
        SchemaPushdownOracle::new(self.schema.clone())
    }
}

/// Read a JSON array of objects and type each one as an instance of the filtered entity.
async fn load_records(
    schema: &dyn SchemaLookup,
    expr: &FilterExpression,
    path: &str,
) -> Result<Vec<Value>, CliError> {
    let source = tokio::fs::read_to_string(path).await?;
    let json: serde_json::Value = serde_json::from_str(&source)?;
    let serde_json::Value::Array(items) = json else {
        return Err(CliError::InvalidArguments(format!(
            "{path} must hold a JSON array of records"
        )));
    };

    let entity = expr.entity_type();
    items
        .iter()
        .map(|item| -> Result<Value, CliError> {
            Ok(Value::Record(Record::from_json(schema, entity, item)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SCHEMA: &str = r#"{
        "entities": [
            {
                "name": "book",
                "fields": [
                    {"name": "id", "kind": "attribute", "type": "int"},
                    {"name": "title", "kind": "attribute", "type": "string"},
                    {"name": "score", "kind": "attribute", "type": "float", "computed": true}
                ]
            }
        ]
    }"#;

    fn temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn args(schema: &NamedTempFile, filter: &[&str]) -> FilterArgs {
        let mut argv = vec![
            "filterq",
            "parse",
            "--schema",
            schema.path().to_str().unwrap(),
            "--path",
            "/book",
        ];
        argv.extend_from_slice(filter);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Parse { filter, .. } => filter,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_parse_rsql_and_bracketed_requests() {
        let schema = temp_json(SCHEMA);

        let request = Request::load(&args(&schema, &["--filter", "title==Dune"]))
            .await
            .unwrap();
        assert_eq!(
            request.parse_global().unwrap().to_string(),
            "book.title IN [Dune]"
        );

        let request = Request::load(&args(
            &schema,
            &["--param", "filter[book.id][gt]=3", "--param", "filter[book.title]=Dune"],
        ))
        .await
        .unwrap();
        assert_eq!(
            request.parse_global().unwrap().to_string(),
            "(book.id GT [3] AND book.title IN [Dune])"
        );
    }

    #[tokio::test]
    async fn test_missing_filter_is_rejected() {
        let schema = temp_json(SCHEMA);
        let err = Request::load(&args(&schema, &[])).await.err().unwrap();
        assert!(matches!(err, CliError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn test_eval_over_record_file() {
        let schema = temp_json(SCHEMA);
        let records = temp_json(
            r#"[{"id": 1, "title": "Dune", "score": 4.8}, {"id": 2, "title": "Emma", "score": 3.1}]"#,
        );
        let request = Request::load(&args(&schema, &["--filter", "score=gt=4"]))
            .await
            .unwrap();
        let expr = request.parse_global().unwrap();
        let loaded = load_records(
            request.schema.as_ref(),
            &expr,
            records.path().to_str().unwrap(),
        )
        .await
        .unwrap();

        let split = split_filter_expression(&expr, &request.oracle(), false);
        assert_eq!(split.store, None);
        let kept = FilterExecutor::new(Arc::new(RecordAccessor))
            .apply(loaded, &split)
            .unwrap();
        assert_eq!(
            output::render_records(&kept).unwrap(),
            serde_json::to_string_pretty(&serde_json::json!([
                {"id": 1, "title": "Dune", "score": 4.8}
            ]))
            .unwrap()
        );
    }

    #[test]
    fn test_filter_and_param_conflict() {
        let result = Cli::try_parse_from([
            "filterq", "split", "--schema", "s.json", "--path", "/book", "--filter", "a==b",
            "--param", "k=v",
        ]);
        assert!(result.is_err());
    }
}
