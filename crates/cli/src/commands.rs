use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a filter and print its canonical form
    Parse {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long, help = "Print the expression tree as JSON")]
        json: bool,
    },
    /// Evaluate a filter over JSON records and print the matches
    Eval {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long, help = "JSON file holding an array of records of the filtered type")]
        records: String,

        #[arg(long, help = "Skip records that cannot be evaluated instead of failing")]
        lenient: bool,
    },
    /// Show which part of a filter the store would run and what stays in memory
    Split {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long, help = "Force the whole filter into memory")]
        in_memory: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    #[arg(long, help = "Entity dictionary JSON file")]
    pub schema: String,

    #[arg(long, help = "Request path, e.g. /book or /author/1/books")]
    pub path: String,

    #[arg(long, conflicts_with = "param", help = "RSQL filter text")]
    pub filter: Option<String>,

    /// Raw query parameter, repeatable: `filter[book.title]=Dune`
    #[arg(long, value_parser = parse_param)]
    pub param: Vec<(String, String)>,

    #[arg(long, help = "Parse per-type filters instead of a single request filter")]
    pub typed: bool,

    #[arg(long, help = "Filter settings JSON file")]
    pub settings: Option<String>,
}

impl FilterArgs {
    /// Query parameters in command-line order; `--filter` is shorthand for `--param filter=...`.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match &self.filter {
            Some(text) => vec![("filter".to_string(), text.clone())],
            None => self.param.clone(),
        }
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
