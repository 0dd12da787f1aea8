use crate::dialect::{
    FilterDialect,
    bracketed::BracketedDialect,
    case_sensitivity::{CaseSensitivityStrategy, FoldCase, UseColumnCollation},
    chain::DialectChain,
    rsql::RsqlDialect,
};
use model::schema::SchemaLookup;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseSensitivity {
    #[default]
    ColumnCollation,
    FoldCase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialectKind {
    Bracketed,
    Rsql,
}

fn default_dialects() -> Vec<DialectKind> {
    vec![DialectKind::Bracketed, DialectKind::Rsql]
}

/// Parser configuration. Every field has a default, so `{}` is a valid settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSettings {
    #[serde(default)]
    pub case_sensitivity: CaseSensitivity,
    /// Dialects in the order the chain tries them.
    #[serde(default = "default_dialects")]
    pub dialects: Vec<DialectKind>,
    #[serde(default)]
    pub allow_nested_to_many_in_typed: bool,
}

impl Default for FilterSettings {
    fn default() -> Self {
        FilterSettings {
            case_sensitivity: CaseSensitivity::default(),
            dialects: default_dialects(),
            allow_nested_to_many_in_typed: false,
        }
    }
}

impl FilterSettings {
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn strategy(&self) -> Box<dyn CaseSensitivityStrategy> {
        match self.case_sensitivity {
            CaseSensitivity::ColumnCollation => Box::new(UseColumnCollation),
            CaseSensitivity::FoldCase => Box::new(FoldCase),
        }
    }

    pub fn build_chain(&self, schema: Arc<dyn SchemaLookup>) -> DialectChain {
        let dialects = self
            .dialects
            .iter()
            .map(|kind| -> Box<dyn FilterDialect> {
                match kind {
                    DialectKind::Bracketed => Box::new(BracketedDialect::new(schema.clone())),
                    DialectKind::Rsql => Box::new(
                        RsqlDialect::new(schema.clone())
                            .with_strategy(self.strategy())
                            .allow_nested_to_many_in_typed(self.allow_nested_to_many_in_typed),
                    ),
                }
            })
            .collect();
        DialectChain::new(dialects)
    }
}
