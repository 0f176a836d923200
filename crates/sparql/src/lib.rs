//! A SPARQL 1.1 query subset over the vault's in-memory triple store.
//!
//! Covers `SELECT`/`CONSTRUCT`/`ASK`/`DESCRIBE`, basic graph patterns,
//! `OPTIONAL`/`UNION`/`FILTER`/`BIND`, property paths, `EXISTS`/`NOT
//! EXISTS`, and `ORDER BY`/`DISTINCT`/`LIMIT`/`OFFSET`. Aggregation,
//! named graphs, and SPARQL Update are out of scope; `SERVICE` parses
//! but never executes.
//!
//! A query goes through four stages: [`lexer`] -> [`parser`] produces an
//! [`ast::Query`], [`translate`] lowers it to [`algebra::Algebra`],
//! [`optimizer`] reorders it, and [`executor`] evaluates it lazily
//! against a `storage::TripleStore`.

#![warn(missing_docs, rust_2018_idioms)]

pub mod algebra;
pub mod ast;
pub mod executor;
pub mod expr;
pub mod lexer;
pub mod optimizer;
pub mod parser;
pub mod path;
pub mod solution;
pub mod translate;

pub use algebra::{Algebra, OrderKey, PatternTriple, PredicateOrPath, SortDirection, TermOrVar, Variable};
pub use executor::{execute_ask, execute_construct, execute_describe, execute_select, ExecutionControl, ExecutionError, SolutionStream};
pub use expr::{BuiltinFn, Expression, Value};
pub use parser::{parse, ParseError};
pub use path::{PathError, PropertyPath};
pub use solution::SolutionMapping;
pub use translate::{translate, ResolvedForm, TranslateError, TranslatedQuery};

use tracing::{debug, warn};

/// Parse and translate `source` in one step, ready for [`optimizer::optimize`]
/// and execution.
pub fn prepare(source: &str, store: &storage::TripleStore) -> Result<TranslatedQuery, PrepareError> {
    let query = parse(source).map_err(|e| {
        warn!(error = %e, "query failed to parse");
        e
    })?;
    let translated = translate(&query).map_err(|e| {
        warn!(error = %e, "query failed to translate to algebra");
        e
    })?;
    let algebra = optimizer::optimize(translated.algebra, store);
    debug!(form = ?translated.form, "query prepared");
    Ok(TranslatedQuery {
        algebra,
        form: translated.form,
    })
}

/// Errors from the combined parse-translate-optimize pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PrepareError {
    /// The query text did not parse.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The parsed query could not be translated to algebra.
    #[error(transparent)]
    Translate(#[from] TranslateError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_parses_translates_and_optimizes() {
        let store = storage::TripleStore::new();
        let prepared = prepare("SELECT ?x WHERE { ?x <http://ex/p> ?o }", &store).unwrap();
        assert!(matches!(prepared.form, ResolvedForm::Select));
    }
}
