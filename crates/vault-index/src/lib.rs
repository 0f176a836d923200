//! Projects a vault of Markdown notes into `storage::TripleStore` triples
//! and exposes a query-service facade over the `sparql` engine.
//!
//! A note's YAML frontmatter and Markdown wiki-links are the only inputs;
//! everything else (rendering, layout, property resolution) is a
//! collaborator that consumes the triples this crate produces.

#![warn(missing_docs, rust_2018_idioms)]

mod indexer;
mod iri;
mod note;
mod query_service;
mod scalar;

pub use indexer::{IndexerConfig, VaultIndexer};
pub use note::Note;
pub use query_service::{QueryService, QueryServiceError};
pub use scalar::Scalar;

use std::path::PathBuf;

/// Errors raised while loading or indexing a note.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The note file could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The note's frontmatter was present but could not be parsed into
    /// the scalar model: invalid YAML, a non-mapping top level, or a
    /// frontmatter field whose value is itself a YAML mapping.
    #[error("malformed note at {path}: {reason}")]
    MalformedNote {
        /// The note with the unsupported frontmatter shape.
        path: PathBuf,
        /// A human-readable explanation.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn initialize_then_query_finds_direct_matches() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("Meeting.md")).unwrap();
        writeln!(file, "---\ntype: \"[[Meeting]]\"\n---\nAgenda.").unwrap();

        let mut service = QueryService::new(IndexerConfig {
            root: dir.path().to_path_buf(),
            ..IndexerConfig::default()
        });
        service.initialize().unwrap();

        let results = service
            .query("SELECT ?note WHERE { ?note <type> <note://Meeting> }")
            .unwrap();
        assert_eq!(results.len(), 1);
    }
}
