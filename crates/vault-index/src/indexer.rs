//! Incremental projection of a vault directory into a `TripleStore`.

use crate::note::{self, Note};
use crate::IndexError;
use std::path::{Path, PathBuf};
use storage::{TermPattern, TriplePattern, TripleStore};
use tracing::warn;
use walkdir::WalkDir;

/// Tunable indexer behaviour, in the style of the reasoning crate's
/// plain `Default`-able config structs: the host constructs one and
/// hands it to [`VaultIndexer::new`] directly, with no file or
/// environment loading layer of its own.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// The vault's root directory.
    pub root: PathBuf,
    /// The file extension (without a leading dot) that marks a Markdown
    /// note; other files under `root` are ignored.
    pub note_extension: String,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        IndexerConfig {
            root: PathBuf::from("."),
            note_extension: "md".to_string(),
        }
    }
}

/// Converts a vault of Markdown notes into the store's triples and keeps
/// them current as notes change.
///
/// Only this type mutates the underlying store; [`VaultIndexer::store`]
/// hands out a read-only view for the executor.
pub struct VaultIndexer {
    config: IndexerConfig,
    store: TripleStore,
}

impl VaultIndexer {
    /// Build an indexer over `config`'s vault root, with an empty store.
    pub fn new(config: IndexerConfig) -> Self {
        VaultIndexer {
            config,
            store: TripleStore::new(),
        }
    }

    /// The underlying store, for the executor to read.
    pub fn store(&self) -> &TripleStore {
        &self.store
    }

    /// Scan every note under the vault root, project its triples, and
    /// populate the store. A malformed note is logged and skipped; the
    /// rest of the scan continues.
    pub fn initialize(&mut self) -> Result<(), IndexError> {
        self.store.clear();
        self.reindex_all()
    }

    /// Equivalent to clear-and-reindex.
    pub fn refresh(&mut self) -> Result<(), IndexError> {
        self.store.clear();
        self.reindex_all()
    }

    /// Remove every triple whose subject is this note's IRI, then
    /// reproject and re-add. The subject is derived from the path alone,
    /// so the removal happens even if the file can no longer be read —
    /// the note's triples are never left partially present.
    ///
    /// A malformed note is logged and leaves the note with zero triples,
    /// matching [`VaultIndexer::initialize`]'s failure semantics. An I/O
    /// failure (the file vanished, a permissions error) is reported to
    /// the caller instead, since that is the kind of failure spec.md asks
    /// to surface rather than silently skip.
    pub fn update_file(&mut self, absolute_path: &Path) -> Result<(), IndexError> {
        let subject = note::subject_for_path(&self.config.root, absolute_path);
        let pattern = TriplePattern::new(TermPattern::Concrete(subject), TermPattern::Any, TermPattern::Any);
        let stale: Vec<_> = self.store.match_pattern(&pattern).cloned().collect();
        self.store.remove_all(stale.iter());

        match Note::load(&self.config.root, absolute_path) {
            Ok(loaded) => {
                self.store.add_all(loaded.project());
                Ok(())
            }
            Err(IndexError::MalformedNote { path, reason }) => {
                warn!(note = %path.display(), reason = %reason, "skipping malformed note");
                Ok(())
            }
            Err(err @ IndexError::Io { .. }) => Err(err),
        }
    }

    /// Detach from file events, leaving the store untouched.
    pub fn dispose(&mut self) {}

    fn reindex_all(&mut self) -> Result<(), IndexError> {
        if !self.config.root.exists() {
            return Err(IndexError::Io {
                path: self.config.root.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "vault root does not exist"),
            });
        }
        let extension = self.config.note_extension.as_str();
        for entry in WalkDir::new(&self.config.root).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            match Note::load(&self.config.root, entry.path()) {
                Ok(loaded) => self.store.add_all(loaded.project()),
                Err(IndexError::MalformedNote { path, reason }) => {
                    warn!(note = %path.display(), reason = %reason, "skipping malformed note");
                }
                Err(IndexError::Io { path, source }) => {
                    warn!(note = %path.display(), error = %source, "skipping unreadable note");
                }
            }
        }
        Ok(())
    }
}
