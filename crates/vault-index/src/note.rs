//! Loading a single Markdown note: splitting its YAML frontmatter from
//! its body and projecting both into triples.

use crate::iri;
use crate::scalar::{self, Scalar};
use crate::IndexError;
use rdf_model::{Term, Triple, Vocabulary};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A Markdown note read from the vault: its frontmatter and body, plus
/// the subject IRI derived from its path.
pub struct Note {
    /// Path relative to the vault root.
    pub relative_path: String,
    /// The note's subject term, `note://<normalized relative path>`.
    pub subject: Term,
    /// Parsed frontmatter fields, keyed by their raw YAML key.
    pub frontmatter: BTreeMap<String, Scalar>,
    /// The Markdown body, with the frontmatter block removed.
    pub body: String,
}

impl Note {
    /// Read and parse the note at `absolute_path`, relative to
    /// `vault_root`.
    ///
    /// I/O failures are reported as [`IndexError::Io`]; a YAML block that
    /// fails to parse, or that assigns a mapping to a frontmatter key, is
    /// reported as [`IndexError::MalformedNote`] — both are caught by the
    /// indexer, which skips the offending note rather than aborting.
    pub fn load(vault_root: &Path, absolute_path: &Path) -> Result<Note, IndexError> {
        let relative_path = absolute_path
            .strip_prefix(vault_root)
            .unwrap_or(absolute_path)
            .to_string_lossy()
            .replace('\\', "/");

        let content = std::fs::read_to_string(absolute_path).map_err(|source| IndexError::Io {
            path: absolute_path.to_path_buf(),
            source,
        })?;

        let (frontmatter_yaml, body) = split_frontmatter(&content);
        let frontmatter = parse_frontmatter(frontmatter_yaml, absolute_path)?;

        let normalized = iri::normalize(&relative_path);
        let subject = Term::iri(iri::note_iri(&normalized));

        Ok(Note {
            relative_path,
            subject,
            frontmatter,
            body: body.to_string(),
        })
    }

    /// Every triple this note contributes: one per scalar frontmatter
    /// field (with arrays expanding to one triple per element), plus one
    /// `exo:bodyLink` triple per wiki-link found in the body.
    pub fn project(&self) -> Vec<Triple> {
        let mut out = Vec::new();
        for (key, value) in &self.frontmatter {
            let predicate = Term::iri(key.clone());
            value.project(&self.subject, &predicate, &mut out);
        }
        let body_link = Term::iri(Vocabulary::EXO_BODY_LINK);
        for target in scalar::body_wikilink_targets(&self.body) {
            let object = Term::iri(iri::note_iri(&iri::normalize(&target)));
            out.push(Triple::new(self.subject.clone(), body_link.clone(), object));
        }
        out
    }
}

/// Split `content` into its frontmatter YAML block (if any) and its
/// body. A note with no `---`-delimited block at the very start has
/// empty frontmatter and its whole content as body.
fn split_frontmatter(content: &str) -> (&str, &str) {
    let Some(rest) = content.strip_prefix("---") else {
        return ("", content);
    };
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    let Some(end) = rest.find("\n---") else {
        return ("", content);
    };
    let yaml = &rest[..end];
    let after = &rest[end + 4..];
    let body = after.strip_prefix('\n').unwrap_or(after);
    (yaml, body)
}

fn parse_frontmatter(yaml: &str, path: &Path) -> Result<BTreeMap<String, Scalar>, IndexError> {
    if yaml.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let value: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(|e| IndexError::MalformedNote {
        path: path.to_path_buf(),
        reason: format!("invalid YAML frontmatter: {e}"),
    })?;
    let mapping = match value {
        serde_yaml::Value::Mapping(m) => m,
        serde_yaml::Value::Null => return Ok(BTreeMap::new()),
        _ => {
            return Err(IndexError::MalformedNote {
                path: path.to_path_buf(),
                reason: "frontmatter block is not a YAML mapping".to_string(),
            })
        }
    };

    let mut fields = BTreeMap::new();
    for (key, value) in mapping {
        let serde_yaml::Value::String(key) = key else {
            return Err(IndexError::MalformedNote {
                path: path.to_path_buf(),
                reason: "frontmatter key is not a string".to_string(),
            });
        };
        let scalar = Scalar::from_yaml(&value).map_err(|reason| IndexError::MalformedNote {
            path: path.to_path_buf(),
            reason: format!("field {key:?}: {reason}"),
        })?;
        fields.insert(key, scalar);
    }
    Ok(fields)
}

/// Path-only variant of `note://` subject derivation, used by the
/// indexer to compute `updateFile`'s target subject before it knows
/// whether the file can still be read.
pub fn subject_for_path(vault_root: &Path, absolute_path: &Path) -> Term {
    let relative = absolute_path
        .strip_prefix(vault_root)
        .unwrap_or(absolute_path)
        .to_string_lossy()
        .replace('\\', "/");
    Term::iri(iri::note_iri(&iri::normalize(&relative)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_note(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn note_without_frontmatter_has_empty_fields_and_full_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_note(dir.path(), "Plain.md", "Just a note body.");
        let note = Note::load(dir.path(), &path).unwrap();
        assert!(note.frontmatter.is_empty());
        assert_eq!(note.body, "Just a note body.");
    }

    #[test]
    fn note_with_frontmatter_parses_scalars_and_strips_the_block() {
        let dir = tempfile::tempdir().unwrap();
        let content = "---\ntitle: Launch Plan\npriority: 2\ndone: false\n---\nBody text with [[Related Note]].\n";
        let path = write_note(dir.path(), "Launch.md", content);
        let note = Note::load(dir.path(), &path).unwrap();
        assert_eq!(note.frontmatter.get("title"), Some(&Scalar::String("Launch Plan".into())));
        assert_eq!(note.frontmatter.get("priority"), Some(&Scalar::Number(2.0)));
        assert_eq!(note.frontmatter.get("done"), Some(&Scalar::Bool(false)));
        assert!(note.body.contains("[[Related Note]]"));
        assert!(!note.body.contains("title:"));
    }

    #[test]
    fn subject_iri_is_derived_from_relative_path_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_note(dir.path(), "Launch.md", "---\n---\nbody");
        let note = Note::load(dir.path(), &path).unwrap();
        assert_eq!(note.subject, Term::iri("note://Launch"));
    }

    #[test]
    fn mapping_valued_field_is_a_malformed_note() {
        let dir = tempfile::tempdir().unwrap();
        let content = "---\nmeta:\n  nested: value\n---\nbody";
        let path = write_note(dir.path(), "Broken.md", content);
        let err = Note::load(dir.path(), &path).unwrap_err();
        assert!(matches!(err, IndexError::MalformedNote { .. }));
    }

    #[test]
    fn project_emits_one_triple_per_frontmatter_field_and_body_link() {
        let dir = tempfile::tempdir().unwrap();
        let content = "---\nlinked: \"[[Other]]\"\n---\nSee also [[Another]].\n";
        let path = write_note(dir.path(), "Source.md", content);
        let note = Note::load(dir.path(), &path).unwrap();
        let triples = note.project();
        assert!(triples.iter().any(|t| t.object == Term::iri("note://Other")));
        assert!(triples
            .iter()
            .any(|t| t.predicate == Term::iri(Vocabulary::EXO_BODY_LINK) && t.object == Term::iri("note://Another")));
    }
}
