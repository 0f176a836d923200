//! The dynamically-typed frontmatter value and its projection to terms.
//!
//! YAML frontmatter values arrive as `serde_yaml::Value`; this module is
//! the boundary that turns that dynamic shape into RDF terms. Nothing
//! past this module ever sees a `Scalar` or a `serde_yaml::Value`.

use crate::iri;
use once_cell::sync::Lazy;
use rdf_model::{Term, Vocabulary};
use regex::Regex;

/// A frontmatter scalar value, before wiki-link resolution and term
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// A plain string that is not a wiki-link.
    String(String),
    /// A YAML number.
    Number(f64),
    /// A YAML boolean.
    Bool(bool),
    /// YAML's null, projected as no triple at all.
    Null,
    /// A YAML sequence; each element projects its own triple.
    Array(Vec<Scalar>),
    /// A `[[Target]]` (optionally `[[Target|alias]]`) string, carrying the
    /// target text before it is resolved to a `note://` IRI.
    Wiki(String),
}

static WIKILINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[([^\]|]+)(?:\|[^\]]*)?\]\]").unwrap());

/// If `s` is *entirely* a single wiki-link (with no other surrounding
/// text), return its target. A wiki-link embedded in a longer string is
/// not a frontmatter wiki-link value — only a note body link.
fn as_whole_wikilink(s: &str) -> Option<String> {
    let caps = WIKILINK.captures(s)?;
    let whole = caps.get(0).unwrap();
    if whole.start() == 0 && whole.end() == s.len() {
        Some(caps[1].trim().to_string())
    } else {
        None
    }
}

/// Every `[[Target]]` occurrence in `body`, in source order, including
/// duplicates (callers that want a set can dedup the result).
pub fn body_wikilink_targets(body: &str) -> impl Iterator<Item = String> + '_ {
    WIKILINK.captures_iter(body).map(|caps| caps[1].trim().to_string())
}

impl Scalar {
    /// Convert a parsed YAML value into a `Scalar`. Fails only for
    /// mappings, which spec.md's frontmatter model has no place for.
    pub fn from_yaml(value: &serde_yaml::Value) -> Result<Scalar, String> {
        match value {
            serde_yaml::Value::Null => Ok(Scalar::Null),
            serde_yaml::Value::Bool(b) => Ok(Scalar::Bool(*b)),
            serde_yaml::Value::Number(n) => n
                .as_f64()
                .map(Scalar::Number)
                .ok_or_else(|| "non-finite number".to_string()),
            serde_yaml::Value::String(s) => Ok(match as_whole_wikilink(s) {
                Some(target) => Scalar::Wiki(target),
                None => Scalar::String(s.clone()),
            }),
            serde_yaml::Value::Sequence(items) => {
                let scalars = items.iter().map(Scalar::from_yaml).collect::<Result<Vec<_>, _>>()?;
                Ok(Scalar::Array(scalars))
            }
            serde_yaml::Value::Mapping(_) => Err("mapping-valued frontmatter field".to_string()),
            serde_yaml::Value::Tagged(tagged) => Scalar::from_yaml(&tagged.value),
        }
    }

    /// Append the triples `(subject, predicate, term)` this value
    /// projects to `out`. An array contributes one triple per element;
    /// `Null` contributes none.
    pub fn project(&self, subject: &Term, predicate: &Term, out: &mut Vec<rdf_model::Triple>) {
        match self {
            Scalar::Null => {}
            Scalar::Array(items) => {
                for item in items {
                    item.project(subject, predicate, out);
                }
            }
            other => out.push(rdf_model::Triple::new(subject.clone(), predicate.clone(), other.to_term())),
        }
    }

    fn to_term(&self) -> Term {
        match self {
            Scalar::String(s) => Term::plain_literal(s.clone()),
            Scalar::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Term::typed_literal(format!("{}", *n as i64), Vocabulary::XSD_INTEGER)
                } else {
                    Term::typed_literal(format!("{n}"), Vocabulary::XSD_DOUBLE)
                }
            }
            Scalar::Bool(b) => Term::typed_literal(if *b { "true" } else { "false" }, Vocabulary::XSD_BOOLEAN),
            Scalar::Wiki(target) => Term::iri(iri::note_iri(&iri::normalize(target))),
            Scalar::Null | Scalar::Array(_) => unreachable!("Null/Array are handled by project, not to_term"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> serde_yaml::Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn plain_string_is_not_a_wikilink() {
        assert_eq!(Scalar::from_yaml(&yaml("\"hello\"")).unwrap(), Scalar::String("hello".into()));
    }

    #[test]
    fn whole_wikilink_string_resolves_to_wiki_scalar() {
        assert_eq!(Scalar::from_yaml(&yaml("\"[[Project X]]\"")).unwrap(), Scalar::Wiki("Project X".into()));
    }

    #[test]
    fn aliased_wikilink_drops_the_alias() {
        assert_eq!(Scalar::from_yaml(&yaml("\"[[Project X|The Project]]\"")).unwrap(), Scalar::Wiki("Project X".into()));
    }

    #[test]
    fn array_of_wikilinks_parses_each_element() {
        let value = yaml("[\"[[A]]\", \"[[B]]\"]");
        match Scalar::from_yaml(&value).unwrap() {
            Scalar::Array(items) => assert_eq!(items, vec![Scalar::Wiki("A".into()), Scalar::Wiki("B".into())]),
            other => panic!("expected Array, got {other:?}"),
        }
    }

    #[test]
    fn mapping_valued_field_is_rejected() {
        assert!(Scalar::from_yaml(&yaml("nested:\n  key: value")).is_err());
    }

    #[test]
    fn wiki_scalar_projects_to_a_note_iri() {
        let subject = Term::iri("note://Home");
        let predicate = Term::iri("https://vault.local/ems#relatesTo");
        let mut out = Vec::new();
        Scalar::Wiki("Project X".into()).project(&subject, &predicate, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].object, Term::iri("note://Project X"));
    }

    #[test]
    fn null_projects_no_triples() {
        let subject = Term::iri("note://Home");
        let predicate = Term::iri("https://vault.local/ems#ignored");
        let mut out = Vec::new();
        Scalar::Null.project(&subject, &predicate, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn integral_number_gets_xsd_integer() {
        let subject = Term::iri("note://Home");
        let predicate = Term::iri("https://vault.local/ems#count");
        let mut out = Vec::new();
        Scalar::Number(3.0).project(&subject, &predicate, &mut out);
        assert_eq!(out[0].object, Term::typed_literal("3", Vocabulary::XSD_INTEGER));
    }

    #[test]
    fn fractional_number_gets_xsd_double() {
        let subject = Term::iri("note://Home");
        let predicate = Term::iri("https://vault.local/ems#ratio");
        let mut out = Vec::new();
        Scalar::Number(3.5).project(&subject, &predicate, &mut out);
        assert_eq!(out[0].object, Term::typed_literal("3.5", Vocabulary::XSD_DOUBLE));
    }

    #[test]
    fn body_wikilinks_are_found_in_source_order() {
        let body = "See [[Alpha]] and then [[Beta|the second one]].";
        let targets: Vec<_> = body_wikilink_targets(body).collect();
        assert_eq!(targets, vec!["Alpha".to_string(), "Beta".to_string()]);
    }
}
