//! Owned RDF term types: `Iri`, `BlankNode`, `Literal`, and the `Term`
//! sum type over them.

use std::fmt;
use std::sync::Arc;

/// An RDF term: an IRI, a blank node, or a literal.
///
/// Terms are the atoms a [`crate::Triple`] is built from and the values a
/// query solution binds variables to. Two terms are equal exactly when
/// their content is equal; there is no identity beyond content, matching
/// the RDF data model itself.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// An IRI reference, e.g. `<https://example.org/resource>`.
    Iri(Iri),
    /// A literal value, e.g. `"42"^^xsd:integer`.
    Literal(Literal),
    /// A blank node, e.g. `_:b0`.
    BlankNode(BlankNode),
}

impl Term {
    /// Build an IRI term.
    pub fn iri(value: impl Into<Arc<str>>) -> Self {
        Term::Iri(Iri(value.into()))
    }

    /// Build a plain (no language, no datatype) string literal.
    pub fn plain_literal(value: impl Into<Arc<str>>) -> Self {
        Term::Literal(Literal {
            lexical_form: value.into(),
            language: None,
            datatype: None,
        })
    }

    /// Build a language-tagged literal.
    pub fn lang_literal(value: impl Into<Arc<str>>, language: impl Into<Arc<str>>) -> Self {
        Term::Literal(Literal {
            lexical_form: value.into(),
            language: Some(language.into()),
            datatype: None,
        })
    }

    /// Build a datatype-tagged literal.
    pub fn typed_literal(value: impl Into<Arc<str>>, datatype: impl Into<Arc<str>>) -> Self {
        Term::Literal(Literal {
            lexical_form: value.into(),
            language: None,
            datatype: Some(datatype.into()),
        })
    }

    /// Build a blank node term from a label.
    pub fn blank_node(label: impl Into<Arc<str>>) -> Self {
        Term::BlankNode(BlankNode(label.into()))
    }

    /// Whether this term is an IRI.
    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    /// Whether this term is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    /// Whether this term is a blank node.
    pub fn is_blank_node(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    /// Borrow as an IRI, if this term is one.
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Borrow as a literal, if this term is one.
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// Borrow as a blank node, if this term is one.
    pub fn as_blank_node(&self) -> Option<&BlankNode> {
        match self {
            Term::BlankNode(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "Iri({})", iri.0),
            Term::Literal(lit) => write!(f, "Literal({:?})", lit),
            Term::BlankNode(b) => write!(f, "BlankNode({})", b.0),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "{}", iri),
            Term::Literal(lit) => write!(f, "{}", lit),
            Term::BlankNode(b) => write!(f, "{}", b),
        }
    }
}

/// An IRI reference.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Iri(pub Arc<str>);

impl Iri {
    /// The full IRI string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace part: everything up to and including the last `#`
    /// or `/`. Empty if neither separator is present.
    pub fn namespace(&self) -> &str {
        let s = &*self.0;
        if let Some(pos) = s.rfind('#') {
            &s[..=pos]
        } else if let Some(pos) = s.rfind('/') {
            &s[..=pos]
        } else {
            ""
        }
    }

    /// The local name: everything after the last `#` or `/`.
    pub fn local_name(&self) -> &str {
        let s = &*self.0;
        if let Some(pos) = s.rfind('#') {
            &s[pos + 1..]
        } else if let Some(pos) = s.rfind('/') {
            &s[pos + 1..]
        } else {
            s
        }
    }
}

impl fmt::Debug for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Iri({})", self.0)
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// An RDF literal: a lexical form plus an optional language tag or
/// datatype IRI (the two are mutually exclusive).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    /// The lexical (string) form of the value.
    pub lexical_form: Arc<str>,
    /// A BCP-47 language tag, e.g. `"en"`.
    pub language: Option<Arc<str>>,
    /// A datatype IRI, e.g. `xsd:integer`.
    pub datatype: Option<Arc<str>>,
}

impl Literal {
    /// Whether this is a plain literal (no language, no datatype).
    pub fn is_plain(&self) -> bool {
        self.language.is_none() && self.datatype.is_none()
    }

    /// Whether this literal carries a language tag.
    pub fn has_language(&self) -> bool {
        self.language.is_some()
    }

    /// Whether this literal carries a datatype.
    pub fn has_datatype(&self) -> bool {
        self.datatype.is_some()
    }

    /// Parse the lexical form as an integer.
    pub fn as_i64(&self) -> Option<i64> {
        self.lexical_form.parse().ok()
    }

    /// Parse the lexical form as a float.
    pub fn as_f64(&self) -> Option<f64> {
        self.lexical_form.parse().ok()
    }

    /// Parse the lexical form as a boolean (`"true"`/`"1"`/`"false"`/`"0"`).
    pub fn as_bool(&self) -> Option<bool> {
        match &*self.lexical_form {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Literal")
            .field("lexical_form", &self.lexical_form)
            .field("language", &self.language)
            .field("datatype", &self.datatype)
            .finish()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", escape_lexical_form(&self.lexical_form))?;
        if let Some(lang) = &self.language {
            write!(f, "@{}", lang)?;
        } else if let Some(dt) = &self.datatype {
            write!(f, "^^<{}>", dt)?;
        }
        Ok(())
    }
}

fn escape_lexical_form(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

/// A blank node, identified by an opaque label.
///
/// Labels are scoped by whatever assigned them (a parsed document, a
/// projected note); two blank nodes are equal only if their labels are
/// equal, regardless of where the label came from.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BlankNode(pub Arc<str>);

impl BlankNode {
    /// Create a blank node with the given label.
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        BlankNode(label.into())
    }

    /// The blank node's label.
    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlankNode({})", self.0)
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}
