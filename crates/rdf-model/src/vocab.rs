//! Standard RDF/RDFS/OWL/XSD vocabularies, plus the domain-local
//! prefixes notes are projected under.

/// Well-known vocabulary IRIs.
pub struct Vocabulary;

impl Vocabulary {
    // RDF namespace
    /// RDF namespace IRI.
    pub const RDF_NS: &'static str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    /// rdf:type
    pub const RDF_TYPE: &'static str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    /// rdf:Property
    pub const RDF_PROPERTY: &'static str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#Property";
    /// rdf:first
    pub const RDF_FIRST: &'static str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
    /// rdf:rest
    pub const RDF_REST: &'static str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
    /// rdf:nil
    pub const RDF_NIL: &'static str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";

    // RDFS namespace
    /// RDFS namespace IRI.
    pub const RDFS_NS: &'static str = "http://www.w3.org/2000/01/rdf-schema#";
    /// rdfs:Resource
    pub const RDFS_RESOURCE: &'static str = "http://www.w3.org/2000/01/rdf-schema#Resource";
    /// rdfs:Class
    pub const RDFS_CLASS: &'static str = "http://www.w3.org/2000/01/rdf-schema#Class";
    /// rdfs:subClassOf
    pub const RDFS_SUBCLASSOF: &'static str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
    /// rdfs:subPropertyOf
    pub const RDFS_SUBPROPERTYOF: &'static str = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf";
    /// rdfs:domain
    pub const RDFS_DOMAIN: &'static str = "http://www.w3.org/2000/01/rdf-schema#domain";
    /// rdfs:range
    pub const RDFS_RANGE: &'static str = "http://www.w3.org/2000/01/rdf-schema#range";
    /// rdfs:label
    pub const RDFS_LABEL: &'static str = "http://www.w3.org/2000/01/rdf-schema#label";
    /// rdfs:comment
    pub const RDFS_COMMENT: &'static str = "http://www.w3.org/2000/01/rdf-schema#comment";

    // OWL namespace
    /// OWL namespace IRI.
    pub const OWL_NS: &'static str = "http://www.w3.org/2002/07/owl#";
    /// owl:Class
    pub const OWL_CLASS: &'static str = "http://www.w3.org/2002/07/owl#Class";
    /// owl:Thing
    pub const OWL_THING: &'static str = "http://www.w3.org/2002/07/owl#Thing";
    /// owl:sameAs
    pub const OWL_SAME_AS: &'static str = "http://www.w3.org/2002/07/owl#sameAs";
    /// owl:inverseOf
    pub const OWL_INVERSE_OF: &'static str = "http://www.w3.org/2002/07/owl#inverseOf";

    // XSD namespace
    /// XSD namespace IRI.
    pub const XSD_NS: &'static str = "http://www.w3.org/2001/XMLSchema#";
    /// xsd:string
    pub const XSD_STRING: &'static str = "http://www.w3.org/2001/XMLSchema#string";
    /// xsd:integer
    pub const XSD_INTEGER: &'static str = "http://www.w3.org/2001/XMLSchema#integer";
    /// xsd:double
    pub const XSD_DOUBLE: &'static str = "http://www.w3.org/2001/XMLSchema#double";
    /// xsd:decimal
    pub const XSD_DECIMAL: &'static str = "http://www.w3.org/2001/XMLSchema#decimal";
    /// xsd:boolean
    pub const XSD_BOOLEAN: &'static str = "http://www.w3.org/2001/XMLSchema#boolean";
    /// xsd:date
    pub const XSD_DATE: &'static str = "http://www.w3.org/2001/XMLSchema#date";
    /// xsd:dateTime
    pub const XSD_DATETIME: &'static str = "http://www.w3.org/2001/XMLSchema#dateTime";

    // Domain-local namespaces used by vault-indexed notes.
    /// The `exo:` prefix, for general note-graph vocabulary
    /// (`exo:bodyLink`, example classes such as `exo:Meeting`).
    pub const EXO_NS: &'static str = "https://vault.local/exo#";
    /// `exo:bodyLink` — relates a note to a note its Markdown body links to.
    pub const EXO_BODY_LINK: &'static str = "https://vault.local/exo#bodyLink";
    /// The `ems:` prefix, reserved for user-defined schema vocabulary
    /// that notes' frontmatter may reference (e.g. `ems:Class`).
    pub const EMS_NS: &'static str = "https://vault.local/ems#";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_share_their_namespace() {
        assert!(Vocabulary::RDF_TYPE.starts_with(Vocabulary::RDF_NS));
        assert!(Vocabulary::RDFS_CLASS.starts_with(Vocabulary::RDFS_NS));
        assert!(Vocabulary::OWL_CLASS.starts_with(Vocabulary::OWL_NS));
        assert!(Vocabulary::XSD_STRING.starts_with(Vocabulary::XSD_NS));
        assert!(Vocabulary::EXO_BODY_LINK.starts_with(Vocabulary::EXO_NS));
    }
}
