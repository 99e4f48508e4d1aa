//! Shared helpers for the integration tests.

#![allow(dead_code)]

use anyhow::{Context, Result};
use rio_api::model::{GraphName, Literal, Subject, Term};
use rio_api::parser::QuadsParser;
use rio_turtle::{TriGParser, TurtleError};
use std::io::Read;
use std::path::Path;
use trig_export::io::compression::auto_detect_reader;

pub const GRAPH: &str = "http://mu.semte.ch/graphs/music";
pub const MBA: &str = "https://musicbrainz.org/artist/";
pub const MO: &str = "http://purl.org/ontology/mo/";
pub const FOAF: &str = "http://xmlns.com/foaf/0.1/";
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// Object of a parsed quad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Iri(String),
    Text(String),
    Typed { value: String, datatype: String },
    Other(String),
}

/// A parsed quad with owned parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quad {
    pub subject: String,
    pub predicate: String,
    pub object: Object,
    pub graph: Option<String>,
}

/// Parse a TriG document.
pub fn parse_trig(text: &str) -> Result<Vec<Quad>> {
    let mut quads = Vec::new();
    TriGParser::new(text.as_bytes(), None).parse_all(&mut |q| -> std::result::Result<(), TurtleError> {
        quads.push(Quad {
            subject: match q.subject {
                Subject::NamedNode(n) => n.iri.to_string(),
                other => other.to_string(),
            },
            predicate: q.predicate.iri.to_string(),
            object: match q.object {
                Term::NamedNode(n) => Object::Iri(n.iri.to_string()),
                Term::Literal(Literal::Simple { value }) => Object::Text(value.to_string()),
                Term::Literal(Literal::Typed { value, datatype }) => Object::Typed {
                    value: value.to_string(),
                    datatype: datatype.iri.to_string(),
                },
                other => Object::Other(other.to_string()),
            },
            graph: match q.graph_name {
                Some(GraphName::NamedNode(n)) => Some(n.iri.to_string()),
                Some(other) => Some(other.to_string()),
                None => None,
            },
        });
        Ok(())
    })?;
    Ok(quads)
}

/// Read a (possibly compressed) unit as text.
pub fn read_unit(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut text = String::new();
    auto_detect_reader(file, path)?.read_to_string(&mut text)?;
    Ok(text)
}

/// Objects of `predicate` on `subject`.
pub fn objects<'a>(quads: &'a [Quad], subject: &str, predicate: &str) -> Vec<&'a Object> {
    quads
        .iter()
        .filter(|q| q.subject == subject && q.predicate == predicate)
        .map(|q| &q.object)
        .collect()
}

pub fn text(value: &str) -> Object {
    Object::Text(value.to_string())
}

pub fn iri(value: &str) -> Object {
    Object::Iri(value.to_string())
}
