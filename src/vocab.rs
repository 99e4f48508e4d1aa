//! Namespace prefixes and the prologue/epilogue of an output unit.

/// Graph every unit is written into unless configured otherwise.
pub const DEFAULT_GRAPH_IRI: &str = "http://mu.semte.ch/graphs/music";

/// A namespace prefix declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefix {
    pub name: &'static str,
    pub iri: &'static str,
}

pub const RDF: Prefix = Prefix {
    name: "rdf",
    iri: "http://www.w3.org/1999/02/22-rdf-syntax-ns#",
};
pub const RDFS: Prefix = Prefix {
    name: "rdfs",
    iri: "http://www.w3.org/2000/01/rdf-schema#",
};
pub const FOAF: Prefix = Prefix {
    name: "foaf",
    iri: "http://xmlns.com/foaf/0.1/",
};
pub const MO: Prefix = Prefix {
    name: "mo",
    iri: "http://purl.org/ontology/mo/",
};
pub const MBA: Prefix = Prefix {
    name: "mba",
    iri: "https://musicbrainz.org/artist/",
};
pub const MBT: Prefix = Prefix {
    name: "mbt",
    iri: "https://musicbrainz.org/track/",
};
pub const MBR: Prefix = Prefix {
    name: "mbr",
    iri: "https://musicbrainz.org/recording/",
};

/// Text written around the body of every output unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFrame {
    prologue: String,
}

impl UnitFrame {
    /// Build the frame for a graph with the given prefixes.
    pub fn new(prefixes: &[Prefix], graph_iri: &str) -> Self {
        let mut prologue = String::new();
        for p in prefixes {
            prologue.push_str(&format!("@prefix {}: <{}> .\n", p.name, p.iri));
        }
        prologue.push_str(&format!("<{graph_iri}> {{\n"));
        Self { prologue }
    }

    /// Prefix declarations followed by the graph opening.
    pub fn prologue(&self) -> &str {
        &self.prologue
    }

    /// Graph closing.
    pub fn epilogue(&self) -> &'static str {
        "}\n"
    }
}
