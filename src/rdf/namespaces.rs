//! Namespace bindings and `prefix:local` resolution.

use std::collections::BTreeMap;
use tracing::debug;

/// Namespaces bound before any file is parsed.
pub const DEFAULT_NAMESPACES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("xml", "http://www.w3.org/XML/1998/namespace"),
    ("sh", "http://www.w3.org/ns/shacl#"),
    ("dcat", "http://www.w3.org/ns/dcat#"),
    ("dcterms", "http://purl.org/dc/terms/"),
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("dcmitype", "http://purl.org/dc/dcmitype/"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
    ("vcard", "http://www.w3.org/2006/vcard/ns#"),
    ("adms", "http://www.w3.org/ns/adms#"),
    ("dcatap", "http://data.europa.eu/r5r/"),
    ("locn", "http://www.w3.org/ns/locn#"),
    ("prov", "http://www.w3.org/ns/prov#"),
    ("odrl", "http://www.w3.org/ns/odrl/2/"),
    ("schema", "https://schema.org/"),
    ("time", "http://www.w3.org/2006/time#"),
    ("spdx", "http://spdx.org/rdf/terms#"),
    ("org", "http://www.w3.org/ns/org#"),
    ("void", "http://rdfs.org/ns/void#"),
    ("vann", "http://purl.org/vocab/vann/"),
];

/// Two-way prefix/namespace table.
///
/// Namespaces without a binding get a generated `nsN` prefix the first time
/// an IRI in them is shortened.
#[derive(Debug, Clone, Default)]
pub struct NamespaceMap {
    by_prefix: BTreeMap<String, String>,
    by_namespace: BTreeMap<String, String>,
}

impl NamespaceMap {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut map = Self::empty();
        for (prefix, namespace) in DEFAULT_NAMESPACES {
            map.bind(prefix, namespace);
        }
        map
    }

    /// Bind `prefix` to `namespace`, replacing any earlier binding of either.
    /// The empty prefix is the document's default namespace and shortens to
    /// `:local`.
    pub fn bind(&mut self, prefix: &str, namespace: &str) {
        if namespace.is_empty() {
            return;
        }
        if let Some(old_namespace) = self.by_prefix.remove(prefix) {
            self.by_namespace.remove(&old_namespace);
        }
        if let Some(old_prefix) = self.by_namespace.remove(namespace) {
            self.by_prefix.remove(&old_prefix);
        }
        self.by_prefix
            .insert(prefix.to_string(), namespace.to_string());
        self.by_namespace
            .insert(namespace.to_string(), prefix.to_string());
    }

    /// Bind a prefix declared by a parsed document. A prefix already bound to
    /// another namespace by an earlier document keeps its first meaning, and a
    /// default namespace never takes over one that already has a named prefix.
    pub fn bind_declared(&mut self, prefix: &str, namespace: &str) {
        if prefix.is_empty() && self.by_namespace.contains_key(namespace) {
            return;
        }
        match self.by_prefix.get(prefix) {
            Some(existing) if existing == namespace => {}
            Some(existing) if !DEFAULT_NAMESPACES.iter().any(|(p, _)| *p == prefix) => {
                debug!(
                    prefix,
                    namespace,
                    existing = %existing,
                    "prefix already bound to another namespace, keeping first binding"
                );
            }
            _ => self.bind(prefix, namespace),
        }
    }

    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.by_prefix.get(prefix).map(String::as_str)
    }

    pub fn prefix(&self, namespace: &str) -> Option<&str> {
        self.by_namespace.get(namespace).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_prefix
            .iter()
            .map(|(prefix, namespace)| (prefix.as_str(), namespace.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_prefix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_prefix.is_empty()
    }

    /// Shorten `iri` using existing bindings only.
    pub fn shorten(&self, iri: &str) -> Option<String> {
        self.by_namespace
            .iter()
            .filter(|(namespace, _)| iri.len() > namespace.len() && iri.starts_with(namespace.as_str()))
            .filter(|(namespace, _)| is_local_name(&iri[namespace.len()..]))
            .max_by_key(|(namespace, _)| namespace.len())
            .map(|(namespace, prefix)| format!("{}:{}", prefix, &iri[namespace.len()..]))
    }

    /// Shorten `iri`, generating an `nsN` binding for unknown namespaces.
    pub fn compute_short_name(&mut self, iri: &str) -> Option<String> {
        if let Some(short) = self.shorten(iri) {
            return Some(short);
        }
        let (namespace, local) = split_iri(iri)?;
        let prefix = self.next_generated_prefix();
        debug!(prefix = %prefix, namespace, "generated namespace prefix");
        self.bind(&prefix, namespace);
        Some(format!("{prefix}:{local}"))
    }

    fn next_generated_prefix(&self) -> String {
        (1..)
            .map(|n| format!("ns{n}"))
            .find(|candidate| !self.by_prefix.contains_key(candidate))
            .unwrap_or_else(|| "ns".to_string())
    }
}

/// Split at the last `#` or `/` when the remainder is a usable local name.
fn split_iri(iri: &str) -> Option<(&str, &str)> {
    let split_at = iri.rfind('#').or_else(|| iri.rfind('/'))? + 1;
    let (namespace, local) = iri.split_at(split_at);
    is_local_name(local).then_some((namespace, local))
}

fn is_local_name(local: &str) -> bool {
    let mut chars = local.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !local.ends_with('.')
}
