//! The four extraction queries.

use crate::entities::filter::FilterTable;
use crate::entities::{EntityInventory, ExtractionMode, PropertyUsage};
use crate::normalize::PrefixNormalizer;
use crate::rdf::{GraphStore, Node, RDF_TYPE, sh};
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Runs extraction queries against any [`GraphStore`].
///
/// Raw IRIs are collected and sorted before rendering, so generated `nsN`
/// prefixes come out the same on every run.
pub struct EntityExtractor<'a, G: GraphStore + ?Sized> {
    graph: &'a G,
    normalizer: &'a PrefixNormalizer,
    prefixed: bool,
    filter: Option<&'a FilterTable>,
}

impl<'a, G: GraphStore + ?Sized> EntityExtractor<'a, G> {
    pub fn new(graph: &'a G, normalizer: &'a PrefixNormalizer) -> Self {
        Self {
            graph,
            normalizer,
            prefixed: false,
            filter: None,
        }
    }

    pub fn prefixed(mut self, prefixed: bool) -> Self {
        self.prefixed = prefixed;
        self
    }

    pub fn with_filter(mut self, filter: Option<&'a FilterTable>) -> Self {
        self.filter = filter;
        self
    }

    /// Run both queries for `mode`.
    pub fn extract(&self, mode: ExtractionMode) -> Result<EntityInventory> {
        let inventory = match mode {
            ExtractionMode::Instances => EntityInventory {
                classes: self.classes_in_use()?,
                properties: self.properties_in_use()?,
            },
            ExtractionMode::Shapes => EntityInventory {
                classes: self.declared_classes()?,
                properties: self.declared_properties()?,
            },
        };
        debug!(
            ?mode,
            classes = inventory.classes.len(),
            properties = inventory.properties.len(),
            "extraction finished"
        );
        Ok(inventory)
    }

    /// Every IRI used as the object of `rdf:type`.
    pub fn classes_in_use(&self) -> Result<Vec<String>> {
        let raw: BTreeSet<String> = self
            .graph
            .statements(None, Some(RDF_TYPE), None)?
            .into_iter()
            .filter_map(|statement| statement.object.as_iri().map(str::to_string))
            .collect();
        Ok(self.render_classes(raw))
    }

    /// Every predicate other than `rdf:type`, paired with each IRI type of its
    /// subject. Untyped subjects give a parentless pair.
    pub fn properties_in_use(&self) -> Result<Vec<PropertyUsage>> {
        let mut types: BTreeMap<Node, BTreeSet<String>> = BTreeMap::new();
        for statement in self.graph.statements(None, Some(RDF_TYPE), None)? {
            if let Some(class) = statement.object.as_iri() {
                types
                    .entry(statement.subject)
                    .or_default()
                    .insert(class.to_string());
            }
        }

        let mut raw: BTreeSet<(String, Option<String>)> = BTreeSet::new();
        for statement in self.graph.statements(None, None, None)? {
            if statement.predicate == RDF_TYPE {
                continue;
            }
            match types.get(&statement.subject) {
                Some(classes) => {
                    for class in classes {
                        raw.insert((statement.predicate.clone(), Some(class.clone())));
                    }
                }
                None => {
                    raw.insert((statement.predicate, None));
                }
            }
        }

        let mut rendered = BTreeSet::new();
        for (property, parent) in raw {
            let name = self.render(&property);
            if !self.retains(&name) {
                continue;
            }
            let parent = parent.map(|p| self.render(&p));
            if !self.pair_allowed(&name, parent.as_deref()) {
                continue;
            }
            rendered.insert(PropertyUsage::new(name, parent));
        }
        Ok(rendered.into_iter().collect())
    }

    /// Every IRI named by `sh:targetClass`.
    pub fn declared_classes(&self) -> Result<Vec<String>> {
        let raw: BTreeSet<String> = self
            .graph
            .statements(None, Some(sh::TARGET_CLASS), None)?
            .into_iter()
            .filter_map(|statement| statement.object.as_iri().map(str::to_string))
            .collect();
        Ok(self.render_classes(raw))
    }

    /// Every `sh:path` of a property shape, paired with the target classes of
    /// the node shapes that reference it.
    pub fn declared_properties(&self) -> Result<Vec<PropertyUsage>> {
        let mut targets: BTreeMap<Node, BTreeSet<String>> = BTreeMap::new();
        for statement in self.graph.statements(None, Some(sh::TARGET_CLASS), None)? {
            if let Some(class) = statement.object.as_iri() {
                targets
                    .entry(statement.subject)
                    .or_default()
                    .insert(class.to_string());
            }
        }

        let mut owners: BTreeMap<Node, BTreeSet<Node>> = BTreeMap::new();
        for statement in self.graph.statements(None, Some(sh::PROPERTY), None)? {
            if statement.object.is_resource() {
                owners
                    .entry(statement.object)
                    .or_default()
                    .insert(statement.subject);
            }
        }

        let mut shapes: BTreeSet<Node> = self
            .graph
            .subjects(RDF_TYPE, &Node::iri(sh::PROPERTY_SHAPE))?
            .into_iter()
            .collect();
        shapes.extend(owners.keys().cloned());

        let mut paths: BTreeSet<String> = BTreeSet::new();
        let mut raw_pairs: BTreeSet<(String, String)> = BTreeSet::new();
        for shape in &shapes {
            let Some(Node::Iri(path)) = self.graph.value(shape, sh::PATH)? else {
                continue;
            };
            for owner in owners.get(shape).into_iter().flatten() {
                for class in targets.get(owner).into_iter().flatten() {
                    raw_pairs.insert((path.clone(), class.clone()));
                }
            }
            paths.insert(path);
        }

        let mut rendered = BTreeSet::new();
        let mut parented = BTreeSet::new();
        for (path, class) in &raw_pairs {
            let name = self.render(path);
            if !self.retains(&name) {
                continue;
            }
            let parent = self.render(class);
            if !self.pair_allowed(&name, Some(&parent)) {
                continue;
            }
            parented.insert(name.clone());
            rendered.insert(PropertyUsage::with_parent(name, parent));
        }

        for path in &paths {
            let name = self.render(path);
            if !self.retains(&name) || parented.contains(&name) {
                continue;
            }
            let restricted = self
                .filter
                .is_some_and(|filter| filter.permitted_parents(&name).is_some());
            if restricted {
                continue;
            }
            rendered.insert(PropertyUsage::parentless(name));
        }

        Ok(rendered.into_iter().collect())
    }

    /// Full IRI, or the normalized short form when prefixed output is on.
    pub fn render(&self, iri: &str) -> String {
        if !self.prefixed {
            return iri.to_string();
        }
        match self.graph.short_name(iri) {
            Some(short) => self.normalizer.normalize(&short),
            None => iri.to_string(),
        }
    }

    fn render_classes(&self, raw: BTreeSet<String>) -> Vec<String> {
        let rendered: BTreeSet<String> = raw
            .iter()
            .map(|iri| self.render(iri))
            .filter(|name| self.retains(name))
            .collect();
        rendered.into_iter().collect()
    }

    fn retains(&self, name: &str) -> bool {
        self.filter.is_none_or(|filter| filter.allows_entity(name))
    }

    fn pair_allowed(&self, name: &str, parent: Option<&str>) -> bool {
        self.filter
            .is_none_or(|filter| filter.allows_pair(name, parent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::FilterSpec;
    use crate::rdf::RdfGraph;

    const SHAPES: &str = r#"
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix dcat: <http://www.w3.org/ns/dcat#> .
        @prefix dcterms: <http://purl.org/dc/terms/> .
        @prefix ex: <http://example.org/shapes#> .

        ex:DatasetShape a sh:NodeShape ;
            sh:targetClass dcat:Dataset ;
            sh:property ex:titleShape , [ sh:path dcat:keyword ] .

        ex:titleShape a sh:PropertyShape ;
            sh:path dcterms:title .

        ex:LooseShape a sh:PropertyShape ;
            sh:path dcterms:description .
    "#;

    const DATA: &str = r#"
        @prefix dcat: <http://www.w3.org/ns/dcat#> .
        @prefix dcterms: <http://purl.org/dc/terms/> .

        <http://example.org/ds> a dcat:Dataset ;
            dcterms:title "Title" .
        <http://example.org/untyped> dcterms:description "text" .
    "#;

    #[test]
    fn declared_pairs_use_target_class() {
        let graph = RdfGraph::from_turtle(SHAPES).unwrap();
        let normalizer = PrefixNormalizer::builtin();
        let extractor = EntityExtractor::new(&graph, &normalizer).prefixed(true);

        assert_eq!(extractor.declared_classes().unwrap(), vec!["dcat:Dataset"]);
        assert_eq!(
            extractor.declared_properties().unwrap(),
            vec![
                PropertyUsage::with_parent("dcat:keyword", "dcat:Dataset"),
                PropertyUsage::parentless("dct:description"),
                PropertyUsage::with_parent("dct:title", "dcat:Dataset"),
            ]
        );
    }

    #[test]
    fn instance_properties_pair_with_subject_types() {
        let graph = RdfGraph::from_turtle(DATA).unwrap();
        let normalizer = PrefixNormalizer::builtin();
        let extractor = EntityExtractor::new(&graph, &normalizer).prefixed(true);

        assert_eq!(extractor.classes_in_use().unwrap(), vec!["dcat:Dataset"]);
        assert_eq!(
            extractor.properties_in_use().unwrap(),
            vec![
                PropertyUsage::parentless("dct:description"),
                PropertyUsage::with_parent("dct:title", "dcat:Dataset"),
            ]
        );
    }

    #[test]
    fn full_iris_without_prefixed_flag() {
        let graph = RdfGraph::from_turtle(DATA).unwrap();
        let normalizer = PrefixNormalizer::builtin();
        let extractor = EntityExtractor::new(&graph, &normalizer);
        assert_eq!(
            extractor.classes_in_use().unwrap(),
            vec!["http://www.w3.org/ns/dcat#Dataset"]
        );
    }

    #[test]
    fn restricted_entities_never_get_parentless_entries() {
        let graph = RdfGraph::from_turtle(SHAPES).unwrap();
        let normalizer = PrefixNormalizer::builtin();
        let table = FilterTable::from_reader(
            "entity,parent,keep\ndct:description,dcat:Catalog,y\ndct:title,dcat:Dataset,y\n".as_bytes(),
            &FilterSpec::new("keep", "y"),
        )
        .unwrap();
        let extractor = EntityExtractor::new(&graph, &normalizer)
            .prefixed(true)
            .with_filter(Some(&table));

        assert_eq!(
            extractor.declared_properties().unwrap(),
            vec![PropertyUsage::with_parent("dct:title", "dcat:Dataset")]
        );
        assert!(extractor.declared_classes().unwrap().is_empty());
    }

    #[test]
    fn blank_types_are_not_parents() {
        let graph = RdfGraph::from_turtle(
            "<http://example.org/s> a [] ; <http://example.org/p> 1 .",
        )
        .unwrap();
        let normalizer = PrefixNormalizer::builtin();
        let extractor = EntityExtractor::new(&graph, &normalizer);
        assert!(extractor.classes_in_use().unwrap().is_empty());
        assert_eq!(
            extractor.properties_in_use().unwrap(),
            vec![PropertyUsage::parentless("http://example.org/p")]
        );
    }
}
