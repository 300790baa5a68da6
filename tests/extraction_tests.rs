use anyhow::Result;
use dcat_ap_lu_tools::entities::{
    EntityExtractor, ExtractionMode, FilterSpec, FilterTable, PropertyUsage,
};
use dcat_ap_lu_tools::{PrefixNormalizer, RdfGraph};

const SHAPES: &str = r#"
    @prefix sh: <http://www.w3.org/ns/shacl#> .
    @prefix dcat: <http://www.w3.org/ns/dcat#> .
    @prefix dcterms: <http://purl.org/dc/terms/> .
    @prefix ex: <http://example.org/shapes#> .

    ex:DatasetShape a sh:NodeShape ;
        sh:targetClass dcat:Dataset ;
        sh:property [ sh:path dcterms:title ; sh:minCount 1 ] ;
        sh:property ex:DescriptionShape .

    ex:DistributionShape a sh:NodeShape ;
        sh:targetClass dcat:Distribution ;
        sh:property ex:DescriptionShape .

    ex:DescriptionShape a sh:PropertyShape ;
        sh:path dcterms:description .

    ex:Orphan a sh:PropertyShape ;
        sh:path dcat:keyword .
"#;

const DATA: &str = r#"
    @prefix dcat: <http://www.w3.org/ns/dcat#> .
    @prefix dct: <http://purl.org/dc/terms/> .

    <http://example.org/ds/1> a dcat:Dataset ;
        dct:title "Air quality" ;
        dcat:distribution <http://example.org/dist/1> .
    <http://example.org/dist/1> dct:format "CSV" .
"#;

fn extract(turtle: &str, mode: ExtractionMode, filter: Option<&FilterTable>) -> Result<(Vec<String>, Vec<PropertyUsage>)> {
    let graph = RdfGraph::from_turtle(turtle)?;
    let normalizer = PrefixNormalizer::builtin();
    let inventory = EntityExtractor::new(&graph, &normalizer)
        .prefixed(true)
        .with_filter(filter)
        .extract(mode)?;
    Ok((inventory.classes, inventory.properties))
}

#[test]
fn shape_paths_pair_with_target_classes() -> Result<()> {
    let (classes, properties) = extract(SHAPES, ExtractionMode::Shapes, None)?;

    assert_eq!(classes, vec!["dcat:Dataset", "dcat:Distribution"]);
    assert!(properties.contains(&PropertyUsage::with_parent("dct:title", "dcat:Dataset")));
    assert!(properties.contains(&PropertyUsage::with_parent("dct:description", "dcat:Dataset")));
    assert!(properties.contains(&PropertyUsage::with_parent("dct:description", "dcat:Distribution")));
    assert!(properties.contains(&PropertyUsage::parentless("dcat:keyword")));
    assert!(!properties.contains(&PropertyUsage::parentless("dct:title")));
    Ok(())
}

#[test]
fn instance_properties_pair_with_subject_types() -> Result<()> {
    let (classes, properties) = extract(DATA, ExtractionMode::Instances, None)?;

    assert_eq!(classes, vec!["dcat:Dataset"]);
    assert_eq!(
        properties,
        vec![
            PropertyUsage::parentless("dct:format"),
            PropertyUsage::with_parent("dcat:distribution", "dcat:Dataset"),
            PropertyUsage::with_parent("dct:title", "dcat:Dataset"),
        ]
        .into_iter()
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
    );
    Ok(())
}

#[test]
fn extraction_is_deterministic() -> Result<()> {
    let first = extract(SHAPES, ExtractionMode::Shapes, None)?;
    for _ in 0..5 {
        assert_eq!(extract(SHAPES, ExtractionMode::Shapes, None)?, first);
    }
    Ok(())
}

#[test]
fn filter_table_restricts_entities_and_parents() -> Result<()> {
    let table = "entity,parent,level\n\
                 dcat:Dataset,,mandatory\n\
                 dct:description,dcat:Distribution,mandatory\n\
                 dct:title,dcat:Dataset,recommended\n";
    let spec = FilterSpec::new("level", "mandatory");
    let filter = FilterTable::from_reader(table.as_bytes(), &spec)?;

    let (classes, properties) = extract(SHAPES, ExtractionMode::Shapes, Some(&filter))?;

    assert_eq!(classes, vec!["dcat:Dataset"]);
    assert_eq!(
        properties,
        vec![PropertyUsage::with_parent("dct:description", "dcat:Distribution")]
    );
    Ok(())
}
