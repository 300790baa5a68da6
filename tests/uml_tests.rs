use anyhow::Result;
use assert_matches::assert_matches;
use dcat_ap_lu_tools::uml::{UmlEntityKind, extract_from_path};
use dcat_ap_lu_tools::{ToolError, find_tool_error};
use std::fs;

const XMI: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xmi:XMI xmlns:xmi="http://schema.omg.org/spec/XMI/2.1" xmlns:uml="http://schema.omg.org/spec/UML/2.1">
  <uml:Model xmi:type="uml:Model" name="EA_Model"/>
  <xmi:Extension extender="Enterprise Architect" extenderID="6.5">
    <elements>
      <element xmi:idref="EAID_1" xmi:type="uml:Class" name="Dataset">
        <attributes>
          <attribute xmi:idref="EAID_A1" name="title">
            <stereotype stereotype="mandatory"/>
            <bounds lower="1" upper="*"/>
          </attribute>
          <attribute xmi:idref="EAID_A2" name="version"/>
        </attributes>
      </element>
    </elements>
    <connectors>
      <connector xmi:idref="EAID_C1">
        <source xmi:idref="EAID_1"><model name="Dataset"/></source>
        <target xmi:idref="EAID_2">
          <model name="Distribution"/>
          <role name="distribution"/>
          <type multiplicity="0..*"/>
        </target>
        <properties ea_type="Association" stereotype="recommended"/>
        <labels mb="&#171;optional&#187; distribution"/>
      </connector>
    </connectors>
  </xmi:Extension>
</xmi:XMI>
"#;

#[test]
fn extracts_entities_to_csv() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("model.xmi");
    fs::write(&path, XMI)?;

    let extraction = extract_from_path(&path)?;
    assert_eq!(extraction.attribute_count(), 2);
    assert_eq!(extraction.relationship_count(), 1);

    let title = &extraction.entities[0];
    assert_eq!(title.parent, "Dataset");
    assert_eq!(title.entity, "title");
    assert_eq!(title.qualifier, "mandatory");
    assert_eq!(title.cardinality, "1..n");

    let version = &extraction.entities[1];
    assert_eq!(version.qualifier, "None");
    assert_eq!(version.cardinality, "0..1");

    let relationship = &extraction.entities[2];
    assert_eq!(relationship.kind, UmlEntityKind::Relationship);
    assert_eq!(relationship.entity, "distribution");
    assert_eq!(relationship.cardinality, "0..n");
    // label stereotype wins over the connector property
    assert_eq!(relationship.qualifier, "optional");

    let mut csv = Vec::new();
    extraction.write_csv(&mut csv)?;
    let csv = String::from_utf8(csv)?;
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("parent,entity,qualifier,cardinality,type"));
    assert_eq!(lines.next(), Some("Dataset,title,mandatory,1..n,attribute"));
    assert_eq!(csv.lines().last(), Some("Dataset,distribution,optional,0..n,relationship"));
    Ok(())
}

#[test]
fn missing_file_is_invalid_input() {
    let err = extract_from_path(std::path::Path::new("/no/model.xmi")).unwrap_err();
    assert_matches!(find_tool_error(&err), Some(ToolError::InvalidInput { .. }));
}

#[test]
fn malformed_xml_carries_context() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("broken.xmi");
    fs::write(&path, "<xmi:XMI><xmi:Extension></xmi:XMI>")?;

    let err = extract_from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("broken.xmi"));
    Ok(())
}
