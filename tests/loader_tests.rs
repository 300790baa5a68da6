use anyhow::Result;
use assert_matches::assert_matches;
use dcat_ap_lu_tools::rdf::NamespaceMap;
use dcat_ap_lu_tools::{ToolError, find_tool_error, load_graph_from_path};
use std::fs;

const FIRST: &str = r#"
    @prefix dcat: <http://www.w3.org/ns/dcat#> .
    <http://example.org/ds/1> a dcat:Dataset .
"#;

const SECOND: &str = r#"
    @prefix dct: <http://purl.org/dc/terms/> .
    <http://example.org/ds/1> dct:title "Air quality" .
"#;

#[test]
fn corrupt_file_in_directory_is_skipped() -> Result<()> {
    let clean = tempfile::tempdir()?;
    fs::write(clean.path().join("a.ttl"), FIRST)?;
    fs::write(clean.path().join("b.ttl"), SECOND)?;

    let mixed = tempfile::tempdir()?;
    fs::write(mixed.path().join("a.ttl"), FIRST)?;
    fs::write(mixed.path().join("b.ttl"), SECOND)?;
    fs::write(mixed.path().join("broken.ttl"), "<http://example.org/x> a ")?;

    let (expected, clean_summary) = load_graph_from_path(clean.path(), NamespaceMap::with_defaults())?;
    let (graph, summary) = load_graph_from_path(mixed.path(), NamespaceMap::with_defaults())?;

    assert!(!clean_summary.has_skipped());
    assert_eq!(summary.skipped.len(), 1);
    assert!(summary.skipped[0].0.ends_with("broken.ttl"));
    assert_eq!(summary.loaded.len(), 2);
    assert_eq!(graph.sorted_quads()?, expected.sorted_quads()?);
    Ok(())
}

#[test]
fn corrupt_single_file_is_fatal() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("broken.ttl");
    fs::write(&path, "<http://example.org/x> a ")?;

    let err = load_graph_from_path(&path, NamespaceMap::with_defaults()).unwrap_err();
    assert_matches!(find_tool_error(&err), Some(ToolError::Parse { .. }));
    Ok(())
}

#[test]
fn missing_path_is_invalid_input() {
    let err = load_graph_from_path(
        std::path::Path::new("/definitely/not/here.ttl"),
        NamespaceMap::with_defaults(),
    )
    .unwrap_err();
    assert_matches!(find_tool_error(&err), Some(ToolError::InvalidInput { .. }));
}

#[test]
fn syntax_follows_extension() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(
        dir.path().join("data.nt"),
        "<http://example.org/a> <http://purl.org/dc/terms/title> \"A\" .\n",
    )?;
    fs::write(
        dir.path().join("data.rdf"),
        r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:dct="http://purl.org/dc/terms/">
  <rdf:Description rdf:about="http://example.org/b">
    <dct:title>B</dct:title>
  </rdf:Description>
</rdf:RDF>
"#,
    )?;

    let (graph, summary) = load_graph_from_path(dir.path(), NamespaceMap::with_defaults())?;
    assert!(!summary.has_skipped());
    assert_eq!(graph.len()?, 2);
    Ok(())
}

#[cfg(unix)]
#[test]
fn symlinked_file_in_directory_is_loaded() -> Result<()> {
    let outside = tempfile::tempdir()?;
    fs::write(outside.path().join("b.ttl"), SECOND)?;

    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("a.ttl"), FIRST)?;
    std::os::unix::fs::symlink(outside.path().join("b.ttl"), dir.path().join("link.ttl"))?;

    let (graph, summary) = load_graph_from_path(dir.path(), NamespaceMap::with_defaults())?;
    assert!(!summary.has_skipped());
    assert_eq!(summary.loaded.len(), 2);
    assert_eq!(graph.len()?, 2);
    Ok(())
}
