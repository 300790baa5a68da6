use std::fs;
use std::path::PathBuf;

use assert_matches::assert_matches;
use clap::Parser;
use dcat_ap_lu_tools::{CliArgs, ToolConfig, ToolError, find_tool_error};

#[test]
fn merges_config_file_and_cli_overrides() {
    let config_dir = tempfile::tempdir().expect("config tempdir");
    let config_path = config_dir.path().join("tools.yaml");
    let yaml = "namespaces:\n  dpv: \"https://w3id.org/dpv#\"\nnormalization:\n  dc11: dc\nshapes_file: shapes/from_file.ttl\ntest_data_dir: data\n";
    fs::write(&config_path, yaml).expect("write config");

    let args = CliArgs::parse_from([
        "dcat-ap-lu",
        "--config",
        config_path.to_str().unwrap(),
        "validate",
        "--find",
        "mediaType",
        "--shapes",
        "shapes/from_cli.ttl",
    ]);
    let config = ToolConfig::from_args(&args).expect("config");

    assert_eq!(config.shapes_file, PathBuf::from("shapes/from_cli.ttl"));
    assert_eq!(config.test_data_dir, PathBuf::from("data"));
    assert_eq!(config.fixture_output_dir, PathBuf::from("tests/test_data/shacl"));
    assert_eq!(config.normalizer.normalize("dc11:creator"), "dc:creator");
    assert_eq!(config.normalizer.normalize("dcterms:title"), "dct:title");
    assert_eq!(
        config.namespace_map().namespace("dpv"),
        Some("https://w3id.org/dpv#")
    );
}

#[test]
fn toml_and_json_configs_are_accepted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let toml_path = dir.path().join("tools.toml");
    fs::write(&toml_path, "fixture_output_dir = \"out/fixtures\"\n").expect("write toml");
    let json_path = dir.path().join("tools.json");
    fs::write(&json_path, r#"{"fixture_output_dir": "out/json"}"#).expect("write json");

    for (path, expected) in [(toml_path, "out/fixtures"), (json_path, "out/json")] {
        let args = CliArgs::parse_from([
            "dcat-ap-lu",
            "--config",
            path.to_str().unwrap(),
            "generate-tests",
        ]);
        let config = ToolConfig::from_args(&args).expect("config");
        assert_eq!(config.fixture_output_dir, PathBuf::from(expected));
    }
}

#[test]
fn chained_normalization_is_config_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tools.yaml");
    fs::write(&path, "normalization:\n  dct: dcterms\n").expect("write config");

    let args = CliArgs::parse_from(["dcat-ap-lu", "--config", path.to_str().unwrap(), "generate-tests"]);
    let err = ToolConfig::from_args(&args).expect_err("expected failure");
    assert_matches!(find_tool_error(&err), Some(ToolError::Config(_)));
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tools.ini");
    fs::write(&path, "").expect("write config");

    let args = CliArgs::parse_from(["dcat-ap-lu", "--config", path.to_str().unwrap(), "generate-tests"]);
    let err = ToolConfig::from_args(&args).expect_err("expected failure");
    assert!(err.to_string().contains("unsupported config extension"));
}

#[test]
fn validate_requires_exactly_one_source() {
    assert!(CliArgs::try_parse_from(["dcat-ap-lu", "validate"]).is_err());
    assert!(
        CliArgs::try_parse_from(["dcat-ap-lu", "validate", "-d", "a.ttl", "-f", "x"]).is_err()
    );
    assert!(CliArgs::try_parse_from(["dcat-ap-lu", "validate", "-f", "x", "-t", "invalid"]).is_ok());
}
