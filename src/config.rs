use crate::error::ToolError;
use crate::normalize::PrefixNormalizer;
use crate::rdf::NamespaceMap;
use crate::shacl::FixtureKind;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use oxigraph::model::NamedNode;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SHAPES_FILE: &str = "implementation/dcat_ap_lu/shacl_shapes/dcat_ap_lu_CM_shapes.ttl";
const DEFAULT_TEST_DATA_DIR: &str = "tests/test_data";
const DEFAULT_FIXTURE_OUTPUT_DIR: &str = "tests/test_data/shacl";

/// Settings shared by every subcommand, resolved from built-in defaults, an
/// optional config file and command-line flags (in increasing precedence).
#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub namespaces: BTreeMap<String, String>,
    pub normalizer: PrefixNormalizer,
    pub shapes_file: PathBuf,
    pub test_data_dir: PathBuf,
    pub fixture_output_dir: PathBuf,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            namespaces: BTreeMap::new(),
            normalizer: PrefixNormalizer::builtin(),
            shapes_file: PathBuf::from(DEFAULT_SHAPES_FILE),
            test_data_dir: PathBuf::from(DEFAULT_TEST_DATA_DIR),
            fixture_output_dir: PathBuf::from(DEFAULT_FIXTURE_OUTPUT_DIR),
        }
    }
}

impl ToolConfig {
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let file_config = if let Some(path) = args.config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            namespaces: file_namespaces,
            normalization: file_normalization,
            shapes_file: file_shapes_file,
            test_data_dir: file_test_data_dir,
            fixture_output_dir: file_fixture_output_dir,
        } = file_config;

        let (cli_shapes_file, cli_test_data_dir, cli_fixture_output_dir) = match &args.command {
            Command::Validate(validate) => {
                (validate.shapes.clone(), validate.test_data_dir.clone(), None)
            }
            Command::GenerateTests(generate) => {
                (generate.shapes.clone(), None, generate.output.clone())
            }
            _ => (None, None, None),
        };

        let normalizer = PrefixNormalizer::builtin()
            .extended(file_normalization.unwrap_or_default())
            .context("failed to build prefix normalization table")?;

        let config = Self {
            namespaces: file_namespaces.unwrap_or_default(),
            normalizer,
            shapes_file: cli_shapes_file
                .or(file_shapes_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SHAPES_FILE)),
            test_data_dir: cli_test_data_dir
                .or(file_test_data_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TEST_DATA_DIR)),
            fixture_output_dir: cli_fixture_output_dir
                .or(file_fixture_output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FIXTURE_OUTPUT_DIR)),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (prefix, namespace) in &self.namespaces {
            if !is_valid_prefix(prefix) {
                return Err(ToolError::Config(format!("invalid namespace prefix '{prefix}'")).into());
            }
            NamedNode::new(namespace.as_str()).map_err(|e| {
                ToolError::Config(format!("namespace for prefix '{prefix}' is not an IRI: {e}"))
            })?;
        }

        anyhow::ensure!(
            !self.shapes_file.as_os_str().is_empty(),
            "shapes_file must not be empty"
        );
        anyhow::ensure!(
            !self.test_data_dir.as_os_str().is_empty(),
            "test_data_dir must not be empty"
        );
        anyhow::ensure!(
            !self.fixture_output_dir.as_os_str().is_empty(),
            "fixture_output_dir must not be empty"
        );
        Ok(())
    }

    /// Built-in bindings overlaid with the configured ones.
    pub fn namespace_map(&self) -> NamespaceMap {
        let mut map = NamespaceMap::with_defaults();
        for (prefix, namespace) in &self.namespaces {
            map.bind(prefix, namespace);
        }
        map
    }
}

fn is_valid_prefix(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "dcat-ap-lu",
    about = "Coverage, UML and SHACL tooling for the DCAT-AP-LU metadata schema",
    version
)]
pub struct CliArgs {
    #[arg(
        long,
        env = "DCAT_AP_LU_CONFIG",
        value_name = "FILE",
        help = "Path to a configuration file (YAML, JSON or TOML)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Extract classes and properties from RDF data or SHACL shapes
    Extract(ExtractArgs),
    /// Compare a defined list against a used list
    Coverage(CoverageArgs),
    /// Extract attributes and relationships from a UML/XMI model
    Uml(UmlArgs),
    /// Validate RDF data against SHACL shapes
    Validate(ValidateArgs),
    /// Generate draft valid/invalid fixtures for every shape
    GenerateTests(GenerateTestsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(value_name = "INPUT", help = "RDF file or directory")]
    pub input: PathBuf,

    #[arg(long, help = "Render names as prefix:local")]
    pub prefixed: bool,

    #[arg(long, help = "Treat the input as SHACL shapes")]
    pub shacl: bool,

    #[arg(long, value_name = "FILE", help = "Write results as CSV")]
    pub csv: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Write results as JSON")]
    pub json: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "CSV side table restricting the output")]
    pub filter_csv: Option<PathBuf>,

    #[arg(long, value_name = "COLUMN", help = "Column of the filter table to match")]
    pub filter_column: Option<String>,

    #[arg(long, value_name = "VALUE", help = "Value the filter column must hold")]
    pub filter_value: Option<String>,

    #[arg(
        long,
        value_name = "COLUMN",
        default_value = "parent",
        help = "Column holding permitted parents (empty disables parent checks)"
    )]
    pub parent_column: String,

    #[arg(
        long,
        value_name = "COLUMN",
        default_value = "entity",
        help = "Column holding entity names"
    )]
    pub entity_column: String,
}

#[derive(Args, Debug, Clone)]
pub struct CoverageArgs {
    #[arg(value_name = "DEFINED", help = "Line list of defined entities")]
    pub defined: PathBuf,

    #[arg(value_name = "USED", help = "Line list of used entities")]
    pub used: PathBuf,

    #[arg(long, default_value = "Entity", help = "Label used in the report")]
    pub label: String,

    #[arg(long, value_name = "FILE", help = "Write results as CSV")]
    pub csv: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Write results as JSON")]
    pub json: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct UmlArgs {
    #[arg(value_name = "XMI", help = "XMI export of the UML model")]
    pub xmi: PathBuf,

    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = crate::uml::DEFAULT_OUTPUT,
        help = "Output CSV file"
    )]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone)]
#[command(group(
    clap::ArgGroup::new("source")
        .required(true)
        .args(["data", "find"])
))]
pub struct ValidateArgs {
    #[arg(short, long, value_name = "FILE", help = "Data file to validate")]
    pub data: Option<PathBuf>,

    #[arg(short, long, value_name = "SEARCH", help = "Search the test data tree by name")]
    pub find: Option<String>,

    #[arg(
        short = 't',
        long = "type",
        value_enum,
        default_value_t = FixtureKind::Valid,
        help = "Which fixture to pick with --find"
    )]
    pub kind: FixtureKind,

    #[arg(short, long, value_name = "FILE", help = "SHACL shapes file")]
    pub shapes: Option<PathBuf>,

    #[arg(long, value_name = "DIR", help = "Root searched by --find")]
    pub test_data_dir: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Also write the report as JSON")]
    pub json: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateTestsArgs {
    #[arg(long, value_name = "FILE", help = "SHACL shapes file")]
    pub shapes: Option<PathBuf>,

    #[arg(long, value_name = "DIR", help = "Directory receiving the fixtures")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    namespaces: Option<BTreeMap<String, String>>,
    normalization: Option<BTreeMap<String, String>>,
    shapes_file: Option<PathBuf>,
    test_data_dir: Option<PathBuf>,
    fixture_output_dir: Option<PathBuf>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        "toml" => toml::from_str(&contents)
            .with_context(|| format!("failed to parse TOML config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
