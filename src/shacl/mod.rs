//! SHACL validation and fixture generation.
//!
//! - **shapes**: reads node and property shapes out of a shapes graph
//! - **validator**: `ConstraintChecker` and `ShapeValidator`
//! - **report**: `ValidationReport` with text and JSON renderings
//! - **fixtures**: draft valid/invalid Turtle fixtures per shape
//! - **lookup**: finds sample data files by name under the test data tree
//!
//! Only SHACL core constraints on predicate paths are supported; SPARQL-based
//! constraints and complex property paths are ignored.

pub mod fixtures;
pub mod lookup;
pub mod report;
pub mod shapes;
pub mod validator;

pub use fixtures::{FixtureExample, FixtureGenerator, gherkin_table};
pub use lookup::{FixtureKind, find_test_file};
pub use report::{Constraint, Severity, ValidationReport, ValidationResult};
pub use shapes::{NodeShape, PropertyShape, ShapeDiscovery};
pub use validator::{ConstraintChecker, ShapeValidator};
