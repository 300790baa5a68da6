//! Validation results and their text/JSON renderings.

use crate::rdf::SH_NS;
use anyhow::{Context, Result};
use oxigraph::model::NamedNode;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Violation,
}

impl Severity {
    /// Unknown severity IRIs are treated as the most severe level.
    pub fn from_iri(iri: &str) -> Self {
        match iri {
            "http://www.w3.org/ns/shacl#Info" => Severity::Info,
            "http://www.w3.org/ns/shacl#Warning" => Severity::Warning,
            _ => Severity::Violation,
        }
    }

    pub fn to_iri(&self) -> NamedNode {
        NamedNode::new_unchecked(format!("{}{}", SH_NS, self.local_name()))
    }

    pub fn local_name(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Violation => "Violation",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sh:{}", self.local_name())
    }
}

/// SHACL core constraint components checked by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constraint {
    MinCount,
    MaxCount,
    Datatype,
    Class,
    NodeKind,
    Pattern,
    MinLength,
    MaxLength,
    MinInclusive,
    MaxInclusive,
    In,
    HasValue,
    UniqueLang,
}

impl Constraint {
    pub fn component(&self) -> &'static str {
        match self {
            Constraint::MinCount => "MinCountConstraintComponent",
            Constraint::MaxCount => "MaxCountConstraintComponent",
            Constraint::Datatype => "DatatypeConstraintComponent",
            Constraint::Class => "ClassConstraintComponent",
            Constraint::NodeKind => "NodeKindConstraintComponent",
            Constraint::Pattern => "PatternConstraintComponent",
            Constraint::MinLength => "MinLengthConstraintComponent",
            Constraint::MaxLength => "MaxLengthConstraintComponent",
            Constraint::MinInclusive => "MinInclusiveConstraintComponent",
            Constraint::MaxInclusive => "MaxInclusiveConstraintComponent",
            Constraint::In => "InConstraintComponent",
            Constraint::HasValue => "HasValueConstraintComponent",
            Constraint::UniqueLang => "UniqueLangConstraintComponent",
        }
    }

    pub fn component_iri(&self) -> String {
        format!("{}{}", SH_NS, self.component())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// The node that caused the violation
    focus_node: String,
    result_path: Option<String>,
    /// The offending value, when the constraint is value-based
    value: Option<String>,
    message: String,
    severity: Severity,
    source_shape: String,
    source_constraint: Option<Constraint>,
}

impl ValidationResult {
    pub fn new(
        focus_node: String,
        message: String,
        severity: Severity,
        source_shape: String,
    ) -> Self {
        Self {
            focus_node,
            result_path: None,
            value: None,
            message,
            severity,
            source_shape,
            source_constraint: None,
        }
    }

    pub fn with_path(mut self, path: String) -> Self {
        self.result_path = Some(path);
        self
    }

    pub fn with_value(mut self, value: String) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.source_constraint = Some(constraint);
        self
    }

    pub fn focus_node(&self) -> &str {
        &self.focus_node
    }

    pub fn result_path(&self) -> Option<&str> {
        self.result_path.as_deref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn source_shape(&self) -> &str {
        &self.source_shape
    }

    pub fn source_constraint(&self) -> Option<Constraint> {
        self.source_constraint
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    conforms: bool,
    results: Vec<ValidationResult>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            conforms: true,
            results: Vec::new(),
        }
    }

    pub fn add_result(&mut self, result: ValidationResult) {
        if result.severity == Severity::Violation {
            self.conforms = false;
        }
        self.results.push(result);
    }

    pub fn conforms(&self) -> bool {
        self.conforms
    }

    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    pub fn violations(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results
            .iter()
            .filter(|r| r.severity == Severity::Violation)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results
            .iter()
            .filter(|r| r.severity == Severity::Warning)
    }

    pub fn violation_count(&self) -> usize {
        self.violations().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize validation report")
    }

    /// Plain-text report in the usual "Validation Report" layout.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let conforms = if self.conforms { "True" } else { "False" };
        let _ = writeln!(out, "Validation Report");
        let _ = writeln!(out, "Conforms: {conforms}");
        if self.results.is_empty() {
            return out;
        }
        let _ = writeln!(out, "Results ({}):", self.results.len());
        for result in &self.results {
            match result.source_constraint {
                Some(constraint) => {
                    let _ = writeln!(
                        out,
                        "Constraint {} in {} ({}):",
                        result.severity.local_name(),
                        constraint.component(),
                        constraint.component_iri()
                    );
                }
                None => {
                    let _ = writeln!(out, "Constraint {}:", result.severity.local_name());
                }
            }
            let _ = writeln!(out, "\tSeverity: {}", result.severity);
            let _ = writeln!(out, "\tSource Shape: {}", result.source_shape);
            let _ = writeln!(out, "\tFocus Node: {}", result.focus_node);
            if let Some(value) = &result.value {
                let _ = writeln!(out, "\tValue Node: {value}");
            }
            if let Some(path) = &result.result_path {
                let _ = writeln!(out, "\tResult Path: {path}");
            }
            let _ = writeln!(out, "\tMessage: {}", result.message);
        }
        out
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_round_trips_through_iri() {
        let iri = Severity::Warning.to_iri();
        assert_eq!(iri.as_str(), "http://www.w3.org/ns/shacl#Warning");
        assert_eq!(Severity::from_iri(iri.as_str()), Severity::Warning);
        assert_eq!(Severity::from_iri("http://example.org/odd"), Severity::Violation);
    }

    #[test]
    fn only_violations_break_conformance() {
        let mut report = ValidationReport::new();
        report.add_result(ValidationResult::new(
            "<http://example.org/n>".into(),
            "just a warning".into(),
            Severity::Warning,
            "<http://example.org/shape>".into(),
        ));
        assert!(report.conforms());
        assert_eq!(report.warning_count(), 1);

        report.add_result(
            ValidationResult::new(
                "<http://example.org/n>".into(),
                "missing title".into(),
                Severity::Violation,
                "<http://example.org/shape>".into(),
            )
            .with_constraint(Constraint::MinCount),
        );
        assert!(!report.conforms());
        assert_eq!(report.violation_count(), 1);
    }

    #[test]
    fn text_rendering() {
        let mut report = ValidationReport::new();
        assert_eq!(report.render_text(), "Validation Report\nConforms: True\n");

        report.add_result(
            ValidationResult::new(
                "<http://example.org/ds>".into(),
                "Property must have at least 1 value(s)".into(),
                Severity::Violation,
                "<http://example.org/titleShape>".into(),
            )
            .with_path("<http://purl.org/dc/terms/title>".into())
            .with_constraint(Constraint::MinCount),
        );
        let text = report.render_text();
        assert!(text.starts_with("Validation Report\nConforms: False\nResults (1):\n"));
        assert!(text.contains("Constraint Violation in MinCountConstraintComponent"));
        assert!(text.contains("\tResult Path: <http://purl.org/dc/terms/title>\n"));
    }
}
