//! Defined-vs-used coverage comparison.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Partition of the defined list into used and unused entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageResult {
    pub defined: Vec<String>,
    pub used: Vec<String>,
    pub unused: Vec<String>,
    pub coverage_percent: f64,
}

impl CoverageResult {
    pub fn defined_count(&self) -> usize {
        self.defined.len()
    }

    pub fn used_count(&self) -> usize {
        self.used.len()
    }

    pub fn unused_count(&self) -> usize {
        self.unused.len()
    }
}

/// Read a line-oriented list: trimmed, blank lines dropped, sorted, unique.
pub fn load_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read list {}", path.display()))?;
    Ok(parse_list(&content))
}

pub fn parse_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Split `defined` into the entries present in `used` and the rest, keeping
/// the order of `defined`.
pub fn compare(defined: &[String], used: &[String]) -> CoverageResult {
    let seen: BTreeSet<&str> = used.iter().map(String::as_str).collect();
    let (used, unused): (Vec<String>, Vec<String>) = defined
        .iter()
        .cloned()
        .partition(|item| seen.contains(item.as_str()));

    CoverageResult {
        coverage_percent: coverage_percent(used.len(), defined.len()),
        defined: defined.to_vec(),
        used,
        unused,
    }
}

/// `used / defined * 100` rounded to two decimals; `0.0` when nothing is defined.
///
/// Rounding is half-to-even on the exact binary value, so `1/32` reports
/// `3.12` rather than `3.13`.
pub fn coverage_percent(used: usize, defined: usize) -> f64 {
    if defined == 0 {
        return 0.0;
    }
    let ratio = used as f64 / defined as f64 * 100.0;
    format!("{ratio:.2}").parse().unwrap_or(ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn partitions_in_defined_order() {
        let defined = strings(&["dcat:Dataset", "dcat:Distribution", "dct:title"]);
        let used = strings(&["dcat:Dataset", "dct:title"]);
        let result = compare(&defined, &used);

        assert_eq!(result.used, strings(&["dcat:Dataset", "dct:title"]));
        assert_eq!(result.unused, strings(&["dcat:Distribution"]));
        assert_eq!(result.coverage_percent, 66.67);
    }

    #[test]
    fn empty_defined_list_is_zero_percent() {
        let result = compare(&[], &strings(&["a"]));
        assert_eq!(result.coverage_percent, 0.0);
        assert!(result.used.is_empty() && result.unused.is_empty());
    }

    #[test]
    fn used_items_outside_defined_are_ignored() {
        let result = compare(&strings(&["a"]), &strings(&["a", "b"]));
        assert_eq!(result.coverage_percent, 100.0);
    }

    #[test]
    fn ties_round_half_to_even() {
        assert_eq!(coverage_percent(1, 32), 3.12);
        assert_eq!(coverage_percent(5, 32), 15.62);
        assert_eq!(coverage_percent(3, 32), 9.38);
        assert_eq!(coverage_percent(7, 64), 10.94);
        assert_eq!(coverage_percent(1, 8), 12.5);
    }

    #[test]
    fn parse_list_trims_sorts_and_dedupes() {
        assert_eq!(
            parse_list("  b \n\na\nb\n   \n"),
            strings(&["a", "b"])
        );
    }
}
