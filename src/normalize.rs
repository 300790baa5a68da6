//! Prefix normalization for short-form URIs.
//!
//! Different parsers and source files bind the same namespace under different
//! prefixes (`dcterms:` vs `dct:`, generated `ns1:` vs `dpv:`). The lookup
//! tables used by the project are keyed on the canonical prefixes, so every
//! short-form name goes through a [`PrefixNormalizer`] before comparison.

use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Built-in alternate → canonical prefix rewrites.
pub const DEFAULT_NORMALIZATION: &[(&str, &str)] = &[("dcterms", "dct"), ("ns1", "dpv")];

/// Declarative mapping from alternate prefixes to canonical ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct PrefixNormalizer {
    table: BTreeMap<String, String>,
}

impl PrefixNormalizer {
    /// Build a normalizer, rejecting tables where a canonical prefix is also
    /// rewritten (which would make normalization non-idempotent).
    pub fn new(table: BTreeMap<String, String>) -> Result<Self, ToolError> {
        let table: BTreeMap<String, String> = table
            .into_iter()
            .map(|(from, to)| (clean_prefix(&from), clean_prefix(&to)))
            .filter(|(from, to)| !from.is_empty() && from != to)
            .collect();

        for (from, to) in &table {
            if to.is_empty() {
                return Err(ToolError::Config(format!(
                    "prefix '{from}' is mapped to an empty prefix"
                )));
            }
            if table.contains_key(to) {
                return Err(ToolError::Config(format!(
                    "prefix '{from}' maps to '{to}', which is itself rewritten to '{}'",
                    table[to]
                )));
            }
        }

        Ok(Self { table })
    }

    /// The built-in table.
    pub fn builtin() -> Self {
        Self {
            table: DEFAULT_NORMALIZATION
                .iter()
                .map(|(from, to)| ((*from).to_string(), (*to).to_string()))
                .collect(),
        }
    }

    /// Layer `overrides` on top of this table.
    pub fn extended(&self, overrides: BTreeMap<String, String>) -> Result<Self, ToolError> {
        let mut table = self.table.clone();
        table.extend(overrides);
        Self::new(table)
    }

    /// Rewrite the prefix of a `prefix:local` string when it is mapped.
    pub fn normalize(&self, name: &str) -> String {
        match name.split_once(':') {
            Some((prefix, local)) => match self.table.get(prefix) {
                Some(canonical) => format!("{canonical}:{local}"),
                None => name.to_string(),
            },
            None => name.to_string(),
        }
    }

    pub fn table(&self) -> &BTreeMap<String, String> {
        &self.table
    }
}

impl Default for PrefixNormalizer {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TryFrom<BTreeMap<String, String>> for PrefixNormalizer {
    type Error = ToolError;

    fn try_from(table: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        Self::new(table)
    }
}

impl From<PrefixNormalizer> for BTreeMap<String, String> {
    fn from(normalizer: PrefixNormalizer) -> Self {
        normalizer.table
    }
}

fn clean_prefix(prefix: &str) -> String {
    prefix.trim().trim_end_matches(':').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_known_prefixes() {
        let normalizer = PrefixNormalizer::builtin();
        assert_eq!(normalizer.normalize("dcterms:title"), "dct:title");
        assert_eq!(normalizer.normalize("ns1:hasLegalBasis"), "dpv:hasLegalBasis");
    }

    #[test]
    fn passes_through_unmapped_and_full_uris() {
        let normalizer = PrefixNormalizer::builtin();
        assert_eq!(normalizer.normalize("dcat:Dataset"), "dcat:Dataset");
        assert_eq!(
            normalizer.normalize("http://purl.org/dc/terms/title"),
            "http://purl.org/dc/terms/title"
        );
        assert_eq!(normalizer.normalize("plain"), "plain");
    }

    #[test]
    fn only_the_prefix_is_rewritten() {
        let normalizer = PrefixNormalizer::builtin();
        assert_eq!(normalizer.normalize("dcterms:dcterms:x"), "dct:dcterms:x");
        assert_eq!(normalizer.normalize("dctermsx:title"), "dctermsx:title");
    }

    #[test]
    fn rejects_chained_rewrites() {
        let table = BTreeMap::from([
            ("a".to_string(), "b".to_string()),
            ("b".to_string(), "c".to_string()),
        ]);
        assert!(matches!(
            PrefixNormalizer::new(table),
            Err(ToolError::Config(_))
        ));
    }

    #[test]
    fn extension_overrides_builtin_entries() {
        let normalizer = PrefixNormalizer::builtin()
            .extended(BTreeMap::from([
                ("ns1".to_string(), "odrl".to_string()),
                ("dc11:".to_string(), "dc".to_string()),
            ]))
            .unwrap();
        assert_eq!(normalizer.normalize("ns1:Policy"), "odrl:Policy");
        assert_eq!(normalizer.normalize("dc11:title"), "dc:title");
        assert_eq!(normalizer.normalize("dcterms:title"), "dct:title");
    }

    #[test]
    fn deserializes_from_plain_map() {
        let normalizer: PrefixNormalizer =
            serde_json::from_str(r#"{"dcterms": "dct", "vcard4": "vcard"}"#).unwrap();
        assert_eq!(normalizer.normalize("vcard4:fn"), "vcard:fn");
    }
}
