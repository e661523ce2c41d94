use std::collections::HashSet;
use std::fmt;
use std::fs;

use camino::Utf8Path;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_yaml::Value;

use crate::error::GeneScoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneSet {
    name: String,
    genes: Vec<String>,
}

impl GeneSet {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }
}

/// Ordered, immutable collection of named gene sets.
#[derive(Debug, Clone)]
pub struct GeneSetCatalog {
    sets: Vec<GeneSet>,
}

impl GeneSetCatalog {
    pub fn load(path: &Utf8Path) -> Result<Self, GeneScoreError> {
        let text = fs::read_to_string(path.as_std_path())
            .map_err(|err| GeneScoreError::catalog(path.as_str(), format!("unreadable: {err}")))?;
        Self::parse(&text, path.as_str())
    }

    /// Parses a YAML (or JSON) document mapping gene-set name to a list of
    /// gene identifiers. `origin` names the input in error messages.
    pub fn parse(text: &str, origin: &str) -> Result<Self, GeneScoreError> {
        if text.trim().is_empty() {
            return Err(GeneScoreError::catalog(origin, "document is empty"));
        }
        let raw: RawCatalog = serde_yaml::from_str(text).map_err(|err| {
            GeneScoreError::catalog(
                origin,
                format!("expected a mapping of gene-set name to a list of gene identifiers ({err})"),
            )
        })?;
        if raw.0.is_empty() {
            return Err(GeneScoreError::catalog(origin, "document defines no gene sets"));
        }

        let mut seen = HashSet::new();
        let mut sets = Vec::with_capacity(raw.0.len());
        for (key, members) in raw.0 {
            let name = match key {
                Value::String(name) => name,
                other => {
                    return Err(GeneScoreError::catalog(
                        origin,
                        format!("gene-set name {} is not a string", describe(&other)),
                    ));
                }
            };
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(GeneScoreError::catalog(origin, "gene-set name is empty"));
            }
            if !seen.insert(name.clone()) {
                return Err(GeneScoreError::catalog(
                    origin,
                    format!("gene-set name `{name}` is duplicated"),
                ));
            }
            let genes = gene_identifiers(&name, members, origin)?;
            sets.push(GeneSet { name, genes });
        }

        Ok(Self { sets })
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneSet> {
        self.sets.iter()
    }

    pub fn sets(&self) -> &[GeneSet] {
        &self.sets
    }

    pub fn get(&self, name: &str) -> Option<&GeneSet> {
        self.sets.iter().find(|set| set.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.sets.iter().map(|set| set.name.clone()).collect()
    }
}

/// Trimmed, deduplicated gene identifiers of one set. Only a sequence of
/// strings is accepted; numbers, booleans and null are rejected rather than
/// coerced.
fn gene_identifiers(
    set_name: &str,
    members: Value,
    origin: &str,
) -> Result<Vec<String>, GeneScoreError> {
    let members = match members {
        Value::Sequence(members) => members,
        other => {
            return Err(GeneScoreError::catalog(
                origin,
                format!(
                    "gene set `{set_name}` must be a sequence of gene identifiers, found {}",
                    describe(&other)
                ),
            ));
        }
    };
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(members.len());
    for member in members {
        let gene = match member {
            Value::String(gene) => gene,
            other => {
                return Err(GeneScoreError::catalog(
                    origin,
                    format!(
                        "gene set `{set_name}` contains {}, expected a string identifier",
                        describe(&other)
                    ),
                ));
            }
        };
        let gene = gene.trim();
        if gene.is_empty() {
            return Err(GeneScoreError::catalog(
                origin,
                format!("gene set `{set_name}` contains an empty gene identifier"),
            ));
        }
        if seen.insert(gene.to_string()) {
            unique.push(gene.to_string());
        }
    }
    Ok(unique)
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => format!("boolean `{flag}`"),
        Value::Number(number) => format!("number `{number}`"),
        Value::String(text) => format!("string `{text}`"),
        Value::Sequence(_) => "a sequence".to_string(),
        Value::Mapping(_) => "a mapping".to_string(),
        Value::Tagged(tagged) => format!("tagged value `{}`", tagged.tag),
    }
}

// Entries in document order; duplicated keys are kept so they can be reported.
struct RawCatalog(Vec<(Value, Value)>);

impl<'de> Deserialize<'de> for RawCatalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawCatalogVisitor;

        impl<'de> Visitor<'de> for RawCatalogVisitor {
            type Value = RawCatalog;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of gene-set name to a sequence of gene identifiers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, genes)) = map.next_entry::<Value, Value>()? {
                    entries.push((name, genes));
                }
                Ok(RawCatalog(entries))
            }
        }

        deserializer.deserialize_map(RawCatalogVisitor)
    }
}
