//! Policy document model.

use crate::engine::normalize_principal;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Table-set entry granting every table in a dataset.
pub const WILDCARD: &str = "*";

/// What one principal may do.
///
/// Operation names are stored trimmed and upper-cased. Dataset and table names
/// are compared exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct RuleSet {
    pub operations: HashSet<String>,
    pub datasets: HashMap<String, HashSet<String>>,
}

impl RuleSet {
    pub fn allows_operation(&self, operation: &str) -> bool {
        self.operations.contains(&normalize_operation(operation))
    }

    /// Tables granted in `dataset`, or `None` when the dataset is not listed.
    pub fn tables(&self, dataset: &str) -> Option<&HashSet<String>> {
        self.datasets.get(dataset)
    }
}

pub(crate) fn normalize_operation(operation: &str) -> String {
    operation.trim().to_ascii_uppercase()
}

#[derive(Deserialize)]
struct RawRuleSet {
    #[serde(default)]
    operations: Vec<Value>,
    #[serde(default)]
    datasets: HashMap<String, Vec<String>>,
}

impl TryFrom<Map<String, Value>> for RuleSet {
    type Error = serde_json::Error;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let raw: RawRuleSet = serde_json::from_value(Value::Object(map))?;
        let operations = raw
            .operations
            .iter()
            .filter_map(Value::as_str)
            .map(normalize_operation)
            .collect();
        let datasets = raw
            .datasets
            .into_iter()
            .map(|(dataset, tables)| (dataset, tables.into_iter().collect()))
            .collect();
        Ok(Self {
            operations,
            datasets,
        })
    }
}

/// The whole policy: a fallback rule set plus per-principal overrides.
///
/// The document and every rule set in it must be JSON objects.
///
/// A principal's own entry replaces the default entirely; the two are never
/// merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct PolicyDocument {
    pub default: Option<RuleSet>,
    pub principals: HashMap<String, RuleSet>,
}

impl PolicyDocument {
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Rule set governing `principal`, which must already be normalized.
    pub fn rules_for(&self, principal: &str) -> Option<&RuleSet> {
        self.principals.get(principal).or(self.default.as_ref())
    }
}

#[derive(Deserialize)]
struct RawPolicyDocument {
    #[serde(default)]
    default: Option<RuleSet>,
    #[serde(default)]
    principals: HashMap<String, RuleSet>,
}

impl TryFrom<Map<String, Value>> for PolicyDocument {
    type Error = serde_json::Error;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let raw: RawPolicyDocument = serde_json::from_value(Value::Object(map))?;
        let principals = raw
            .principals
            .into_iter()
            .map(|(principal, rules)| (normalize_principal(&principal), rules))
            .collect();
        Ok(Self {
            default: raw.default,
            principals,
        })
    }
}
