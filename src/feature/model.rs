//! Feature document types and the raw answer mapping they are built from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::schema::{Choice, FeatureKind};

/// A collected answer: a top-level scalar, or the children of a nested spec.
///
/// `None` marks an optional field the user explicitly skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CollectedValue {
    Scalar(Option<String>),
    Nested(BTreeMap<String, Option<String>>),
}

/// Answers gathered so far, keyed by top-level field name.
pub type Collected = BTreeMap<String, CollectedValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FirstLastOperation {
    #[serde(rename = "FIRST")]
    First,
    #[serde(rename = "LAST")]
    Last,
}

impl Choice for FirstLastOperation {
    const ALLOWED: &'static [&'static str] = &["FIRST", "LAST"];

    fn from_literal(value: &str) -> Option<Self> {
        match value {
            "FIRST" => Some(Self::First),
            "LAST" => Some(Self::Last),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

impl Choice for SortDirection {
    const ALLOWED: &'static [&'static str] = &["ASC", "DESC"];

    fn from_literal(value: &str) -> Option<Self> {
        match value {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    /// e.g. COUNT, SUM, AVG, MIN, MAX
    pub aggregation: String,
    /// Not needed for COUNT(*).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_clause: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstLastSpec {
    pub operation: FirstLastOperation,
    /// Field whose first/last value is taken.
    pub field: String,
    pub order_by_field: String,
    pub order_by_type: SortDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_clause: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaSpec {
    pub sql: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub source_field_name: String,
}

// Field order below is the serialized key order: name, description, type,
// asset_id, then the type-specific block.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFeature {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    pub asset_id: String,
    pub metric_spec: MetricSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstLastFeature {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    pub asset_id: String,
    pub first_last_spec: FirstLastSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaFeature {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    pub formula_spec: FormulaSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFeature {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    pub asset_id: String,
    pub field_spec: FieldSpec,
}

/// A validated feature, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FeatureDocument {
    Metric(MetricFeature),
    FirstLast(FirstLastFeature),
    Formula(FormulaFeature),
    Field(FieldFeature),
}

impl FeatureDocument {
    pub fn kind(&self) -> FeatureKind {
        match self {
            Self::Metric(_) => FeatureKind::Metric,
            Self::FirstLast(_) => FeatureKind::FirstLast,
            Self::Formula(_) => FeatureKind::Formula,
            Self::Field(_) => FeatureKind::Field,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Metric(f) => &f.name,
            Self::FirstLast(f) => &f.name,
            Self::Formula(f) => &f.name,
            Self::Field(f) => &f.name,
        }
    }

    /// Render as a block-style YAML document.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
