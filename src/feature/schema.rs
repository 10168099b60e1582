//! Static schema table for the four feature variants.
//!
//! Every variant has a fixed list of questions, a fixed set of top-level
//! fields and exactly one nested spec. Requiredness is looked up here rather
//! than hardcoded at the call sites.

use std::collections::HashMap;

use serde::{Deserialize, Serialize, Serializer};

use super::model::{
    Collected, CollectedValue, FeatureDocument, FieldFeature, FieldSpec, FirstLastFeature,
    FirstLastOperation, FirstLastSpec, FormulaFeature, FormulaSpec, MetricFeature, MetricSpec,
    SortDirection,
};
use crate::error::{ValidationError, ValidationErrors};

/// The kind of feature being assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    #[serde(rename = "METRIC")]
    Metric,
    #[serde(rename = "FIRST_LAST")]
    FirstLast,
    #[serde(rename = "FORMULA")]
    Formula,
    #[serde(rename = "FIELD")]
    Field,
}

/// Keywords recognised while selecting a feature type, in match priority.
const KEYWORDS: &[(&str, FeatureKind)] = &[
    ("metric", FeatureKind::Metric),
    ("first-last", FeatureKind::FirstLast),
    ("formula", FeatureKind::Formula),
    ("field", FeatureKind::Field),
];

impl FeatureKind {
    pub const ALL: [FeatureKind; 4] = [
        FeatureKind::Metric,
        FeatureKind::FirstLast,
        FeatureKind::Formula,
        FeatureKind::Field,
    ];

    /// Find the feature type named in free text.
    ///
    /// Case-insensitive substring match. When several keywords appear, the
    /// first entry of the keyword table wins, so "metric field" is a metric.
    pub fn from_text(text: &str) -> Option<FeatureKind> {
        let lower = text.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, kind)| *kind)
    }

    /// The value written to the document's `type` key.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Metric => "METRIC",
            Self::FirstLast => "FIRST_LAST",
            Self::Formula => "FORMULA",
            Self::Field => "FIELD",
        }
    }

    pub fn schema(&self) -> &'static VariantSchema {
        match self {
            Self::Metric => &METRIC,
            Self::FirstLast => &FIRST_LAST,
            Self::Formula => &FORMULA,
            Self::Field => &FIELD,
        }
    }
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A question target: a top-level field or a `parent.child` path into the
/// variant's nested spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPath {
    Top(&'static str),
    Nested {
        parent: &'static str,
        child: &'static str,
    },
}

impl FieldPath {
    /// The leaf field name (`child` for nested paths).
    pub fn leaf(&self) -> &'static str {
        match self {
            Self::Top(name) => name,
            Self::Nested { child, .. } => child,
        }
    }

    pub fn parent(&self) -> Option<&'static str> {
        match self {
            Self::Top(_) => None,
            Self::Nested { parent, .. } => Some(parent),
        }
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Top(name) => f.write_str(name),
            Self::Nested { parent, child } => write!(f, "{parent}.{child}"),
        }
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One leaf field of a variant.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub required: bool,
}

const fn required(name: &'static str) -> FieldDef {
    FieldDef {
        name,
        required: true,
    }
}

const fn optional(name: &'static str) -> FieldDef {
    FieldDef {
        name,
        required: false,
    }
}

const fn nested(parent: &'static str, child: &'static str) -> FieldPath {
    FieldPath::Nested { parent, child }
}

/// Schema of one feature variant.
#[derive(Debug)]
pub struct VariantSchema {
    pub kind: FeatureKind,
    /// Top-level fields other than `type` and the nested spec, in output order.
    pub top_fields: &'static [FieldDef],
    pub spec_key: &'static str,
    /// Nested spec fields in declaration (output) order.
    pub spec_fields: &'static [FieldDef],
    /// Fixed question sequence. Some optional fields are asked so the user
    /// can explicitly skip them.
    pub questions: &'static [FieldPath],
}

static METRIC: VariantSchema = VariantSchema {
    kind: FeatureKind::Metric,
    top_fields: &[required("name"), optional("description"), required("asset_id")],
    spec_key: "metric_spec",
    spec_fields: &[
        required("aggregation"),
        optional("field"),
        optional("filter_clause"),
    ],
    questions: &[
        FieldPath::Top("name"),
        FieldPath::Top("asset_id"),
        nested("metric_spec", "aggregation"),
        nested("metric_spec", "field"),
        nested("metric_spec", "filter_clause"),
    ],
};

static FIRST_LAST: VariantSchema = VariantSchema {
    kind: FeatureKind::FirstLast,
    top_fields: &[required("name"), optional("description"), required("asset_id")],
    spec_key: "first_last_spec",
    spec_fields: &[
        required("operation"),
        required("field"),
        required("order_by_field"),
        required("order_by_type"),
        optional("filter_clause"),
    ],
    questions: &[
        FieldPath::Top("name"),
        FieldPath::Top("asset_id"),
        nested("first_last_spec", "operation"),
        nested("first_last_spec", "field"),
        nested("first_last_spec", "order_by_field"),
        nested("first_last_spec", "order_by_type"),
        nested("first_last_spec", "filter_clause"),
    ],
};

static FORMULA: VariantSchema = VariantSchema {
    kind: FeatureKind::Formula,
    top_fields: &[required("name"), optional("description")],
    spec_key: "formula_spec",
    spec_fields: &[required("sql")],
    questions: &[FieldPath::Top("name"), nested("formula_spec", "sql")],
};

static FIELD: VariantSchema = VariantSchema {
    kind: FeatureKind::Field,
    top_fields: &[required("name"), optional("description"), required("asset_id")],
    spec_key: "field_spec",
    spec_fields: &[required("source_field_name")],
    questions: &[
        FieldPath::Top("name"),
        FieldPath::Top("asset_id"),
        nested("field_spec", "source_field_name"),
    ],
};

/// Ordered questions to ask for a variant.
pub fn fields_for(kind: FeatureKind) -> &'static [FieldPath] {
    kind.schema().questions
}

/// Whether the schema marks the leaf field at `path` as mandatory.
///
/// Unknown paths are treated as optional.
pub fn is_required(kind: FeatureKind, path: &FieldPath) -> bool {
    let schema = kind.schema();
    let defs = match path.parent() {
        None => schema.top_fields,
        Some(parent) if parent == schema.spec_key => schema.spec_fields,
        Some(_) => return false,
    };
    defs.iter()
        .find(|def| def.name == path.leaf())
        .is_some_and(|def| def.required)
}

/// Top-level key order of the serialized document.
pub fn serialize_order(kind: FeatureKind) -> Vec<&'static str> {
    let schema = kind.schema();
    let mut order = vec!["name", "description", "type"];
    if schema.top_fields.iter().any(|def| def.name == "asset_id") {
        order.push("asset_id");
    }
    order.extend(
        schema
            .top_fields
            .iter()
            .map(|def| def.name)
            .filter(|name| !matches!(*name, "name" | "description" | "asset_id")),
    );
    order.push(schema.spec_key);
    order
}

/// Validate collected answers and build the typed document for `kind`.
///
/// All failures are reported together, one entry per offending field path.
pub fn construct(kind: FeatureKind, collected: &Collected) -> Result<FeatureDocument, ValidationErrors> {
    let schema = kind.schema();
    let mut errors = ValidationErrors::default();

    let mut top = Record::new(None);
    for def in schema.top_fields {
        match collected.get(def.name) {
            Some(CollectedValue::Scalar(value)) => top.accept(def, value.as_deref(), &mut errors),
            Some(CollectedValue::Nested(_)) => {
                errors.push(ValidationError::new(def.name, "Input should be a valid string"));
            }
            None => top.accept(def, None, &mut errors),
        }
    }

    let mut spec = Record::new(Some(schema.spec_key));
    match collected.get(schema.spec_key) {
        Some(CollectedValue::Nested(children)) => {
            for def in schema.spec_fields {
                let value = children.get(def.name).and_then(|v| v.as_deref());
                spec.accept(def, value, &mut errors);
            }
        }
        Some(CollectedValue::Scalar(_)) => {
            errors.push(ValidationError::new(
                schema.spec_key,
                "Input should be a valid dictionary",
            ));
        }
        None => errors.push(ValidationError::new(schema.spec_key, "Field required")),
    }

    let name = top.text("name").unwrap_or_default();
    let description = top.text("description");

    let document = match kind {
        FeatureKind::Metric => Some(FeatureDocument::Metric(MetricFeature {
            name,
            description,
            kind,
            asset_id: top.text("asset_id").unwrap_or_default(),
            metric_spec: MetricSpec {
                aggregation: spec.text("aggregation").unwrap_or_default(),
                field: spec.text("field"),
                filter_clause: spec.text("filter_clause"),
            },
        })),
        FeatureKind::FirstLast => {
            let operation = spec.choice::<FirstLastOperation>("operation", &mut errors);
            let order_by_type = spec.choice::<SortDirection>("order_by_type", &mut errors);
            match (operation, order_by_type) {
                (Some(operation), Some(order_by_type)) => {
                    Some(FeatureDocument::FirstLast(FirstLastFeature {
                        name,
                        description,
                        kind,
                        asset_id: top.text("asset_id").unwrap_or_default(),
                        first_last_spec: FirstLastSpec {
                            operation,
                            field: spec.text("field").unwrap_or_default(),
                            order_by_field: spec.text("order_by_field").unwrap_or_default(),
                            order_by_type,
                            filter_clause: spec.text("filter_clause"),
                        },
                    }))
                }
                _ => None,
            }
        }
        FeatureKind::Formula => Some(FeatureDocument::Formula(FormulaFeature {
            name,
            description,
            kind,
            formula_spec: FormulaSpec {
                sql: spec.text("sql").unwrap_or_default(),
            },
        })),
        FeatureKind::Field => Some(FeatureDocument::Field(FieldFeature {
            name,
            description,
            kind,
            asset_id: top.text("asset_id").unwrap_or_default(),
            field_spec: FieldSpec {
                source_field_name: spec.text("source_field_name").unwrap_or_default(),
            },
        })),
    };

    match document {
        Some(document) if errors.is_empty() => Ok(document),
        Some(_) => Err(errors),
        None => {
            if errors.is_empty() {
                errors.push(ValidationError::new(schema.spec_key, "Input is incomplete"));
            }
            Err(errors)
        }
    }
}

/// A value restricted to a closed set of literals.
pub trait Choice: Sized {
    const ALLOWED: &'static [&'static str];

    /// Exact (case-sensitive) match against [`Choice::ALLOWED`].
    fn from_literal(value: &str) -> Option<Self>;
}

/// "Input should be 'A', 'B' or 'C'"
fn choice_message(allowed: &[&str]) -> String {
    let quoted: Vec<String> = allowed.iter().map(|v| format!("'{v}'")).collect();
    match quoted.split_last() {
        Some((last, rest)) if !rest.is_empty() => {
            format!("Input should be {} or {}", rest.join(", "), last)
        }
        Some((last, _)) => format!("Input should be {last}"),
        None => "Input should be empty".to_string(),
    }
}

/// Accepted leaf values for one level of the document.
struct Record {
    prefix: Option<&'static str>,
    values: HashMap<&'static str, String>,
}

impl Record {
    fn new(prefix: Option<&'static str>) -> Self {
        Self {
            prefix,
            values: HashMap::new(),
        }
    }

    fn path(&self, name: &str) -> String {
        match self.prefix {
            Some(prefix) => format!("{prefix}.{name}"),
            None => name.to_string(),
        }
    }

    fn accept(&mut self, def: &FieldDef, value: Option<&str>, errors: &mut ValidationErrors) {
        match value {
            Some(value) => {
                self.values.insert(def.name, value.to_string());
            }
            None if def.required => {
                errors.push(ValidationError::new(self.path(def.name), "Field required"));
            }
            None => {}
        }
    }

    fn text(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    /// Parse a closed-set field. Missing values were already reported by
    /// [`Record::accept`].
    fn choice<T: Choice>(&mut self, name: &str, errors: &mut ValidationErrors) -> Option<T> {
        let raw = self.values.remove(name)?;
        let parsed = T::from_literal(&raw);
        if parsed.is_none() {
            errors.push(ValidationError::new(self.path(name), choice_message(T::ALLOWED)));
        }
        parsed
    }
}
