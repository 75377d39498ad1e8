//! Field mapping extraction.
//!
//! A mapping document lists its fields either under `mappings.properties`
//! or directly under `mappings`. Both shapes are normalized here into one
//! field tree per index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tracing::debug;

use super::Doc;
use crate::bundle::{Artifact, Bundle};
use crate::error::Result;

/// Keys directly under `mappings` that configure the mapping rather than
/// declare a field.
const MAPPING_PARAMETERS: &[&str] = &[
    "dynamic",
    "dynamic_templates",
    "dynamic_date_formats",
    "date_detection",
    "numeric_detection",
    "subobjects",
    "enabled",
    "runtime",
    "_source",
    "_meta",
    "_routing",
    "_field_names",
    "_all",
    "_size",
    "_data_stream_timestamp",
    "_parent",
    "_timestamp",
    "_ttl",
];

/// One mapped field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Declared type; object fields often omit it.
    pub field_type: Option<String>,
    /// Whether fielddata is enabled on the field.
    pub fielddata: bool,
    /// Sub-fields of an object or nested field.
    pub properties: BTreeMap<String, FieldMapping>,
}

impl FieldMapping {
    /// Returns true if the field has the given type.
    #[must_use]
    pub fn is_type(&self, field_type: &str) -> bool {
        self.field_type.as_deref() == Some(field_type)
    }
}

/// The normalized mapping of one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMapping {
    /// Index name.
    pub index: String,
    /// Top-level fields by name.
    pub fields: BTreeMap<String, FieldMapping>,
    /// Whether unmapped fields are added automatically.
    pub dynamic: bool,
}

impl IndexMapping {
    /// Every field in the tree with its dotted path, depth first in name order.
    #[must_use]
    pub fn walk(&self) -> Vec<(String, &FieldMapping)> {
        let mut out = Vec::new();
        walk_into(&self.fields, "", &mut out);
        out
    }

    /// Declared type of the `_id` field, if the mapping declares one.
    #[must_use]
    pub fn id_field_type(&self) -> Option<&str> {
        self.fields.get("_id").and_then(|f| f.field_type.as_deref())
    }
}

fn walk_into<'a>(
    fields: &'a BTreeMap<String, FieldMapping>,
    prefix: &str,
    out: &mut Vec<(String, &'a FieldMapping)>,
) {
    for (name, field) in fields {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        out.push((path.clone(), field));
        walk_into(&field.properties, &path, out);
    }
}

/// Extracts mappings, sorted by index name.
pub fn extract(bundle: &impl Bundle) -> Result<Vec<IndexMapping>> {
    let value = bundle.read_json(Artifact::Mappings)?;
    parse(&value)
}

pub(crate) fn parse(value: &serde_json::Value) -> Result<Vec<IndexMapping>> {
    let doc = Doc::root(Artifact::Mappings, value);
    let mut indices = Vec::new();

    for (index, entry) in doc.entries()? {
        let mappings = entry.require("mappings")?;
        let fields = match mappings.get("properties") {
            Some(properties) if properties.value().is_object() => parse_fields(&properties)?,
            _ => parse_flat_fields(&mappings)?,
        };
        indices.push(IndexMapping {
            index: index.to_string(),
            fields,
            dynamic: dynamic_enabled(&mappings)?,
        });
    }

    indices.sort_by(|a, b| a.index.cmp(&b.index));
    Ok(indices)
}

fn parse_fields(doc: &Doc<'_>) -> Result<BTreeMap<String, FieldMapping>> {
    let mut fields = BTreeMap::new();
    for (name, field) in doc.entries()? {
        fields.insert(name.to_string(), parse_field(&field)?);
    }
    Ok(fields)
}

/// Fields declared directly under `mappings`. Mapping parameters and any
/// other non-object value are not fields.
fn parse_flat_fields(mappings: &Doc<'_>) -> Result<BTreeMap<String, FieldMapping>> {
    let mut fields = BTreeMap::new();
    for (name, field) in mappings.entries()? {
        if MAPPING_PARAMETERS.contains(&name) {
            continue;
        }
        if !field.value().is_object() {
            debug!(key = name, "non-object mapping key skipped");
            continue;
        }
        fields.insert(name.to_string(), parse_field(&field)?);
    }
    Ok(fields)
}

fn parse_field(doc: &Doc<'_>) -> Result<FieldMapping> {
    doc.as_object()?;
    Ok(FieldMapping {
        field_type: doc
            .get("type")
            .map(|d| d.to_str().map(str::to_string))
            .transpose()?,
        fielddata: doc.get("fielddata").map(|d| d.to_bool()).transpose()?.unwrap_or(false),
        properties: doc
            .get("properties")
            .map(|d| parse_fields(&d))
            .transpose()?
            .unwrap_or_default(),
    })
}

/// `dynamic` defaults to enabled; `false`, `strict` and `runtime` do not add
/// mapped fields.
fn dynamic_enabled(mappings: &Doc<'_>) -> Result<bool> {
    let Some(dynamic) = mappings.get("dynamic") else {
        return Ok(true);
    };
    if let Some(flag) = dynamic.value().as_bool() {
        return Ok(flag);
    }
    Ok(dynamic.to_str()?.eq_ignore_ascii_case("true"))
}
