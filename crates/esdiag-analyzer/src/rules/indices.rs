//! Index settings and mapping rules.

use crate::config::AnalyzerConfig;
use crate::metrics::settings::DEFAULT_REFRESH_INTERVAL;
use crate::metrics::ClusterMetrics;
use crate::types::{codes, percent_of, Finding, FindingValue};

use super::name_or_count;

/// Reports how many indices refresh on the default interval.
///
/// Always informational; a high share only changes the advice.
pub fn check_refresh_interval(metrics: &ClusterMetrics, config: &AnalyzerConfig) -> Vec<Finding> {
    let Some(settings) = &metrics.settings else {
        return Vec::new();
    };
    if settings.is_empty() {
        return Vec::new();
    }
    let total = settings.len() as u64;
    let count = settings.iter().filter(|s| s.uses_default_refresh()).count() as u64;
    let percent = percent_of(count, total);

    let advice = if count as f64 / total as f64 > config.indices.max_default_refresh_ratio {
        "consider raising to 30s or 60s to speed up ingestion"
    } else {
        "that's ok"
    };
    vec![Finding::ok(
        codes::REFRESH_INTERVAL,
        format!(
            "refresh_interval is default {DEFAULT_REFRESH_INTERVAL} for {count} indices \
             ({percent:.2}%), {advice}"
        ),
    )
    .with_value(FindingValue::Ratio { count, total, percent })]
}

/// Flags indices whose `_id` field is mapped as anything but `keyword`.
pub fn check_id_field_type(metrics: &ClusterMetrics, _config: &AnalyzerConfig) -> Vec<Finding> {
    let Some(mappings) = &metrics.mappings else {
        return Vec::new();
    };
    let findings: Vec<Finding> = mappings
        .iter()
        .filter_map(|m| {
            m.id_field_type()
                .filter(|t| *t != "keyword")
                .map(|t| {
                    Finding::attention(
                        codes::ID_FIELD_TYPE,
                        format!("Index {} maps _id as {t}, expected keyword", m.index),
                    )
                    .with_value(FindingValue::Index(m.index.clone()))
                })
        })
        .collect();
    if findings.is_empty() {
        return vec![Finding::ok(codes::ID_FIELD_TYPE, "No index remaps the _id field")];
    }
    findings
}

/// Flags indices that accept unmapped fields dynamically.
pub fn check_dynamic_mapping(metrics: &ClusterMetrics, config: &AnalyzerConfig) -> Vec<Finding> {
    let Some(mappings) = &metrics.mappings else {
        return Vec::new();
    };
    let dynamic: Vec<String> = mappings
        .iter()
        .filter(|m| m.dynamic)
        .map(|m| m.index.clone())
        .collect();
    if dynamic.is_empty() {
        return vec![Finding::ok(
            codes::DYNAMIC_MAPPING,
            "Dynamic mapping is disabled on all indices",
        )];
    }

    let limit = config.indices.list_limit;
    let message = format!(
        "Dynamic mapping is enabled on {} indices",
        name_or_count(&dynamic, limit)
    );
    let value = if dynamic.len() < limit {
        FindingValue::Indices(dynamic)
    } else {
        FindingValue::Count(dynamic.len() as u64)
    };
    vec![Finding::attention(codes::DYNAMIC_MAPPING, message).with_value(value)]
}

/// Flags indices with more top-level fields than the limit.
pub fn check_field_count(metrics: &ClusterMetrics, config: &AnalyzerConfig) -> Vec<Finding> {
    let Some(mappings) = &metrics.mappings else {
        return Vec::new();
    };
    let limit = config.indices.max_fields;
    let findings: Vec<Finding> = mappings
        .iter()
        .filter(|m| m.fields.len() > limit)
        .map(|m| {
            Finding::attention(
                codes::FIELD_COUNT,
                format!(
                    "Index {} has {} top-level fields (limit {limit})",
                    m.index,
                    m.fields.len()
                ),
            )
            .with_value(FindingValue::IndexMetric {
                index: m.index.clone(),
                count: m.fields.len() as u64,
            })
        })
        .collect();
    if findings.is_empty() {
        return vec![Finding::ok(
            codes::FIELD_COUNT,
            format!("All indices have at most {limit} top-level fields"),
        )];
    }
    findings
}

/// Flags indices with more `nested` fields than the limit.
pub fn check_nested_field_count(metrics: &ClusterMetrics, config: &AnalyzerConfig) -> Vec<Finding> {
    let Some(mappings) = &metrics.mappings else {
        return Vec::new();
    };
    let limit = config.indices.max_nested_fields;
    let findings: Vec<Finding> = mappings
        .iter()
        .filter_map(|m| {
            let nested = m.walk().into_iter().filter(|(_, f)| f.is_type("nested")).count();
            (nested > limit).then(|| {
                Finding::attention(
                    codes::NESTED_FIELD_COUNT,
                    format!("Index {} has {nested} nested fields (limit {limit})", m.index),
                )
                .with_value(FindingValue::IndexMetric {
                    index: m.index.clone(),
                    count: nested as u64,
                })
            })
        })
        .collect();
    if findings.is_empty() {
        return vec![Finding::ok(
            codes::NESTED_FIELD_COUNT,
            format!("All indices have at most {limit} nested fields"),
        )];
    }
    findings
}

/// Lists fields whose name starts with the custom prefix, one finding per index.
pub fn check_custom_fields(metrics: &ClusterMetrics, config: &AnalyzerConfig) -> Vec<Finding> {
    let Some(mappings) = &metrics.mappings else {
        return Vec::new();
    };
    let prefix = config.indices.custom_field_prefix.as_str();
    let findings: Vec<Finding> = mappings
        .iter()
        .filter_map(|m| {
            let fields: Vec<String> = m
                .walk()
                .into_iter()
                .filter(|(path, _)| leaf_name(path).starts_with(prefix))
                .map(|(path, _)| path)
                .collect();
            (!fields.is_empty()).then(|| {
                Finding::ok(
                    codes::CUSTOM_FIELDS,
                    format!(
                        "Index {} has {} custom fields: {}",
                        m.index,
                        fields.len(),
                        fields.join(", ")
                    ),
                )
                .with_value(FindingValue::Fields {
                    index: m.index.clone(),
                    fields,
                })
            })
        })
        .collect();
    if findings.is_empty() {
        return vec![Finding::ok(
            codes::CUSTOM_FIELDS,
            format!("No fields use the {prefix} prefix"),
        )];
    }
    findings
}

/// Flags `text` fields with fielddata enabled, one finding per field.
pub fn check_text_fielddata(metrics: &ClusterMetrics, _config: &AnalyzerConfig) -> Vec<Finding> {
    let Some(mappings) = &metrics.mappings else {
        return Vec::new();
    };
    let mut findings = Vec::new();
    for mapping in mappings {
        for (path, field) in mapping.walk() {
            if field.is_type("text") && field.fielddata {
                findings.push(
                    Finding::attention(
                        codes::TEXT_FIELDDATA,
                        format!(
                            "Fielddata is enabled on text field {path} of index {}",
                            mapping.index
                        ),
                    )
                    .with_value(FindingValue::Field {
                        index: mapping.index.clone(),
                        field: path,
                    }),
                );
            }
        }
    }
    if findings.is_empty() {
        return vec![Finding::ok(codes::TEXT_FIELDDATA, "No text field has fielddata enabled")];
    }
    findings
}

/// Flags indices configured with fewer replicas than the minimum.
///
/// Indices that do not set a replica count are not counted.
pub fn check_replica_count(metrics: &ClusterMetrics, config: &AnalyzerConfig) -> Vec<Finding> {
    let Some(settings) = &metrics.settings else {
        return Vec::new();
    };
    let min = config.indices.min_replicas;
    let under: Vec<String> = settings
        .iter()
        .filter(|s| s.number_of_replicas.is_some_and(|r| r < min))
        .map(|s| s.index.clone())
        .collect();
    if under.is_empty() {
        return vec![Finding::ok(
            codes::REPLICA_COUNT,
            format!("All indices have at least {min} replicas"),
        )];
    }

    let limit = config.indices.list_limit;
    let message = format!(
        "{} indices have fewer than {min} replicas",
        name_or_count(&under, limit)
    );
    let value = if under.len() < limit {
        FindingValue::Indices(under)
    } else {
        FindingValue::Count(under.len() as u64)
    };
    vec![Finding::attention(codes::REPLICA_COUNT, message).with_value(value)]
}

fn leaf_name(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}
