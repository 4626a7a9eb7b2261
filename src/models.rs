//! Data models for the contact digest.
//!
//! This module contains the records pulled from the CRM and the
//! aggregate document written for the dashboard.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// A contact as fetched from the CRM, reduced to the fields the
/// aggregates need.
///
/// Everything except `attributes` and `listIds` is discarded when the
/// record is built, so names, emails and phone numbers never leave the
/// fetch layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    /// Free-text or numeric contact attributes, keyed by CRM attribute name.
    pub attributes: Map<String, Value>,
    /// Identifiers of the lists the contact belongs to, rendered as text.
    /// Empty identifiers are dropped.
    pub list_ids: Vec<String>,
}

impl RawRecord {
    /// Build a record from one element of a page's contact array.
    ///
    /// Never fails: a non-object element, a non-object `attributes` or a
    /// non-array `listIds` simply contribute nothing.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let attributes = obj
            .get("attributes")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let list_ids = obj
            .get("listIds")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| match id {
                        Value::Number(n) => Some(n.to_string()),
                        Value::String(s) if !s.is_empty() => Some(s.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            attributes,
            list_ids,
        }
    }

    /// Look up a raw attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// Size of one group in a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountItem {
    pub label: String,
    pub count: u64,
}

impl CountItem {
    pub fn new(label: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Groups sorted by count descending, ties broken by label ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregatedDataset(pub Vec<CountItem>);

impl AggregatedDataset {
    pub fn items(&self) -> &[CountItem] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all group counts.
    pub fn total(&self) -> u64 {
        self.0.iter().map(|item| item.count).sum()
    }
}

/// Headline totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Number of contacts fetched, regardless of which datasets they feed.
    pub contacts: u64,
}

/// The four public datasets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datasets {
    pub per_lista_ids: AggregatedDataset,
    pub distribuzione_atenei: AggregatedDataset,
    pub distribuzione_corsi: AggregatedDataset,
    pub distribuzione_anno_nascita: AggregatedDataset,
}

/// The artifact consumed by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDocument {
    /// Written as RFC 3339 with millisecond precision, e.g.
    /// `2026-03-01T08:30:00.123Z`.
    #[serde(serialize_with = "serialize_millis")]
    pub generated_at: DateTime<Utc>,
    pub totals: Totals,
    pub datasets: Datasets,
}

fn serialize_millis<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}
