use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Field names the prediction API requires, in request order.
pub const API_FIELDS: [&str; 11] = [
    "CustomerID",
    "Age",
    "Gender",
    "Tenure",
    "Usage_Frequency",
    "Support_Calls",
    "Payment_Delay",
    "Subscription_Type",
    "Contract_Length",
    "Total_Spend",
    "Last_Interaction",
];

pub const CHURN_FIELD: &str = "Churn";

/// One CSV data line keyed by trimmed header, in header order.
///
/// A `None` value means the line ended before this header's column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: Vec<(String, Option<String>)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later duplicates overwrite the value but keep the first position.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Like [`get`](Self::get) but keeps the "present but missing" case apart.
    pub fn entry(&self, key: &str) -> Option<&Option<String>> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for RawRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let present: Vec<_> = self
            .fields
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k, v)))
            .collect();
        let mut map = serializer.serialize_map(Some(present.len()))?;
        for (key, value) in present {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Typed record in the exact shape the prediction API expects.
///
/// Numeric `None` is the not-a-number sentinel and goes over the wire as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiRecord {
    #[serde(rename = "CustomerID")]
    pub customer_id: Option<String>,
    #[serde(rename = "Age")]
    pub age: Option<i64>,
    #[serde(rename = "Gender")]
    pub gender: Option<String>,
    #[serde(rename = "Tenure")]
    pub tenure: Option<i64>,
    #[serde(rename = "Usage_Frequency")]
    pub usage_frequency: Option<f64>,
    #[serde(rename = "Support_Calls")]
    pub support_calls: Option<i64>,
    #[serde(rename = "Payment_Delay")]
    pub payment_delay: Option<i64>,
    #[serde(rename = "Subscription_Type")]
    pub subscription_type: Option<String>,
    #[serde(rename = "Contract_Length")]
    pub contract_length: Option<String>,
    #[serde(rename = "Total_Spend")]
    pub total_spend: Option<i64>,
    #[serde(rename = "Last_Interaction")]
    pub last_interaction: Option<i64>,
}

/// What actually goes into a request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundRecord {
    Mapped(ApiRecord),
    Raw(RawRecord),
}

/// One item of the API's `results` array.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub data_sent: Map<String, Value>,
    pub prediction: Value,
}

impl PredictionResult {
    /// Lenient view over a result item: a missing or non-object `data_sent`
    /// becomes an empty object and a missing `prediction` becomes `null`.
    pub fn from_value(item: &Value) -> Self {
        let data_sent = item
            .get("data_sent")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let prediction = item.get("prediction").cloned().unwrap_or(Value::Null);
        Self {
            data_sent,
            prediction,
        }
    }
}

/// A sent record merged with its prediction and decoded category labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EnrichedRecord {
    fields: Map<String, Value>,
}

impl EnrichedRecord {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Churned only when `Churn` is exactly the number 1.
    pub fn churned(&self) -> bool {
        self.fields
            .get(CHURN_FIELD)
            .and_then(Value::as_f64)
            .map(|v| v == 1.0)
            .unwrap_or(false)
    }

    /// Text form of a field for display and grouping; `None` when absent.
    pub fn text(&self, key: &str) -> Option<String> {
        self.fields.get(key).map(value_to_text)
    }
}

/// Strings are rendered raw, `null` as empty, everything else as JSON.
/// Whole floats drop their fraction, so an echoed `14.0` reads `14`.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) if n.is_f64() => n.as_f64().map(number_to_text).unwrap_or_default(),
        other => other.to_string(),
    }
}

fn number_to_text(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e21 {
        return format!("{:.0}", n);
    }
    n.to_string()
}

/// Caller-owned accumulator for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultStore {
    records: Vec<EnrichedRecord>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = EnrichedRecord>) {
        self.records.extend(records);
    }

    pub fn records(&self) -> &[EnrichedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChurnCounts {
    pub churned: usize,
    pub stayed: usize,
}

impl ChurnCounts {
    pub fn record(&mut self, churned: bool) {
        if churned {
            self.churned += 1;
        } else {
            self.stayed += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.churned + self.stayed
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenderBreakdown {
    #[serde(rename = "Male")]
    pub male: ChurnCounts,
    #[serde(rename = "Female")]
    pub female: ChurnCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChurnAggregates {
    pub total: usize,
    pub churned: usize,
    pub stayed: usize,
    pub gender: GenderBreakdown,
    pub subscription_type: BTreeMap<String, ChurnCounts>,
    pub contract_length: BTreeMap<String, ChurnCounts>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    /// 1-based, as shown in progress messages.
    pub batch_number: usize,
    pub records: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmissionReport {
    pub total_batches: usize,
    pub succeeded_batches: usize,
    pub submitted_records: usize,
    pub failures: Vec<BatchFailure>,
}

impl SubmissionReport {
    pub fn failed_batches(&self) -> usize {
        self.failures.len()
    }
}

/// Output of the transform phase handed to load.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub store: ResultStore,
    pub aggregates: ChurnAggregates,
    pub submission: SubmissionReport,
}
