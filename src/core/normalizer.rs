use crate::domain::model::{EnrichedRecord, PredictionResult, CHURN_FIELD};
use serde_json::Value;

const GENDER_LABELS: [&str; 2] = ["Female", "Male"];
const CONTRACT_LENGTH_LABELS: [&str; 3] = ["Monthly", "Quarterly", "Annual"];
const SUBSCRIPTION_TYPE_LABELS: [&str; 3] = ["Basic", "Standard", "Premium"];

/// Turns one API response into enriched records, in response order.
///
/// A body without a `results` array yields nothing and is logged.
pub fn normalize_response(response: &Value) -> Vec<EnrichedRecord> {
    let Some(results) = response.get("results").and_then(Value::as_array) else {
        tracing::error!("❌ Unexpected API response shape: {}", response);
        return Vec::new();
    };

    results
        .iter()
        .map(|item| enrich(PredictionResult::from_value(item)))
        .collect()
}

/// Merges `data_sent` with `Churn` and decodes the categorical codes.
pub fn enrich(result: PredictionResult) -> EnrichedRecord {
    let mut fields = result.data_sent;
    fields.insert(CHURN_FIELD.to_string(), result.prediction);

    decode_field(&mut fields, "Gender", decode_gender);
    decode_field(&mut fields, "Contract_Length", decode_contract_length);
    decode_field(&mut fields, "Subscription_Type", decode_subscription_type);

    EnrichedRecord::from_fields(fields)
}

fn decode_field(
    fields: &mut serde_json::Map<String, Value>,
    key: &str,
    decode: fn(&Value) -> Option<&'static str>,
) {
    if let Some(value) = fields.get_mut(key) {
        if let Some(label) = decode(value) {
            *value = Value::String(label.to_string());
        }
    }
}

/// Label for an in-range numeric code; anything else is left alone.
pub fn decode_code<'a>(value: &Value, labels: &[&'a str]) -> Option<&'a str> {
    let code = value.as_f64()?;
    if code.fract() != 0.0 || code < 0.0 {
        return None;
    }
    labels.get(code as usize).copied()
}

pub fn decode_gender(value: &Value) -> Option<&'static str> {
    decode_code(value, &GENDER_LABELS)
}

pub fn decode_contract_length(value: &Value) -> Option<&'static str> {
    decode_code(value, &CONTRACT_LENGTH_LABELS)
}

pub fn decode_subscription_type(value: &Value) -> Option<&'static str> {
    decode_code(value, &SUBSCRIPTION_TYPE_LABELS)
}
