use crate::domain::model::{value_to_text, ChurnAggregates, EnrichedRecord};
use serde_json::Value;

const MISSING_LABEL: &str = "(missing)";

/// Cross-tab counts over every enriched record.
///
/// Gender only counts the two known labels; subscription type and contract
/// length are keyed by whatever label each record carries.
pub fn aggregate(records: &[EnrichedRecord]) -> ChurnAggregates {
    let mut aggregates = ChurnAggregates {
        total: records.len(),
        ..ChurnAggregates::default()
    };

    for record in records {
        let churned = record.churned();
        if churned {
            aggregates.churned += 1;
        }

        match record.text("Gender").as_deref() {
            Some("Male") => aggregates.gender.male.record(churned),
            Some("Female") => aggregates.gender.female.record(churned),
            _ => {}
        }

        aggregates
            .subscription_type
            .entry(label(record, "Subscription_Type"))
            .or_default()
            .record(churned);
        aggregates
            .contract_length
            .entry(label(record, "Contract_Length"))
            .or_default()
            .record(churned);
    }

    aggregates.stayed = aggregates.total - aggregates.churned;
    aggregates
}

/// Absent keys and `null` values both count as missing.
fn label(record: &EnrichedRecord, key: &str) -> String {
    match record.get(key) {
        None | Some(Value::Null) => MISSING_LABEL.to_string(),
        Some(value) => value_to_text(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ChurnCounts;
    use serde_json::json;

    fn record(value: Value) -> EnrichedRecord {
        EnrichedRecord::from_fields(value.as_object().unwrap().clone())
    }

    fn sample() -> Vec<EnrichedRecord> {
        vec![
            record(json!({"Gender": "Male", "Subscription_Type": "Basic", "Contract_Length": "Monthly", "Churn": 1})),
            record(json!({"Gender": "Female", "Subscription_Type": "Basic", "Contract_Length": "Annual", "Churn": 0})),
            record(json!({"Gender": "Female", "Subscription_Type": "Premium", "Contract_Length": "Annual", "Churn": 1})),
            record(json!({"Gender": 5, "Subscription_Type": 9, "Churn": 0})),
        ]
    }

    #[test]
    fn test_totals() {
        let aggregates = aggregate(&sample());
        assert_eq!(aggregates.total, 4);
        assert_eq!(aggregates.churned, 2);
        assert_eq!(aggregates.stayed, 2);
    }

    #[test]
    fn test_gender_excludes_unknown_labels() {
        let aggregates = aggregate(&sample());
        assert_eq!(aggregates.gender.male, ChurnCounts { churned: 1, stayed: 0 });
        assert_eq!(aggregates.gender.female, ChurnCounts { churned: 1, stayed: 1 });
        assert_eq!(aggregates.gender.male.total() + aggregates.gender.female.total(), 3);
    }

    #[test]
    fn test_dynamic_dimensions_cover_every_record() {
        let aggregates = aggregate(&sample());

        assert_eq!(aggregates.subscription_type["Basic"], ChurnCounts { churned: 1, stayed: 1 });
        assert_eq!(aggregates.subscription_type["9"], ChurnCounts { churned: 0, stayed: 1 });
        assert_eq!(aggregates.contract_length["(missing)"], ChurnCounts { churned: 0, stayed: 1 });

        let subscription_sum: usize = aggregates.subscription_type.values().map(ChurnCounts::total).sum();
        let contract_sum: usize = aggregates.contract_length.values().map(ChurnCounts::total).sum();
        assert_eq!(subscription_sum, aggregates.total);
        assert_eq!(contract_sum, aggregates.total);
    }

    #[test]
    fn test_null_category_counts_as_missing() {
        let records = vec![
            record(json!({"Subscription_Type": null, "Contract_Length": "Monthly", "Churn": 1})),
            record(json!({"Contract_Length": null, "Churn": 0})),
        ];

        let aggregates = aggregate(&records);

        let subscription_keys: Vec<&str> = aggregates.subscription_type.keys().map(String::as_str).collect();
        assert_eq!(subscription_keys, vec!["(missing)"]);
        assert_eq!(aggregates.subscription_type["(missing)"], ChurnCounts { churned: 1, stayed: 1 });
        assert_eq!(aggregates.contract_length["(missing)"], ChurnCounts { churned: 0, stayed: 1 });
        assert!(!aggregates.contract_length.contains_key(""));
    }

    #[test]
    fn test_empty_input() {
        let aggregates = aggregate(&[]);
        assert_eq!(aggregates, ChurnAggregates::default());
    }
}
