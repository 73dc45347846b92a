use crate::domain::model::{ApiRecord, OutboundRecord, RawRecord};

/// Accepted CSV headers and the API field each one feeds. Matching is exact.
pub const COLUMN_MAPPING: [(&str, &str); 11] = [
    ("Last Interaction", "Last_Interaction"),
    ("Payment Delay", "Payment_Delay"),
    ("Support Calls", "Support_Calls"),
    ("Total Spend", "Total_Spend"),
    ("Usage Frequency", "Usage_Frequency"),
    ("Contract Length", "Contract_Length"),
    ("Gender", "Gender"),
    ("Subscription Type", "Subscription_Type"),
    ("Tenure", "Tenure"),
    ("Age", "Age"),
    ("CustomerID", "CustomerID"),
];

/// Rename stage: keeps only mapped headers, under their API names.
pub fn map_columns(record: &RawRecord) -> RawRecord {
    let mut mapped = RawRecord::new();
    for (csv_column, api_field) in COLUMN_MAPPING {
        if let Some(value) = record.entry(csv_column) {
            mapped.insert(api_field, value.clone());
        }
    }
    mapped
}

/// Coerce stage. Never fails; unparseable numbers become `None`.
pub fn format_for_api(mapped: &RawRecord) -> ApiRecord {
    let text = |field: &str| mapped.get(field).map(str::to_string);
    let int = |field: &str| mapped.get(field).and_then(parse_int_prefix);

    ApiRecord {
        customer_id: text("CustomerID"),
        age: int("Age"),
        gender: text("Gender"),
        tenure: int("Tenure"),
        usage_frequency: mapped.get("Usage_Frequency").and_then(parse_float_prefix),
        support_calls: int("Support_Calls"),
        payment_delay: int("Payment_Delay"),
        subscription_type: text("Subscription_Type"),
        contract_length: text("Contract_Length"),
        total_spend: int("Total_Spend"),
        last_interaction: int("Last_Interaction"),
    }
}

pub fn to_api_record(record: &RawRecord) -> ApiRecord {
    format_for_api(&map_columns(record))
}

/// Builds request items, mapping them only when `apply_schema_mapping` is set.
pub fn prepare_records(records: Vec<RawRecord>, apply_schema_mapping: bool) -> Vec<OutboundRecord> {
    if apply_schema_mapping {
        records
            .iter()
            .map(|record| OutboundRecord::Mapped(to_api_record(record)))
            .collect()
    } else {
        records.into_iter().map(OutboundRecord::Raw).collect()
    }
}

/// Base-10 integer from the longest leading numeric prefix: `" 42abc"` is 42,
/// `"12.9"` is 12, `"abc"` is `None`. Values outside `i64` are `None`.
pub fn parse_int_prefix(input: &str) -> Option<i64> {
    let s = input.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits = count_digits(rest.as_bytes());
    if digits == 0 {
        return None;
    }

    let magnitude: i64 = rest[..digits].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Decimal float from the longest leading numeric prefix, exponent included
/// (`"1.5e3x"` is 1500). `"Infinity"` with an optional sign is accepted.
pub fn parse_float_prefix(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let negative = bytes.first() == Some(&b'-');
    let mut end = usize::from(matches!(bytes.first(), Some(b'+') | Some(b'-')));

    if s[end..].starts_with("Infinity") {
        return Some(if negative { f64::NEG_INFINITY } else { f64::INFINITY });
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::API_FIELDS;

    fn raw(pairs: &[(&str, &str)]) -> RawRecord {
        let mut record = RawRecord::new();
        for (k, v) in pairs {
            record.insert(*k, Some(v.to_string()));
        }
        record
    }

    fn full_row() -> RawRecord {
        raw(&[
            ("CustomerID", "C-1"),
            ("Age", "30"),
            ("Gender", "Female"),
            ("Tenure", "39"),
            ("Usage Frequency", "14.5"),
            ("Support Calls", "5"),
            ("Payment Delay", "18"),
            ("Subscription Type", "Standard"),
            ("Contract Length", "Annual"),
            ("Total Spend", "932.00"),
            ("Last Interaction", "17"),
        ])
    }

    #[test]
    fn test_map_columns_renames_and_drops_unknown() {
        let mut record = full_row();
        record.insert("Churn", Some("1".to_string()));
        record.insert("age", Some("99".to_string()));

        let mapped = map_columns(&record);

        assert_eq!(mapped.len(), 11);
        assert!(mapped.contains_key("Usage_Frequency"));
        assert!(!mapped.contains_key("Usage Frequency"));
        assert!(!mapped.contains_key("Churn"));
        assert!(!mapped.contains_key("age"));
    }

    #[test]
    fn test_to_api_record_coerces_types() {
        let record = to_api_record(&full_row());

        assert_eq!(record.customer_id.as_deref(), Some("C-1"));
        assert_eq!(record.age, Some(30));
        assert_eq!(record.usage_frequency, Some(14.5));
        assert_eq!(record.total_spend, Some(932));
        assert_eq!(record.contract_length.as_deref(), Some("Annual"));
    }

    #[test]
    fn test_missing_columns_still_produce_all_fields() {
        let record = to_api_record(&raw(&[("Age", "44"), ("Extra", "x")]));
        let json = serde_json::to_value(&record).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();

        assert_eq!(keys, API_FIELDS.to_vec());
        assert_eq!(record.age, Some(44));
        assert_eq!(record.gender, None);
    }

    #[test]
    fn test_bad_numbers_become_sentinel() {
        let record = to_api_record(&raw(&[("Age", "unknown"), ("Tenure", "12 months")]));
        assert_eq!(record.age, None);
        assert_eq!(record.tenure, Some(12));
    }

    #[test]
    fn test_prepare_records_respects_mapping_flag() {
        let mapped = prepare_records(vec![full_row()], true);
        assert!(matches!(mapped[0], OutboundRecord::Mapped(_)));

        let passthrough = prepare_records(vec![full_row()], false);
        match &passthrough[0] {
            OutboundRecord::Raw(record) => assert_eq!(record.get("Usage Frequency"), Some("14.5")),
            other => panic!("expected raw record, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("42"), Some(42));
        assert_eq!(parse_int_prefix("  -7"), Some(-7));
        assert_eq!(parse_int_prefix("+3x"), Some(3));
        assert_eq!(parse_int_prefix("12.9"), Some(12));
        assert_eq!(parse_int_prefix("1e3"), Some(1));
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("-"), None);
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix("99999999999999999999"), None);
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("14.5"), Some(14.5));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("5."), Some(5.0));
        assert_eq!(parse_float_prefix("-2.5kg"), Some(-2.5));
        assert_eq!(parse_float_prefix("1.5e3x"), Some(1500.0));
        assert_eq!(parse_float_prefix("2e"), Some(2.0));
        assert_eq!(parse_float_prefix("3e+"), Some(3.0));
        assert_eq!(parse_float_prefix("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_float_prefix("."), None);
        assert_eq!(parse_float_prefix("n/a"), None);
    }
}
