//! Total extraction functions over loosely typed upstream documents.
//!
//! Each function returns a value for every input shape: a missing key, a
//! `null`, or an unexpected type yields the documented default instead of an
//! error. The broker decides what a default means for its operation.

use crate::domain::model::{PropertyRecord, UNKNOWN_TEXT};
use serde_json::Value;

/// Reads `address.postcode` from a reverse-geocoding document.
///
/// The geocoder answers with a single object; a list answer is read from its
/// first element.
pub fn postal_code(document: &Value) -> Option<&str> {
    let result = match document {
        Value::Array(items) => items.first()?,
        other => other,
    };

    result
        .get("address")?
        .get("postcode")?
        .as_str()
        .map(str::trim)
        .filter(|code| !code.is_empty())
}

/// Strips a ZIP+4 suffix and keeps the code only if it is five digits.
pub fn normalize_zip(postcode: &str) -> Option<String> {
    let head = postcode.trim().split('-').next()?.trim();

    if head.len() == 5 && head.bytes().all(|b| b.is_ascii_digit()) {
        Some(head.to_string())
    } else {
        None
    }
}

/// Reads the raw population from a `[header, row, ...]` table: first column of
/// the second row. Numeric strings and JSON numbers are accepted.
pub fn population_cell(table: &Value) -> Option<u64> {
    let cell = table.as_array()?.get(1)?.as_array()?.first()?;

    match cell {
        Value::String(text) => text.trim().parse::<u64>().ok(),
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|n| n.is_finite() && *n >= 0.0)
                .map(|n| n.trunc() as u64)
        }),
        _ => None,
    }
}

/// First element of a `results` array, if any.
pub fn first_result(document: &Value) -> Option<&Value> {
    document.get("results")?.as_array()?.first()
}

/// Non-empty string at `key`, or `"Unknown"`.
pub fn text_field(object: &Value, key: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(UNKNOWN_TEXT)
        .to_string()
}

/// Non-zero integer at `key`, or `None`. Whole-valued floats and numeric
/// strings are accepted.
pub fn integer_field(object: &Value, key: &str) -> Option<i64> {
    let value = object.get(key)?;

    let parsed = match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|n| n.is_finite() && n.fract() == 0.0)
                .map(|n| n as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.filter(|n| *n != 0)
}

/// Non-zero finite number at `key`, or `None`. Numeric strings are accepted.
pub fn number_field(object: &Value, key: &str) -> Option<f64> {
    let value = object.get(key)?;

    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed.filter(|n| n.is_finite() && *n != 0.0)
}

/// Builds the fixed-shape property record from one upstream result.
pub fn property_record(result: &Value) -> PropertyRecord {
    let empty = Value::Object(Default::default());
    let fields = result.get("fields").filter(|f| f.is_object()).unwrap_or(&empty);

    PropertyRecord {
        address: text_field(result, "formatted_address"),
        property_type: text_field(fields, "property_type"),
        year_built: integer_field(fields, "year_built"),
        bedrooms: integer_field(fields, "bedrooms"),
        bathrooms: number_field(fields, "bathrooms"),
        sqft: integer_field(fields, "square_footage"),
        lot_size: number_field(fields, "lot_size"),
        assessed_value: number_field(fields, "assessed_value"),
        market_value: number_field(fields, "market_value"),
    }
}
