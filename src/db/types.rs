//! MySQL column value to JSON mapping.
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies the column's type name
//! 2. A per-category decoder extracts the value
//!
//! Statements run over the text protocol, so every value arrives as text on
//! the wire. When a typed decode is refused, the raw text is used instead of
//! dropping the value.

use serde_json::{Map, Value as JsonValue};
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Column, Decode, Row, Type, TypeInfo};

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for MySQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Date,
    DateTime,
    Timestamp,
    Time,
    Binary,
    Json,
    Text,
}

/// Classify a MySQL type name (as reported by the driver) into a category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Decimal first, so "decimal" never reaches the float checks
    if lower.contains("decimal") || lower.contains("numeric") {
        return TypeCategory::Decimal;
    }

    // BOOLEAN is TINYINT(1) on the wire and stays numeric
    if lower.contains("int") || lower == "boolean" || lower == "year" {
        return TypeCategory::Integer;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    match lower.as_str() {
        "date" => return TypeCategory::Date,
        "datetime" => return TypeCategory::DateTime,
        "timestamp" => return TypeCategory::Timestamp,
        "time" => return TypeCategory::Time,
        "json" => return TypeCategory::Json,
        _ => {}
    }

    if lower.contains("blob") || lower.contains("binary") || lower == "bit" || lower == "geometry" {
        return TypeCategory::Binary;
    }

    // varchar, char, text, enum, set, ...
    TypeCategory::Text
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// Raw DECIMAL value as a string, preserving the exact database representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

// =============================================================================
// Binary Encoding
// =============================================================================

/// Decode binary data to a JSON string: UTF-8 text when valid, base64 otherwise.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

// =============================================================================
// Row Conversion
// =============================================================================

/// Convert a row to a JSON object, keeping the driver's column order.
pub fn row_to_json(row: &MySqlRow) -> Map<String, JsonValue> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let category = categorize_type(col.type_info().name());
            (col.name().to_string(), decode_column(row, idx, category))
        })
        .collect()
}

fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> JsonValue {
    if is_null(row, idx) {
        return JsonValue::Null;
    }
    let value = match category {
        TypeCategory::Decimal => decode_decimal(row, idx),
        TypeCategory::Integer => decode_integer(row, idx),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::Date => decode_serialized::<chrono::NaiveDate>(row, idx),
        TypeCategory::DateTime => decode_serialized::<chrono::NaiveDateTime>(row, idx),
        TypeCategory::Timestamp => decode_serialized::<chrono::DateTime<chrono::Utc>>(row, idx),
        TypeCategory::Time => decode_serialized::<chrono::NaiveTime>(row, idx),
        TypeCategory::Binary => decode_binary_col(row, idx),
        TypeCategory::Json => decode_json(row, idx),
        TypeCategory::Text => row
            .try_get::<String, _>(idx)
            .ok()
            .map(JsonValue::String),
    };
    value.unwrap_or_else(|| decode_raw_text(row, idx))
}

fn is_null(row: &MySqlRow, idx: usize) -> bool {
    use sqlx::ValueRef;
    row.try_get_raw(idx).map(|v| v.is_null()).unwrap_or(true)
}

fn decode_decimal(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    row.try_get::<RawDecimal, _>(idx)
        .ok()
        .map(|v| JsonValue::String(v.0))
}

fn decode_integer(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(v) = row.try_get::<u64, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    // YEAR and friends: the text form is a plain integer
    let text = row.try_get_unchecked::<String, _>(idx).ok()?;
    text.trim()
        .parse::<i64>()
        .ok()
        .map(|v| JsonValue::Number(v.into()))
}

fn decode_float(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    let v = match row.try_get::<f64, _>(idx) {
        Ok(v) => v,
        Err(_) => row.try_get::<f32, _>(idx).ok()? as f64,
    };
    Some(
        serde_json::Number::from_f64(v)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(v.to_string())),
    )
}

/// Decode via a chrono type and emit its ISO-8601 serde form.
fn decode_serialized<T>(row: &MySqlRow, idx: usize) -> Option<JsonValue>
where
    T: for<'r> Decode<'r, sqlx::MySql> + Type<sqlx::MySql> + serde::Serialize,
{
    // Zero dates and out-of-range TIME values fall through to raw text
    let value = row.try_get::<T, _>(idx).ok()?;
    serde_json::to_value(value).ok()
}

fn decode_binary_col(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    row.try_get_unchecked::<Vec<u8>, _>(idx)
        .ok()
        .map(|v| decode_binary_value(&v))
}

fn decode_json(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    if let Ok(v) = row.try_get::<JsonValue, _>(idx) {
        return Some(v);
    }
    let text = row.try_get_unchecked::<String, _>(idx).ok()?;
    serde_json::from_str(&text).ok()
}

fn decode_raw_text(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get_unchecked::<Vec<u8>, _>(idx) {
        Ok(bytes) => decode_binary_value(&bytes),
        Err(e) => {
            tracing::warn!(column = idx, error = %e, "Failed to decode column value");
            JsonValue::Null
        }
    }
}
