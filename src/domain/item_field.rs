//! Single-cell edits coming from the admin data grids.
//!
//! The grid sends `{id, field, value}` with whatever JSON type the cell editor
//! produced, so values are coerced per field.

use serde_json::Value;

use crate::{
    domain::csv_import::{MAX_PRICE, SOLD_OUT_LABEL, parse_price, split_list},
    error::AppError,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ItemUpdate {
    Name(String),
    Price(i64),
    Category(String),
    Description(String),
    ImageUrl(String),
    SoldOut(bool),
    Allergens(Vec<String>),
    IsSet(bool),
    SetCount(Option<i32>),
    SetItems(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignageUpdate {
    Url(String),
    Duration(i32),
    Order(i32),
}

pub fn parse_item_update(field: &str, value: &Value) -> Result<ItemUpdate, AppError> {
    let update = match field {
        "name" => ItemUpdate::Name(non_empty(field, value)?),
        "price" => ItemUpdate::Price(
            coerce_price(value).ok_or_else(|| invalid(field, "a non-negative integer"))?,
        ),
        "category" => ItemUpdate::Category(non_empty(field, value)?),
        "description" => ItemUpdate::Description(coerce_string(value)?),
        "imageUrl" => ItemUpdate::ImageUrl(coerce_string(value)?),
        "isSoldOut" => {
            ItemUpdate::SoldOut(coerce_bool(value).ok_or_else(|| invalid(field, "a boolean"))?)
        }
        "allergens" => ItemUpdate::Allergens(coerce_list(value)?),
        "isSet" => ItemUpdate::IsSet(coerce_bool(value).ok_or_else(|| invalid(field, "a boolean"))?),
        "setCount" => match value {
            Value::Null => ItemUpdate::SetCount(None),
            Value::String(s) if s.trim().is_empty() => ItemUpdate::SetCount(None),
            other => {
                let count = coerce_int(other)
                    .filter(|n| *n >= 0)
                    .and_then(|n| i32::try_from(n).ok())
                    .ok_or_else(|| invalid(field, "a non-negative integer"))?;
                ItemUpdate::SetCount((count > 0).then_some(count))
            }
        },
        "setItems" => ItemUpdate::SetItems(coerce_list(value)?),
        other => {
            return Err(AppError::bad_request(format!(
                "Field {other} cannot be edited"
            )));
        }
    };
    Ok(update)
}

pub fn parse_signage_update(field: &str, value: &Value) -> Result<SignageUpdate, AppError> {
    let as_i32 = |v: &Value| coerce_int(v).and_then(|n| i32::try_from(n).ok());
    match field {
        "url" => Ok(SignageUpdate::Url(non_empty(field, value)?)),
        "duration" => as_i32(value)
            .filter(|d| *d > 0)
            .map(SignageUpdate::Duration)
            .ok_or_else(|| invalid(field, "a positive integer")),
        "order" => as_i32(value)
            .map(SignageUpdate::Order)
            .ok_or_else(|| invalid(field, "an integer")),
        other => Err(AppError::bad_request(format!(
            "Field {other} cannot be edited"
        ))),
    }
}

fn invalid(field: &str, expected: &str) -> AppError {
    AppError::bad_request(format!("{field} must be {expected}"))
}

fn coerce_string(value: &Value) -> Result<String, AppError> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        _ => Err(AppError::bad_request("Expected a text value")),
    }
}

fn non_empty(field: &str, value: &Value) -> Result<String, AppError> {
    let s = coerce_string(value)?;
    if s.is_empty() {
        return Err(invalid(field, "non-empty"));
    }
    Ok(s)
}

pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_price(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => parse_price(s),
        other => coerce_int(other).filter(|p| (0..=MAX_PRICE).contains(p)),
    }
}

pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim() {
            "true" | "TRUE" | "True" | "1" | SOLD_OUT_LABEL => Some(true),
            "false" | "FALSE" | "False" | "0" | "" | "販売中" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_list(value: &Value) -> Result<Vec<String>, AppError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(coerce_string)
            .filter(|s| !matches!(s, Ok(s) if s.is_empty()))
            .collect(),
        Value::String(s) => Ok(split_list(s)),
        Value::Null => Ok(Vec::new()),
        _ => Err(AppError::bad_request("Expected a list")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn price_accepts_numbers_and_strings() {
        assert_eq!(parse_item_update("price", &json!(500)).unwrap(), ItemUpdate::Price(500));
        assert_eq!(parse_item_update("price", &json!("650")).unwrap(), ItemUpdate::Price(650));
        assert_eq!(parse_item_update("price", &json!(300.0)).unwrap(), ItemUpdate::Price(300));
        assert!(parse_item_update("price", &json!("abc")).is_err());
        assert!(parse_item_update("price", &json!(-1)).is_err());
        assert!(parse_item_update("price", &json!(i64::MAX)).is_err());
        assert!(parse_item_update("price", &json!("99999999999")).is_err());
    }

    #[test]
    fn sold_out_accepts_checkbox_and_labels() {
        assert_eq!(parse_item_update("isSoldOut", &json!(true)).unwrap(), ItemUpdate::SoldOut(true));
        assert_eq!(parse_item_update("isSoldOut", &json!("売り切れ")).unwrap(), ItemUpdate::SoldOut(true));
        assert_eq!(parse_item_update("isSoldOut", &json!("false")).unwrap(), ItemUpdate::SoldOut(false));
        assert!(parse_item_update("isSoldOut", &json!("maybe")).is_err());
    }

    #[test]
    fn lists_accept_arrays_and_delimited_text() {
        assert_eq!(
            parse_item_update("allergens", &json!(["卵", " 乳 ", ""])).unwrap(),
            ItemUpdate::Allergens(vec!["卵".into(), "乳".into()])
        );
        assert_eq!(
            parse_item_update("setItems", &json!("から揚げ、ポテト")).unwrap(),
            ItemUpdate::SetItems(vec!["から揚げ".into(), "ポテト".into()])
        );
    }

    #[test]
    fn set_count_zero_clears_it() {
        assert_eq!(parse_item_update("setCount", &json!(0)).unwrap(), ItemUpdate::SetCount(None));
        assert_eq!(parse_item_update("setCount", &json!("2")).unwrap(), ItemUpdate::SetCount(Some(2)));
        assert_eq!(parse_item_update("setCount", &Value::Null).unwrap(), ItemUpdate::SetCount(None));
    }

    #[test]
    fn unknown_or_empty_fields_are_rejected() {
        assert!(parse_item_update("id", &json!("X")).is_err());
        assert!(parse_item_update("name", &json!("  ")).is_err());
    }

    #[test]
    fn signage_fields() {
        assert_eq!(parse_signage_update("duration", &json!("15")).unwrap(), SignageUpdate::Duration(15));
        assert_eq!(parse_signage_update("order", &json!(-1)).unwrap(), SignageUpdate::Order(-1));
        assert!(parse_signage_update("duration", &json!(0)).is_err());
        assert!(parse_signage_update("fadeDuration", &json!(2)).is_err());
    }
}
