//! Field access for wire payloads
//!
//! Every entity decoder goes through [`Fields`], so a missing or mistyped
//! required field always surfaces as [`MeteError::MalformedResponse`] naming the
//! entity and the field.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Number, Value};
use std::str::FromStr;

use common::money::{from_minor_units, round_to_minor, to_minor_units};
use common::{ApiVersion, MeteError, MeteResult};

/// Typed view over one JSON object
pub struct Fields<'a> {
    entity: &'static str,
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    pub fn new(entity: &'static str, value: &'a Value) -> MeteResult<Self> {
        match value {
            Value::Object(map) => Ok(Self { entity, map }),
            other => Err(MeteError::malformed(format!(
                "expected a {} object, got {}",
                entity,
                kind(other)
            ))),
        }
    }

    fn missing(&self, field: &str) -> MeteError {
        MeteError::malformed(format!("{} is missing '{}'", self.entity, field))
    }

    fn wrong(&self, field: &str, expected: &str, got: &Value) -> MeteError {
        MeteError::malformed(format!(
            "{}.{} should be {}, got {}",
            self.entity,
            field,
            expected,
            kind(got)
        ))
    }

    /// The value of a field, treating an explicit `null` as absent
    pub fn get(&self, field: &str) -> Option<&'a Value> {
        self.map.get(field).filter(|value| !value.is_null())
    }

    fn required(&self, field: &str) -> MeteResult<&'a Value> {
        self.get(field).ok_or_else(|| self.missing(field))
    }

    pub fn int(&self, field: &str) -> MeteResult<i64> {
        let value = self.required(field)?;
        as_int(value).ok_or_else(|| self.wrong(field, "an integer", value))
    }

    pub fn opt_int(&self, field: &str) -> MeteResult<Option<i64>> {
        self.get(field)
            .map(|value| as_int(value).ok_or_else(|| self.wrong(field, "an integer", value)))
            .transpose()
    }

    pub fn string(&self, field: &str) -> MeteResult<String> {
        let value = self.required(field)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.wrong(field, "a string", value))
    }

    pub fn opt_string(&self, field: &str) -> MeteResult<Option<String>> {
        self.get(field)
            .map(|value| {
                value
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.wrong(field, "a string", value))
            })
            .transpose()
    }

    /// A string or number, rendered as text
    pub fn text(&self, field: &str) -> MeteResult<String> {
        let value = self.required(field)?;
        match value {
            Value::String(text) => Ok(text.clone()),
            Value::Number(number) => Ok(number.to_string()),
            other => Err(self.wrong(field, "a string or number", other)),
        }
    }

    pub fn boolean(&self, field: &str) -> MeteResult<bool> {
        let value = self.required(field)?;
        value
            .as_bool()
            .ok_or_else(|| self.wrong(field, "a boolean", value))
    }

    pub fn decimal(&self, field: &str) -> MeteResult<Decimal> {
        let value = self.required(field)?;
        as_decimal(value).ok_or_else(|| self.wrong(field, "a decimal", value))
    }

    pub fn opt_decimal(&self, field: &str) -> MeteResult<Option<Decimal>> {
        self.get(field)
            .map(|value| as_decimal(value).ok_or_else(|| self.wrong(field, "a decimal", value)))
            .transpose()
    }

    /// A currency amount in the representation `version` uses on the wire
    pub fn money(&self, field: &str, version: ApiVersion) -> MeteResult<Decimal> {
        if version.uses_minor_units() {
            self.int(field).map(from_minor_units)
        } else {
            self.decimal(field)
        }
    }

    /// A list field, each element decoded with `decode`
    pub fn list<T>(
        &self,
        field: &str,
        decode: impl Fn(&'a Value) -> MeteResult<T>,
    ) -> MeteResult<Vec<T>> {
        let value = self.required(field)?;
        let items = value
            .as_array()
            .ok_or_else(|| self.wrong(field, "a list", value))?;
        items.iter().map(decode).collect()
    }
}

/// Decode a top-level JSON list
pub fn list<'a, T>(
    entity: &'static str,
    value: &'a Value,
    decode: impl Fn(&'a Value) -> MeteResult<T>,
) -> MeteResult<Vec<T>> {
    let items = value.as_array().ok_or_else(|| {
        MeteError::malformed(format!("expected a list of {}s, got {}", entity, kind(value)))
    })?;
    items.iter().map(decode).collect()
}

/// Encode a currency amount the way `version` expects it
pub fn money_to_wire(amount: Decimal, version: ApiVersion) -> MeteResult<Value> {
    if version.uses_minor_units() {
        Ok(Value::from(to_minor_units(amount)?))
    } else {
        decimal_to_wire(round_to_minor(amount))
    }
}

pub fn decimal_to_wire(amount: Decimal) -> MeteResult<Value> {
    amount
        .to_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| MeteError::invalid_input(format!("{} cannot be sent", amount)))
}

fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => Decimal::from_str(&number.to_string())
            .or_else(|_| Decimal::from_scientific(&number.to_string()))
            .ok(),
        Value::String(text) => Decimal::from_str(text.trim()).ok(),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimals_accept_numbers_and_strings() {
        let value = json!({"a": 1.5, "b": "2.30", "c": 3, "d": null});
        let fields = Fields::new("thing", &value).expect("object");

        assert_eq!(fields.decimal("a").expect("a"), Decimal::new(15, 1));
        assert_eq!(fields.decimal("b").expect("b"), Decimal::new(230, 2));
        assert_eq!(fields.decimal("c").expect("c"), Decimal::new(3, 0));
        assert_eq!(fields.opt_decimal("d").expect("d"), None);
        assert_eq!(fields.opt_decimal("missing").expect("missing"), None);
    }

    #[test]
    fn test_missing_and_mistyped_fields_are_malformed() {
        let value = json!({"id": "seven", "name": null, "active": "yes"});
        let fields = Fields::new("user", &value).expect("object");

        let err = fields.int("id").expect_err("not an int");
        assert_eq!(
            err.to_string(),
            "Malformed response: user.id should be an integer, got a string"
        );
        let err = fields.string("name").expect_err("null");
        assert_eq!(err.to_string(), "Malformed response: user is missing 'name'");
        assert!(fields.boolean("active").is_err());
    }

    #[test]
    fn test_non_object_is_malformed() {
        let value = json!([1, 2]);
        assert!(matches!(
            Fields::new("drink", &value),
            Err(MeteError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_money_follows_version() {
        let value = json!({"legacy": "1.50", "cents": 150});
        let fields = Fields::new("user", &value).expect("object");

        assert_eq!(
            fields.money("legacy", ApiVersion::V1).expect("decimal"),
            Decimal::new(150, 2)
        );
        assert_eq!(
            fields.money("cents", ApiVersion::V3).expect("cents"),
            Decimal::new(150, 2)
        );
        assert!(fields.money("legacy", ApiVersion::V2).is_err());

        assert_eq!(
            money_to_wire(Decimal::new(15, 1), ApiVersion::V2).expect("encode"),
            json!(150)
        );
        assert_eq!(
            money_to_wire(Decimal::new(15, 1), ApiVersion::Legacy).expect("encode"),
            json!(1.5)
        );
    }
}
