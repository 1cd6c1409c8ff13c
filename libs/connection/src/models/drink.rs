//! Drink model and its wire mappings
//!
//! legacy and v1 call the entity a drink and send prices as decimals; v2 and
//! v3 call it a product, send prices in minor units and know nothing about
//! bottle sizes.

use rust_decimal::Decimal;
use serde_json::{Map, Value, json};

use common::{ApiVersion, Candidate, Diagnostics, MeteError, MeteResult};

use super::wire::{Fields, decimal_to_wire, money_to_wire};

/// Name shown for references to drinks that no longer exist
pub const MISSING_DRINK: &str = "n/a";

/// Drink (or product)
#[derive(Debug, Clone, PartialEq)]
pub struct Drink {
    /// Server-assigned id, `None` until the drink is created
    pub id: Option<i64>,
    pub name: String,
    /// Bottle size in litres, `None` when unknown or unsupported
    pub bottle_size: Option<Decimal>,
    /// Caffeine in mg per 100 ml
    pub caffeine: Option<i64>,
    /// Price in major units
    pub price: Decimal,
    pub active: bool,
}

impl Drink {
    /// Built-in template for servers that do not publish drink defaults
    pub fn template() -> Self {
        Self {
            id: None,
            name: String::new(),
            bottle_size: None,
            caffeine: None,
            price: Decimal::new(150, 2),
            active: true,
        }
    }

    pub fn from_wire(version: ApiVersion, value: &Value) -> MeteResult<Self> {
        let entity = if version.supports_bottle_size() {
            "drink"
        } else {
            "product"
        };
        let fields = Fields::new(entity, value)?;
        let bottle_size = if version.supports_bottle_size() {
            fields.opt_decimal("bottle_size")?
        } else {
            None
        };

        Ok(Self {
            id: fields.opt_int("id")?,
            name: fields.string("name")?,
            bottle_size,
            caffeine: fields.opt_int("caffeine")?,
            price: fields.money("price", version)?,
            active: fields.boolean("active")?,
        })
    }

    /// Encode a drink for `version`
    ///
    /// A bottle size on a version that cannot store it is dropped with a
    /// warning.
    pub fn to_wire(&self, version: ApiVersion, diagnostics: &Diagnostics) -> MeteResult<Value> {
        if self.name.trim().is_empty() {
            return Err(MeteError::invalid_input("A drink needs a name"));
        }
        if self.price <= Decimal::ZERO {
            return Err(MeteError::invalid_input("A drink needs a positive price"));
        }

        let mut map = Map::new();
        map.insert("id".to_string(), json!(self.id));
        map.insert("name".to_string(), json!(self.name));
        if version.supports_bottle_size() {
            let bottle_size = match self.bottle_size {
                Some(size) => decimal_to_wire(size)?,
                None => Value::Null,
            };
            map.insert("bottle_size".to_string(), bottle_size);
        } else if let Some(size) = self.bottle_size {
            diagnostics.warn(format!(
                "API version '{}' does not support bottle sizes; dropping bottle_size {} of '{}'.",
                version, size, self.name
            ));
        }
        map.insert("caffeine".to_string(), json!(self.caffeine));
        map.insert("price".to_string(), money_to_wire(self.price, version)?);
        map.insert("active".to_string(), json!(self.active));

        Ok(Value::Object(map))
    }

    /// Name of the referenced drink, or [`MISSING_DRINK`] for a dangling or
    /// empty reference
    pub fn name_of(drinks: &[Drink], reference: Option<i64>) -> &str {
        reference
            .and_then(|id| drinks.iter().find(|drink| drink.id == Some(id)))
            .map_or(MISSING_DRINK, |drink| drink.name.as_str())
    }
}

impl Candidate for Drink {
    fn candidate_id(&self) -> Option<i64> {
        self.id
    }

    fn candidate_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn club_mate() -> Drink {
        Drink {
            id: Some(2),
            name: "Club Mate".to_string(),
            bottle_size: Some(Decimal::new(5, 1)),
            caffeine: Some(20),
            price: Decimal::new(150, 2),
            active: true,
        }
    }

    #[test]
    fn test_from_v1() {
        let value = json!({
            "id": 2,
            "name": "Club Mate",
            "bottle_size": "0.5",
            "caffeine": 20,
            "price": "1.5",
            "active": true,
            "logo_file_name": "mate.png"
        });

        assert_eq!(Drink::from_wire(ApiVersion::V1, &value).expect("valid"), club_mate());
    }

    #[test]
    fn test_from_v2_product() {
        let value = json!({
            "id": 2,
            "name": "Club Mate",
            "caffeine": null,
            "price": 150,
            "active": false
        });

        let drink = Drink::from_wire(ApiVersion::V2, &value).expect("valid");
        assert_eq!(drink.price, Decimal::new(150, 2));
        assert_eq!(drink.bottle_size, None);
        assert_eq!(drink.caffeine, None);
        assert!(!drink.active);
    }

    #[test]
    fn test_bottle_size_dropped_on_v3_with_warning() {
        let diagnostics = Diagnostics::new();

        let wire = club_mate()
            .to_wire(ApiVersion::V3, &diagnostics)
            .expect("dropping is not an error");

        assert!(wire.get("bottle_size").is_none());
        assert_eq!(wire["price"], json!(150));
        assert_eq!(diagnostics.warnings().len(), 1);
        assert!(diagnostics.warnings()[0].contains("bottle_size"));
    }

    #[test]
    fn test_bottle_size_kept_on_legacy() {
        let diagnostics = Diagnostics::new();
        let wire = club_mate()
            .to_wire(ApiVersion::Legacy, &diagnostics)
            .expect("encode");

        assert_eq!(wire["bottle_size"], json!(0.5));
        assert_eq!(wire["price"], json!(1.5));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_absent_bottle_size_is_silent_on_v2() {
        let diagnostics = Diagnostics::new();
        let mut drink = club_mate();
        drink.bottle_size = None;

        drink.to_wire(ApiVersion::V2, &diagnostics).expect("encode");
        assert!(diagnostics.warnings().is_empty());
    }

    #[test]
    fn test_name_of_dangling_reference() {
        let drinks = vec![club_mate()];
        assert_eq!(Drink::name_of(&drinks, Some(2)), "Club Mate");
        assert_eq!(Drink::name_of(&drinks, Some(99)), MISSING_DRINK);
        assert_eq!(Drink::name_of(&drinks, None), MISSING_DRINK);
    }
}
