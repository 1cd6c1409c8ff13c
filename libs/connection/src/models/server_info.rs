//! Server information and product defaults

use rust_decimal::Decimal;
use serde_json::Value;

use common::money::{MoneyFormat, from_minor_units};
use common::{ApiVersion, Diagnostics, MeteError, MeteResult};

use super::wire::Fields;

/// What the server reports about itself
#[derive(Debug, Clone, PartialEq)]
pub struct ServerInfo {
    pub version: Option<String>,
    /// Lowest balance a user may reach, `None` when there is no limit
    pub global_credit_limit: Option<Decimal>,
    pub currency: String,
    pub currency_before: bool,
    pub decimal_separator: Option<String>,
    pub energy: String,
    pub defaults: ProductDefaults,
}

/// Values used to pre-fill new products
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDefaults {
    pub price: Decimal,
    pub package_size: Option<String>,
    pub caffeine: Option<i64>,
    pub active: bool,
}

impl Default for ProductDefaults {
    fn default() -> Self {
        Self {
            price: Decimal::new(150, 2),
            package_size: None,
            caffeine: None,
            active: true,
        }
    }
}

impl ServerInfo {
    pub fn from_wire(
        version: ApiVersion,
        value: &Value,
        diagnostics: &Diagnostics,
    ) -> MeteResult<Self> {
        match version {
            ApiVersion::Legacy | ApiVersion::V1 => {
                Err(MeteError::unsupported("server_info", version))
            }
            ApiVersion::V2 => Self::from_v2(value, diagnostics),
            ApiVersion::V3 => Self::from_v3(value),
        }
    }

    /// v2 only publishes its version; formatting falls back to ours
    fn from_v2(value: &Value, diagnostics: &Diagnostics) -> MeteResult<Self> {
        let fields = Fields::new("server info", value)?;
        diagnostics.warn("This server does not let us know of its defaults. Using our own.");
        Ok(Self {
            version: fields.opt_string("version")?,
            global_credit_limit: None,
            currency: "€".to_string(),
            currency_before: false,
            decimal_separator: Some(",".to_string()),
            energy: "kcal".to_string(),
            defaults: ProductDefaults::default(),
        })
    }

    fn from_v3(value: &Value) -> MeteResult<Self> {
        let fields = Fields::new("server info", value)?;
        // `false` means no limit
        let global_credit_limit = match fields.get("global_credit_limit") {
            Some(Value::Bool(false)) | None => None,
            Some(_) => Some(from_minor_units(fields.int("global_credit_limit")?)),
        };
        let defaults = fields
            .get("defaults")
            .ok_or_else(|| MeteError::malformed("server info is missing 'defaults'"))?;

        Ok(Self {
            version: Some(fields.text("version")?),
            global_credit_limit,
            currency: fields.string("currency")?,
            currency_before: fields.boolean("currency_before")?,
            // sic, the server spells it this way
            decimal_separator: fields.opt_string("decimal_seperator")?,
            energy: fields.string("energy")?,
            defaults: ProductDefaults::from_v3(defaults)?,
        })
    }

    /// How amounts should be displayed for this server
    pub fn money_format(&self) -> MoneyFormat {
        let fallback = MoneyFormat::default();
        MoneyFormat {
            currency: self.currency.clone(),
            currency_before: self.currency_before,
            decimal_separator: self
                .decimal_separator
                .clone()
                .unwrap_or(fallback.decimal_separator),
        }
    }
}

impl ProductDefaults {
    fn from_v3(value: &Value) -> MeteResult<Self> {
        let fields = Fields::new("product defaults", value)?;
        Ok(Self {
            price: fields.money("price", ApiVersion::V3)?,
            package_size: match fields.get("package_size") {
                Some(_) => Some(fields.text("package_size")?),
                None => None,
            },
            caffeine: fields.opt_int("caffeine")?,
            active: fields.boolean("active")?,
        })
    }
}
