//! User model and its wire mappings

use rust_decimal::Decimal;
use serde_json::{Value, json};

use common::{ApiVersion, Candidate, Diagnostics, MeteError, MeteResult};

use super::wire::{Fields, money_to_wire};

/// User account
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Server-assigned id, `None` until the user is created
    pub id: Option<i64>,
    pub name: String,
    pub email: Option<String>,
    /// Balance in major units, may be negative
    pub balance: Decimal,
    pub active: bool,
    /// Whether the server keeps an audit log of this user's transactions
    pub audit: bool,
    pub redirect: bool,
}

impl User {
    /// Built-in template for servers that do not publish user defaults
    pub fn template() -> Self {
        Self {
            id: None,
            name: String::new(),
            email: None,
            balance: Decimal::ZERO,
            active: true,
            audit: false,
            redirect: true,
        }
    }

    /// Decode a user from any protocol version
    ///
    /// All versions share the field names; v2 and v3 send the balance in
    /// minor units.
    pub fn from_wire(version: ApiVersion, value: &Value) -> MeteResult<Self> {
        let fields = Fields::new("user", value)?;
        Ok(Self {
            id: fields.opt_int("id")?,
            name: fields.string("name")?,
            email: fields.opt_string("email")?,
            balance: fields.money("balance", version)?,
            active: fields.boolean("active")?,
            audit: fields.boolean("audit")?,
            redirect: fields.boolean("redirect")?,
        })
    }

    /// Encode a user for `version`
    pub fn to_wire(&self, version: ApiVersion, _diagnostics: &Diagnostics) -> MeteResult<Value> {
        if self.name.trim().is_empty() {
            return Err(MeteError::invalid_input("A user needs a name"));
        }
        Ok(json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "balance": money_to_wire(self.balance, version)?,
            "active": self.active,
            "audit": self.audit,
            "redirect": self.redirect,
        }))
    }
}

impl Candidate for User {
    fn candidate_id(&self) -> Option<i64> {
        self.id
    }

    fn candidate_name(&self) -> &str {
        &self.name
    }
}
