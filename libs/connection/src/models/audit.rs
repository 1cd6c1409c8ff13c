//! Audit log models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

use common::{ApiVersion, MeteResult};

use super::wire::Fields;

/// One balance change
#[derive(Debug, Clone, PartialEq)]
pub struct Audit {
    pub id: i64,
    /// Display-only timestamp as sent by the server
    pub created_at: String,
    pub difference: Decimal,
    /// The drink bought, `None` for payments and deposits
    pub drink: Option<i64>,
}

/// Audit log with its sums
#[derive(Debug, Clone, PartialEq)]
pub struct AuditInfo {
    pub sum: Decimal,
    pub payments_sum: Decimal,
    pub deposits_sum: Decimal,
    /// Entries in the order the server returned them
    pub audits: Vec<Audit>,
}

/// Which audits to fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub user: Option<i64>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl AuditFilter {
    /// Query string in the Rails date-select style of legacy, v1 and v2
    pub fn date_parts_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(user) = self.user {
            query.push(("user".to_string(), user.to_string()));
        }
        for (prefix, date) in [("start_date", self.from_date), ("end_date", self.to_date)] {
            if let Some(date) = date {
                query.push((format!("{}[year]", prefix), date.format("%Y").to_string()));
                query.push((format!("{}[month]", prefix), date.format("%-m").to_string()));
                query.push((format!("{}[day]", prefix), date.format("%-d").to_string()));
            }
        }
        query
    }

    /// Query string with ISO dates as used by v3
    pub fn iso_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(user) = self.user {
            query.push(("user".to_string(), user.to_string()));
        }
        if let Some(date) = self.from_date {
            query.push(("start".to_string(), date.format("%Y-%m-%d").to_string()));
        }
        if let Some(date) = self.to_date {
            query.push(("end".to_string(), date.format("%Y-%m-%d").to_string()));
        }
        query
    }
}

impl Audit {
    pub fn from_wire(version: ApiVersion, value: &Value) -> MeteResult<Self> {
        match version {
            ApiVersion::Legacy | ApiVersion::V1 => Self::from_v1(value),
            ApiVersion::V2 => Self::from_v2(value),
            ApiVersion::V3 => Self::from_v3(value),
        }
    }

    fn from_v1(value: &Value) -> MeteResult<Self> {
        let fields = Fields::new("audit", value)?;
        Ok(Self {
            id: fields.int("id")?,
            created_at: fields.text("created_at")?,
            difference: fields.decimal("difference")?,
            drink: fields.opt_int("drink")?,
        })
    }

    fn from_v2(value: &Value) -> MeteResult<Self> {
        let fields = Fields::new("audit", value)?;
        Ok(Self {
            id: fields.int("id")?,
            created_at: fields.text("created_at")?,
            difference: fields.money("difference", ApiVersion::V2)?,
            drink: fields.opt_int("product")?,
        })
    }

    fn from_v3(value: &Value) -> MeteResult<Self> {
        Self::from_v2(value)
    }
}

impl AuditInfo {
    pub fn from_wire(version: ApiVersion, value: &Value) -> MeteResult<Self> {
        // v3 audits are shaped exactly like v2 audits
        let money_version = match version {
            ApiVersion::V3 => ApiVersion::V2,
            other => other,
        };
        let fields = Fields::new("audit list", value)?;
        Ok(Self {
            sum: fields.money("sum", money_version)?,
            payments_sum: fields.money("payments_sum", money_version)?,
            deposits_sum: fields.money("deposits_sum", money_version)?,
            audits: fields.list("audits", |audit| Audit::from_wire(version, audit))?,
        })
    }
}
