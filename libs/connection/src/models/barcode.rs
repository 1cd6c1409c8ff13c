//! Barcode model, only known to legacy and v1 servers

use serde_json::{Value, json};

use common::{ApiVersion, Diagnostics, MeteError, MeteResult};

use super::wire::Fields;

/// A barcode pointing at a drink
///
/// The id is the scanned code itself and stays a string; codes with leading
/// zeros must not be turned into numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barcode {
    pub id: String,
    pub drink: Option<i64>,
}

impl Barcode {
    pub fn from_wire(version: ApiVersion, value: &Value) -> MeteResult<Self> {
        if !version.supports_barcodes() {
            return Err(MeteError::unsupported("barcodes", version));
        }
        let fields = Fields::new("barcode", value)?;
        let id = match fields.get("id") {
            Some(_) => fields.text("id")?,
            None => String::new(),
        };
        Ok(Self {
            id,
            drink: fields.opt_int("drink")?,
        })
    }

    pub fn to_wire(&self, version: ApiVersion, _diagnostics: &Diagnostics) -> MeteResult<Value> {
        if !version.supports_barcodes() {
            return Err(MeteError::unsupported("barcodes", version));
        }
        if self.id.trim().is_empty() {
            return Err(MeteError::invalid_input("A barcode needs a code"));
        }
        Ok(json!({
            "id": self.id,
            "drink": self.drink,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_stays_text() {
        let value = json!({"id": "0042", "drink": 3});
        let barcode = Barcode::from_wire(ApiVersion::V1, &value).expect("valid");
        assert_eq!(barcode.id, "0042");

        let value = json!({"id": 4029764001807_i64, "drink": 3});
        let barcode = Barcode::from_wire(ApiVersion::Legacy, &value).expect("valid");
        assert_eq!(barcode.id, "4029764001807");
    }

    #[test]
    fn test_defaults_without_id() {
        let value = json!({"id": null, "drink": null});
        let barcode = Barcode::from_wire(ApiVersion::V1, &value).expect("valid");
        assert_eq!(barcode.id, "");
        assert_eq!(barcode.drink, None);
    }

    #[test]
    fn test_unsupported_on_newer_versions() {
        let barcode = Barcode {
            id: "0042".to_string(),
            drink: Some(1),
        };
        for version in [ApiVersion::V2, ApiVersion::V3] {
            assert!(matches!(
                barcode.to_wire(version, &Diagnostics::new()),
                Err(MeteError::UnsupportedOperation { .. })
            ));
        }
    }
}
