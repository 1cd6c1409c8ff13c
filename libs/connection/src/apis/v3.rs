//! v3 adapter: extension-less endpoints, native transfers and server
//! provided product defaults

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use url::Url;

use common::money::to_minor_units;
use common::{ApiVersion, Diagnostics, MeteError, MeteResult};

use super::{MeteApi, identified, record_probe_failure, target_id};
use crate::models::wire::list;
use crate::models::{AuditFilter, AuditInfo, Barcode, Drink, ServerInfo, User};
use crate::session::Session;

const VERSION: ApiVersion = ApiVersion::V3;

pub struct ApiV3 {
    session: Session,
    diagnostics: Diagnostics,
}

impl ApiV3 {
    pub fn new(session: Session, diagnostics: Diagnostics) -> Self {
        Self {
            session,
            diagnostics,
        }
    }

    fn read_user(&self, value: &Value) -> MeteResult<User> {
        let user = User::from_wire(VERSION, value)?;
        identified("user", user.id, user)
    }

    fn read_drink(&self, value: &Value) -> MeteResult<Drink> {
        let drink = Drink::from_wire(VERSION, value)?;
        identified("product", drink.id, drink)
    }

    async fn post_amount(&self, path: &str, amount: Decimal) -> MeteResult<()> {
        let body = json!({ "amount": to_minor_units(amount)? });
        self.session.post(path, body).await?;
        Ok(())
    }
}

#[async_trait]
impl MeteApi for ApiV3 {
    fn api_version(&self) -> ApiVersion {
        VERSION
    }

    fn base_url(&self) -> &Url {
        self.session.base_url()
    }

    async fn list_users(&self) -> MeteResult<Vec<User>> {
        let value = self.session.get("users").await?;
        list("user", &value, |user| self.read_user(user))
    }

    async fn get_user(&self, id: i64) -> MeteResult<User> {
        let value = self.session.get(&format!("users/{}", id)).await?;
        self.read_user(&value)
    }

    async fn create_user(&self, user: &User) -> MeteResult<User> {
        let body = user.to_wire(VERSION, &self.diagnostics)?;
        let value = self.session.post("users", body).await?;
        self.read_user(&value)
    }

    async fn update_user(&self, user: &User) -> MeteResult<()> {
        let id = target_id("user", user.id)?;
        let body = user.to_wire(VERSION, &self.diagnostics)?;
        self.session.patch(&format!("users/{}", id), body).await
    }

    async fn delete_user(&self, id: i64) -> MeteResult<()> {
        self.session.delete(&format!("users/{}", id)).await
    }

    async fn user_defaults(&self) -> MeteResult<User> {
        self.diagnostics.warn(
            "This server does not let us know of its defaults for creating new users. Using our own.",
        );
        Ok(User::template())
    }

    async fn purchase(&self, user: i64, drink: i64) -> MeteResult<()> {
        self.session
            .post(&format!("users/{}/buy", user), json!({ "product": drink }))
            .await?;
        Ok(())
    }

    async fn pay(&self, user: i64, amount: Decimal) -> MeteResult<()> {
        self.post_amount(&format!("users/{}/spend", user), amount)
            .await
    }

    async fn deposit(&self, user: i64, amount: Decimal) -> MeteResult<()> {
        self.post_amount(&format!("users/{}/deposit", user), amount)
            .await
    }

    async fn transfer(&self, sender: i64, receiver: i64, amount: Decimal) -> MeteResult<()> {
        let body = json!({
            "transaction": {
                "amount": to_minor_units(amount)?,
                "receiver": receiver,
            }
        });
        self.session
            .post(&format!("users/{}/transfer", sender), body)
            .await?;
        Ok(())
    }

    async fn list_drinks(&self) -> MeteResult<Vec<Drink>> {
        let value = self.session.get("products").await?;
        list("product", &value, |drink| self.read_drink(drink))
    }

    async fn create_drink(&self, drink: &Drink) -> MeteResult<Drink> {
        let body = drink.to_wire(VERSION, &self.diagnostics)?;
        let value = self.session.post("products", body).await?;
        self.read_drink(&value)
    }

    async fn update_drink(&self, drink: &Drink) -> MeteResult<()> {
        let id = target_id("product", drink.id)?;
        let body = drink.to_wire(VERSION, &self.diagnostics)?;
        self.session.patch(&format!("products/{}", id), body).await
    }

    async fn delete_drink(&self, id: i64) -> MeteResult<()> {
        self.session.delete(&format!("products/{}", id)).await
    }

    async fn drink_defaults(&self) -> MeteResult<Drink> {
        let defaults = self.server_info().await?.defaults;
        // package_size is a label, not a bottle size
        Ok(Drink {
            id: None,
            name: String::new(),
            bottle_size: None,
            caffeine: defaults.caffeine,
            price: defaults.price,
            active: defaults.active,
        })
    }

    async fn list_barcodes(&self) -> MeteResult<Vec<Barcode>> {
        Err(MeteError::unsupported("list_barcodes", VERSION))
    }

    async fn create_barcode(&self, _barcode: &Barcode) -> MeteResult<Barcode> {
        Err(MeteError::unsupported("create_barcode", VERSION))
    }

    async fn delete_barcode(&self, _id: &str) -> MeteResult<()> {
        Err(MeteError::unsupported("delete_barcode", VERSION))
    }

    async fn barcode_defaults(&self) -> MeteResult<Barcode> {
        Err(MeteError::unsupported("barcode_defaults", VERSION))
    }

    async fn server_info(&self) -> MeteResult<ServerInfo> {
        let value = self.session.get("info").await?;
        ServerInfo::from_wire(VERSION, &value, &self.diagnostics)
    }

    async fn audits(&self, filter: &AuditFilter) -> MeteResult<AuditInfo> {
        let value = self
            .session
            .get_with_query("audits", filter.iso_query())
            .await?;
        AuditInfo::from_wire(VERSION, &value)
    }

    async fn try_connect(&self) -> bool {
        match self.server_info().await {
            Ok(_) => true,
            Err(err) => {
                record_probe_failure(&self.diagnostics, VERSION, &err);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::normalize_base_url;
    use crate::test_support::MockTransport;
    use crate::transport::{HttpResponse, Method};
    use chrono::NaiveDate;

    const BASE: &str = "https://mete.local/api/v3/";

    fn api(mock: &MockTransport, diagnostics: &Diagnostics) -> ApiV3 {
        let session = Session::new(mock.shared(), normalize_base_url(BASE).expect("valid"));
        ApiV3::new(session, diagnostics.clone())
    }

    fn url(path: &str) -> String {
        format!("{}{}", BASE, path)
    }

    fn info() -> Value {
        json!({
            "version": "3.0.0",
            "global_credit_limit": false,
            "currency": "€",
            "currency_before": false,
            "decimal_seperator": ",",
            "energy": "kcal",
            "defaults": {"price": 180, "package_size": "0.5", "caffeine": 25, "active": true}
        })
    }

    #[tokio::test]
    async fn test_native_transfer_single_request() {
        let mock = MockTransport::new();
        mock.respond(Method::Post, &url("users/1/transfer"), HttpResponse::new(200, ""));
        let diagnostics = Diagnostics::new();

        api(&mock, &diagnostics)
            .transfer(1, 2, Decimal::new(275, 2))
            .await
            .expect("transferred");

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].body,
            Some(json!({"transaction": {"amount": 275, "receiver": 2}}))
        );
        assert!(diagnostics.warnings().is_empty());
    }

    #[tokio::test]
    async fn test_pay_uses_spend() {
        let mock = MockTransport::new();
        mock.respond(Method::Post, &url("users/1/spend"), HttpResponse::new(200, ""));

        api(&mock, &Diagnostics::new())
            .pay(1, Decimal::new(1005, 3))
            .await
            .expect("paid");

        // 1.005 rounds half away from zero
        assert_eq!(mock.last_request().and_then(|r| r.body), Some(json!({"amount": 101})));
    }

    #[tokio::test]
    async fn test_drink_defaults_from_server_info() {
        let mock = MockTransport::new();
        mock.respond_json(Method::Get, &url("info"), 200, info());

        let drink = api(&mock, &Diagnostics::new())
            .drink_defaults()
            .await
            .expect("defaults");

        assert_eq!(drink.id, None);
        assert_eq!(drink.price, Decimal::new(180, 2));
        assert_eq!(drink.caffeine, Some(25));
        assert_eq!(drink.bottle_size, None);
    }

    #[tokio::test]
    async fn test_audits_use_iso_dates() {
        let mock = MockTransport::new();
        mock.respond_json(
            Method::Get,
            &url("audits"),
            200,
            json!({"sum": 0, "payments_sum": 0, "deposits_sum": 0, "audits": []}),
        );

        let filter = AuditFilter {
            user: None,
            from_date: NaiveDate::from_ymd_opt(2024, 1, 2),
            to_date: NaiveDate::from_ymd_opt(2024, 2, 3),
        };
        api(&mock, &Diagnostics::new())
            .audits(&filter)
            .await
            .expect("audits");

        assert_eq!(
            mock.last_request().map(|r| r.query),
            Some(vec![
                ("start".to_string(), "2024-01-02".to_string()),
                ("end".to_string(), "2024-02-03".to_string()),
            ])
        );
    }

    #[tokio::test]
    async fn test_update_without_id_is_rejected() {
        let mock = MockTransport::new();
        let err = api(&mock, &Diagnostics::new())
            .update_drink(&Drink::template())
            .await
            .expect_err("no id");

        assert!(matches!(err, MeteError::InvalidInput { .. }));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_barcodes_unsupported() {
        let mock = MockTransport::new();
        let barcode = Barcode {
            id: "1234".to_string(),
            drink: Some(1),
        };
        assert!(matches!(
            api(&mock, &Diagnostics::new()).create_barcode(&barcode).await,
            Err(MeteError::UnsupportedOperation { version: ApiVersion::V3, .. })
        ));
    }
}
