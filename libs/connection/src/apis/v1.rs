//! legacy and v1 adapter
//!
//! Both versions share one protocol: Rails `.json` endpoints, decimal amounts
//! and GET requests for transactions. They only differ in the base URL
//! (`/` vs `/api/v1/`).

use async_trait::async_trait;
use rust_decimal::Decimal;
use url::Url;

use common::money::round_to_minor;
use common::{ApiVersion, Diagnostics, MeteError, MeteResult};

use super::{MeteApi, SYNTHESIZED_TRANSFER_WARNING, identified, record_probe_failure, target_id};
use crate::models::wire::list;
use crate::models::{AuditFilter, AuditInfo, Barcode, Drink, ServerInfo, User};
use crate::session::{Session, path_segment};

pub struct ApiV1 {
    version: ApiVersion,
    session: Session,
    diagnostics: Diagnostics,
}

impl ApiV1 {
    /// `version` must be legacy or v1; anything newer is treated as v1
    pub fn new(version: ApiVersion, session: Session, diagnostics: Diagnostics) -> Self {
        let version = match version {
            ApiVersion::Legacy => ApiVersion::Legacy,
            _ => ApiVersion::V1,
        };
        Self {
            version,
            session,
            diagnostics,
        }
    }

    fn read_user(&self, value: &serde_json::Value) -> MeteResult<User> {
        let user = User::from_wire(self.version, value)?;
        identified("user", user.id, user)
    }

    fn read_drink(&self, value: &serde_json::Value) -> MeteResult<Drink> {
        let drink = Drink::from_wire(self.version, value)?;
        identified("drink", drink.id, drink)
    }

    fn read_barcode(&self, value: &serde_json::Value) -> MeteResult<Barcode> {
        let barcode = Barcode::from_wire(self.version, value)?;
        if barcode.id.trim().is_empty() {
            return Err(MeteError::malformed("the server sent a barcode without a code"));
        }
        Ok(barcode)
    }
}

fn amount_query(amount: Decimal) -> Vec<(String, String)> {
    vec![("amount".to_string(), round_to_minor(amount).normalize().to_string())]
}

#[async_trait]
impl MeteApi for ApiV1 {
    fn api_version(&self) -> ApiVersion {
        self.version
    }

    fn base_url(&self) -> &Url {
        self.session.base_url()
    }

    async fn list_users(&self) -> MeteResult<Vec<User>> {
        let value = self.session.get("users.json").await?;
        list("user", &value, |user| self.read_user(user))
    }

    async fn get_user(&self, id: i64) -> MeteResult<User> {
        let value = self.session.get(&format!("users/{}.json", id)).await?;
        self.read_user(&value)
    }

    async fn create_user(&self, user: &User) -> MeteResult<User> {
        let body = user.to_wire(self.version, &self.diagnostics)?;
        let value = self.session.post("users.json", body).await?;
        self.read_user(&value)
    }

    async fn update_user(&self, user: &User) -> MeteResult<()> {
        let id = target_id("user", user.id)?;
        let body = user.to_wire(self.version, &self.diagnostics)?;
        self.session.patch(&format!("users/{}.json", id), body).await
    }

    async fn delete_user(&self, id: i64) -> MeteResult<()> {
        self.session.delete(&format!("users/{}.json", id)).await
    }

    async fn user_defaults(&self) -> MeteResult<User> {
        let value = self.session.get("users/new.json").await?;
        User::from_wire(self.version, &value)
    }

    async fn purchase(&self, user: i64, drink: i64) -> MeteResult<()> {
        self.session
            .trigger(
                &format!("users/{}/buy.json", user),
                vec![("drink".to_string(), drink.to_string())],
            )
            .await
    }

    async fn pay(&self, user: i64, amount: Decimal) -> MeteResult<()> {
        self.session
            .trigger(&format!("users/{}/payment.json", user), amount_query(amount))
            .await
    }

    async fn deposit(&self, user: i64, amount: Decimal) -> MeteResult<()> {
        self.session
            .trigger(&format!("users/{}/deposit.json", user), amount_query(amount))
            .await
    }

    async fn transfer(&self, sender: i64, receiver: i64, amount: Decimal) -> MeteResult<()> {
        self.diagnostics.warn(SYNTHESIZED_TRANSFER_WARNING);
        self.pay(sender, amount).await?;
        self.deposit(receiver, amount).await
    }

    async fn list_drinks(&self) -> MeteResult<Vec<Drink>> {
        let value = self.session.get("drinks.json").await?;
        list("drink", &value, |drink| self.read_drink(drink))
    }

    async fn create_drink(&self, drink: &Drink) -> MeteResult<Drink> {
        let body = drink.to_wire(self.version, &self.diagnostics)?;
        let value = self.session.post("drinks.json", body).await?;
        self.read_drink(&value)
    }

    async fn update_drink(&self, drink: &Drink) -> MeteResult<()> {
        let id = target_id("drink", drink.id)?;
        let body = drink.to_wire(self.version, &self.diagnostics)?;
        self.session.patch(&format!("drinks/{}.json", id), body).await
    }

    async fn delete_drink(&self, id: i64) -> MeteResult<()> {
        self.session.delete(&format!("drinks/{}.json", id)).await
    }

    async fn drink_defaults(&self) -> MeteResult<Drink> {
        let value = self.session.get("drinks/new.json").await?;
        Drink::from_wire(self.version, &value)
    }

    async fn list_barcodes(&self) -> MeteResult<Vec<Barcode>> {
        let value = self.session.get("barcodes.json").await?;
        list("barcode", &value, |barcode| {
            self.read_barcode(barcode)
        })
    }

    async fn create_barcode(&self, barcode: &Barcode) -> MeteResult<Barcode> {
        let body = barcode.to_wire(self.version, &self.diagnostics)?;
        let value = self.session.post("barcodes.json", body).await?;
        self.read_barcode(&value)
    }

    async fn delete_barcode(&self, id: &str) -> MeteResult<()> {
        if id.trim().is_empty() {
            return Err(MeteError::invalid_input("Cannot delete a barcode without a code"));
        }
        let code = path_segment(id)?;
        self.session.delete(&format!("barcodes/{}.json", code)).await
    }

    async fn barcode_defaults(&self) -> MeteResult<Barcode> {
        let value = self.session.get("barcodes/new.json").await?;
        Barcode::from_wire(self.version, &value)
    }

    async fn server_info(&self) -> MeteResult<ServerInfo> {
        Err(MeteError::unsupported("server_info", self.version))
    }

    async fn audits(&self, filter: &AuditFilter) -> MeteResult<AuditInfo> {
        let value = self
            .session
            .get_with_query("audits.json", filter.date_parts_query())
            .await?;
        AuditInfo::from_wire(self.version, &value)
    }

    async fn try_connect(&self) -> bool {
        match self.list_users().await {
            Ok(_) => true,
            Err(err) => {
                record_probe_failure(&self.diagnostics, self.version, &err);
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
    use common::Severity;
    use serde_json::json;

    const BASE: &str = "http://mete.local/api/v1/";

    fn api(mock: &MockTransport, diagnostics: &Diagnostics) -> ApiV1 {
        let session = Session::new(mock.shared(), normalize_base_url(BASE).expect("valid"));
        ApiV1::new(ApiVersion::V1, session, diagnostics.clone())
    }

    fn url(path: &str) -> String {
        format!("{}{}", BASE, path)
    }

    #[tokio::test]
    async fn test_list_users() {
        let mock = MockTransport::new();
        mock.respond_json(
            Method::Get,
            &url("users.json"),
            200,
            json!([{
                "id": 1, "name": "alice", "email": null, "balance": "12.5",
                "active": true, "audit": true, "redirect": false
            }]),
        );

        let users = api(&mock, &Diagnostics::new()).list_users().await.expect("listed");

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].balance, Decimal::new(125, 1));
    }

    #[tokio::test]
    async fn test_user_without_id_is_malformed() {
        let mock = MockTransport::new();
        mock.respond_json(
            Method::Get,
            &url("users/3.json"),
            200,
            json!({
                "name": "bob", "balance": 0, "active": true, "audit": false, "redirect": true
            }),
        );

        let err = api(&mock, &Diagnostics::new())
            .get_user(3)
            .await
            .expect_err("no id");
        assert!(matches!(err, MeteError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_transactions_are_gets_with_query() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, &url("users/1/buy.json"), HttpResponse::new(200, ""));
        mock.respond(Method::Get, &url("users/1/payment.json"), HttpResponse::new(200, ""));
        let api = api(&mock, &Diagnostics::new());

        api.purchase(1, 7).await.expect("bought");
        api.pay(1, Decimal::new(150, 2)).await.expect("paid");

        let requests = mock.requests();
        assert_eq!(requests[0].query, vec![("drink".to_string(), "7".to_string())]);
        assert_eq!(requests[1].query, vec![("amount".to_string(), "1.5".to_string())]);
    }

    #[tokio::test]
    async fn test_transfer_warns_and_pays_then_deposits() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, &url("users/1/payment.json"), HttpResponse::new(200, ""));
        mock.respond(Method::Get, &url("users/2/deposit.json"), HttpResponse::new(200, ""));
        let diagnostics = Diagnostics::new();

        api(&mock, &diagnostics)
            .transfer(1, 2, Decimal::new(3, 0))
            .await
            .expect("transferred");

        let paths: Vec<String> = mock.requests().iter().map(|r| r.url.path().to_string()).collect();
        assert_eq!(paths, vec!["/api/v1/users/1/payment.json", "/api/v1/users/2/deposit.json"]);
        assert_eq!(diagnostics.warnings(), vec![SYNTHESIZED_TRANSFER_WARNING.to_string()]);
    }

    #[tokio::test]
    async fn test_failed_deposit_keeps_payment() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, &url("users/1/payment.json"), HttpResponse::new(200, ""));
        let diagnostics = Diagnostics::new();

        let err = api(&mock, &diagnostics)
            .transfer(1, 2, Decimal::new(3, 0))
            .await
            .expect_err("deposit has no route");

        assert!(matches!(err, MeteError::Server { status: 404, .. }));
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_server_info_unsupported() {
        let mock = MockTransport::new();
        let err = api(&mock, &Diagnostics::new())
            .server_info()
            .await
            .expect_err("unsupported");
        assert!(matches!(
            err,
            MeteError::UnsupportedOperation { operation: "server_info", version: ApiVersion::V1 }
        ));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_audits_use_date_parts() {
        let mock = MockTransport::new();
        mock.respond_json(
            Method::Get,
            &url("audits.json"),
            200,
            json!({"sum": "0", "payments_sum": "0", "deposits_sum": "0", "audits": []}),
        );

        let filter = AuditFilter {
            user: Some(4),
            from_date: chrono::NaiveDate::from_ymd_opt(2023, 12, 24),
            to_date: None,
        };
        api(&mock, &Diagnostics::new())
            .audits(&filter)
            .await
            .expect("audits");

        let request = mock.last_request().expect("sent");
        assert!(request.query.contains(&("start_date[month]".to_string(), "12".to_string())));
        assert!(request.query.contains(&("user".to_string(), "4".to_string())));
    }

    #[tokio::test]
    async fn test_barcodes_and_defaults() {
        let mock = MockTransport::new();
        mock.respond_json(Method::Get, &url("barcodes.json"), 200, json!([{"id": "0042", "drink": 1}]));
        mock.respond_json(Method::Get, &url("barcodes/new.json"), 200, json!({"id": null, "drink": null}));
        let api = api(&mock, &Diagnostics::new());

        let barcodes = api.list_barcodes().await.expect("listed");
        assert_eq!(barcodes[0].id, "0042");
        let template = api.barcode_defaults().await.expect("defaults");
        assert_eq!(template.id, "");
    }

    #[tokio::test]
    async fn test_barcode_delete_encodes_code() {
        let mock = MockTransport::new();
        mock.respond(Method::Delete, &url("barcodes/12%2F34%3Fx.json"), HttpResponse::new(204, ""));
        let api = api(&mock, &Diagnostics::new());

        api.delete_barcode("12/34?x").await.expect("deleted");

        let request = mock.last_request().expect("sent");
        assert_eq!(request.url.as_str(), url("barcodes/12%2F34%3Fx.json"));
        assert!(request.query.is_empty());
    }

    #[tokio::test]
    async fn test_barcode_reads_require_a_code() {
        let mock = MockTransport::new();
        mock.respond_json(Method::Get, &url("barcodes.json"), 200, json!([{"drink": 1}]));
        mock.respond_json(Method::Post, &url("barcodes.json"), 201, json!({"id": "", "drink": 1}));
        let api = api(&mock, &Diagnostics::new());

        assert!(matches!(
            api.list_barcodes().await,
            Err(MeteError::MalformedResponse { .. })
        ));
        let barcode = Barcode {
            id: "0042".to_string(),
            drink: Some(1),
        };
        assert!(matches!(
            api.create_barcode(&barcode).await,
            Err(MeteError::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_try_connect_records_failure() {
        let mock = MockTransport::new();
        mock.unreachable(Method::Get, &url("users.json"));
        let diagnostics = Diagnostics::new();

        assert!(!api(&mock, &diagnostics).try_connect().await);
        assert_eq!(diagnostics.messages(Severity::Error).len(), 1);
    }

    #[tokio::test]
    async fn test_get_drink_is_client_side_lookup() {
        let mock = MockTransport::new();
        mock.respond_json(
            Method::Get,
            &url("drinks.json"),
            200,
            json!([{"id": 5, "name": "Mate", "bottle_size": 0.5, "caffeine": 20, "price": 1.5, "active": true}]),
        );
        let api = api(&mock, &Diagnostics::new());

        assert_eq!(api.get_drink(5).await.expect("found").map(|d| d.name), Some("Mate".to_string()));
        assert_eq!(api.get_drink(6).await.expect("listed"), None);
    }
}
