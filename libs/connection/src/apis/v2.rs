//! v2 adapter: `.json` endpoints, products instead of drinks, amounts in
//! minor units and no barcodes

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use url::Url;

use common::money::to_minor_units;
use common::{ApiVersion, Diagnostics, MeteError, MeteResult};

use super::{MeteApi, SYNTHESIZED_TRANSFER_WARNING, identified, record_probe_failure, target_id};
use crate::models::wire::list;
use crate::models::{AuditFilter, AuditInfo, Barcode, Drink, ServerInfo, User};
use crate::session::Session;

const VERSION: ApiVersion = ApiVersion::V2;

pub struct ApiV2 {
    session: Session,
    diagnostics: Diagnostics,
}

impl ApiV2 {
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
impl MeteApi for ApiV2 {
    fn api_version(&self) -> ApiVersion {
        VERSION
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
        let body = user.to_wire(VERSION, &self.diagnostics)?;
        let value = self.session.post("users.json", body).await?;
        self.read_user(&value)
    }

    async fn update_user(&self, user: &User) -> MeteResult<()> {
        let id = target_id("user", user.id)?;
        let body = user.to_wire(VERSION, &self.diagnostics)?;
        self.session.patch(&format!("users/{}.json", id), body).await
    }

    async fn delete_user(&self, id: i64) -> MeteResult<()> {
        self.session.delete(&format!("users/{}.json", id)).await
    }

    async fn user_defaults(&self) -> MeteResult<User> {
        self.diagnostics.warn(
            "This server does not let us know of its defaults for creating new users. Using our own.",
        );
        Ok(User::template())
    }

    async fn purchase(&self, user: i64, drink: i64) -> MeteResult<()> {
        self.session
            .post(&format!("users/{}/product.json", user), json!({ "product": drink }))
            .await?;
        Ok(())
    }

    async fn pay(&self, user: i64, amount: Decimal) -> MeteResult<()> {
        self.post_amount(&format!("users/{}/pay.json", user), amount)
            .await
    }

    async fn deposit(&self, user: i64, amount: Decimal) -> MeteResult<()> {
        self.post_amount(&format!("users/{}/deposit.json", user), amount)
            .await
    }

    async fn transfer(&self, sender: i64, receiver: i64, amount: Decimal) -> MeteResult<()> {
        self.diagnostics.warn(SYNTHESIZED_TRANSFER_WARNING);
        self.pay(sender, amount).await?;
        self.deposit(receiver, amount).await
    }

    async fn list_drinks(&self) -> MeteResult<Vec<Drink>> {
        let value = self.session.get("products.json").await?;
        list("product", &value, |drink| self.read_drink(drink))
    }

    async fn create_drink(&self, drink: &Drink) -> MeteResult<Drink> {
        let body = drink.to_wire(VERSION, &self.diagnostics)?;
        let value = self.session.post("products.json", body).await?;
        self.read_drink(&value)
    }

    async fn update_drink(&self, drink: &Drink) -> MeteResult<()> {
        let id = target_id("product", drink.id)?;
        let body = drink.to_wire(VERSION, &self.diagnostics)?;
        self.session
            .patch(&format!("products/{}.json", id), body)
            .await
    }

    async fn delete_drink(&self, id: i64) -> MeteResult<()> {
        self.session.delete(&format!("products/{}.json", id)).await
    }

    async fn drink_defaults(&self) -> MeteResult<Drink> {
        self.diagnostics.warn(
            "This server does not let us know of its defaults for creating new drinks. Using our own.",
        );
        Ok(Drink::template())
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
        let value = self.session.get("info.json").await?;
        ServerInfo::from_wire(VERSION, &value, &self.diagnostics)
    }

    async fn audits(&self, filter: &AuditFilter) -> MeteResult<AuditInfo> {
        let value = self
            .session
            .get_with_query("audits.json", filter.date_parts_query())
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
