//! Protocol adapters
//!
//! Every protocol version implements [`MeteApi`]. Callers only see the
//! version-independent models; the adapters own endpoint paths, field names
//! and currency encoding.

pub mod v1;
pub mod v2;
pub mod v3;

use async_trait::async_trait;
use rust_decimal::Decimal;
use url::Url;

use common::{ApiVersion, Diagnostics, MeteError, MeteResult};

use crate::models::{AuditFilter, AuditInfo, Barcode, Drink, ServerInfo, User};
use crate::session::Session;

pub use v1::ApiV1;
pub use v2::ApiV2;
pub use v3::ApiV3;

/// The logical mete API, independent of the protocol version
#[async_trait]
pub trait MeteApi: Send + Sync {
    fn api_version(&self) -> ApiVersion;

    fn base_url(&self) -> &Url;

    async fn list_users(&self) -> MeteResult<Vec<User>>;

    async fn get_user(&self, id: i64) -> MeteResult<User>;

    async fn create_user(&self, user: &User) -> MeteResult<User>;

    async fn update_user(&self, user: &User) -> MeteResult<()>;

    async fn delete_user(&self, id: i64) -> MeteResult<()>;

    /// Template for a new user
    async fn user_defaults(&self) -> MeteResult<User>;

    async fn purchase(&self, user: i64, drink: i64) -> MeteResult<()>;

    async fn pay(&self, user: i64, amount: Decimal) -> MeteResult<()>;

    async fn deposit(&self, user: i64, amount: Decimal) -> MeteResult<()>;

    /// Move `amount` from `sender` to `receiver`
    ///
    /// Versions without a transfer endpoint pay and then deposit. The two
    /// requests are not atomic; a failed deposit leaves the payment in place.
    async fn transfer(&self, sender: i64, receiver: i64, amount: Decimal) -> MeteResult<()>;

    async fn list_drinks(&self) -> MeteResult<Vec<Drink>>;

    /// Look a drink up in [`MeteApi::list_drinks`]
    async fn get_drink(&self, id: i64) -> MeteResult<Option<Drink>> {
        let drinks = self.list_drinks().await?;
        Ok(drinks.into_iter().find(|drink| drink.id == Some(id)))
    }

    async fn create_drink(&self, drink: &Drink) -> MeteResult<Drink>;

    async fn update_drink(&self, drink: &Drink) -> MeteResult<()>;

    async fn delete_drink(&self, id: i64) -> MeteResult<()>;

    /// Template for a new drink
    async fn drink_defaults(&self) -> MeteResult<Drink>;

    async fn list_barcodes(&self) -> MeteResult<Vec<Barcode>>;

    async fn create_barcode(&self, barcode: &Barcode) -> MeteResult<Barcode>;

    async fn delete_barcode(&self, id: &str) -> MeteResult<()>;

    /// Template for a new barcode
    async fn barcode_defaults(&self) -> MeteResult<Barcode>;

    async fn server_info(&self) -> MeteResult<ServerInfo>;

    async fn audits(&self, filter: &AuditFilter) -> MeteResult<AuditInfo>;

    /// Probe the server with one cheap read
    ///
    /// Never fails; the reason for a `false` is recorded as an error
    /// diagnostic.
    async fn try_connect(&self) -> bool;
}

/// Build the adapter speaking `version`
pub fn adapter_for(
    version: ApiVersion,
    session: Session,
    diagnostics: Diagnostics,
) -> Box<dyn MeteApi> {
    match version {
        ApiVersion::Legacy | ApiVersion::V1 => Box::new(ApiV1::new(version, session, diagnostics)),
        ApiVersion::V2 => Box::new(ApiV2::new(session, diagnostics)),
        ApiVersion::V3 => Box::new(ApiV3::new(session, diagnostics)),
    }
}

/// Read results always carry an id
pub(crate) fn identified<T>(entity: &str, id: Option<i64>, value: T) -> MeteResult<T> {
    match id {
        Some(_) => Ok(value),
        None => Err(MeteError::malformed(format!("the server sent a {} without an id", entity))),
    }
}

/// The id an update or delete is addressed to
pub(crate) fn target_id(entity: &str, id: Option<i64>) -> MeteResult<i64> {
    id.ok_or_else(|| MeteError::invalid_input(format!("Cannot update a {} without an id", entity)))
}

pub(crate) fn record_probe_failure(diagnostics: &Diagnostics, version: ApiVersion, err: &MeteError) {
    diagnostics.error(format!("Connecting with API version '{}' failed: {}", version, err));
}

pub(crate) const SYNTHESIZED_TRANSFER_WARNING: &str =
    "This server has no transfer endpoint; paying and depositing separately. Use it with caution.";
