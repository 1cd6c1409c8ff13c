//! Connection layer for mete servers
//!
//! - [`transport`]: the HTTP seam, backed by `reqwest` in production
//! - [`session`]: request helpers bound to one base URL
//! - [`models`]: version-independent entities and their wire mappings
//! - [`apis`]: one [`MeteApi`] adapter per protocol version
//! - [`connector`]: version detection and the upgrade handshake

pub mod apis;
pub mod connector;
pub mod models;
pub mod session;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

// Re-export commonly used types
pub use apis::{MeteApi, adapter_for};
pub use connector::{
    Connection, ConnectionSettings, ConnectionState, Connector, SettingsStore, UpgradeEdge,
    default_edges,
};
pub use session::{Session, normalize_base_url};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
