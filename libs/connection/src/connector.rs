//! Connection facade
//!
//! Picks the adapter for a server. A persisted (url, version) pair is trusted
//! as is and a pair without a version is refused. Only a bare URL handed to
//! [`Connector::establish`] goes through detection and the upgrade handshake:
//!
//! ```text
//! Unknown -> Detected(v) -> Upgrading { from, to } -> ... -> Confirmed(v)
//! ```
//!
//! Each upgrade edge is probed with the target adapter's `try_connect`. A
//! failed probe keeps the previous (url, version).

use std::fmt;
use std::sync::Arc;
use url::Url;

use common::{ApiVersion, Diagnostics, MeteError, MeteResult};

use crate::apis::{MeteApi, adapter_for};
use crate::session::{Session, normalize_base_url};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unknown,
    Detected(ApiVersion),
    Upgrading { from: ApiVersion, to: ApiVersion },
    Confirmed(ApiVersion),
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Unknown => write!(f, "unknown"),
            ConnectionState::Detected(version) => write!(f, "detected {}", version),
            ConnectionState::Upgrading { from, to } => write!(f, "upgrading {} -> {}", from, to),
            ConnectionState::Confirmed(version) => write!(f, "confirmed {}", version),
        }
    }
}

/// One possible upgrade: where it starts, where it leads and how the
/// candidate base URL is derived from the current one
#[derive(Clone, Copy)]
pub struct UpgradeEdge {
    pub from: ApiVersion,
    pub to: ApiVersion,
    pub candidate: fn(&Url) -> MeteResult<Url>,
}

fn legacy_to_v1(base_url: &Url) -> MeteResult<Url> {
    base_url
        .join("api/v1/")
        .map_err(|e| MeteError::config(format!("Cannot derive the v1 URL from '{}': {}", base_url, e)))
}

/// Upgrade edges in probing order
pub fn default_edges() -> Vec<UpgradeEdge> {
    vec![UpgradeEdge {
        from: ApiVersion::Legacy,
        to: ApiVersion::V1,
        candidate: legacy_to_v1,
    }]
}

/// Connection values as persisted by the settings store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub base_url: Option<String>,
    pub api_version: Option<ApiVersion>,
}

/// Receives the (url, version) pair after an upgrade
pub trait SettingsStore {
    fn save_connection(&mut self, base_url: &str, version: ApiVersion) -> MeteResult<()>;
}

/// An established connection; the adapter never changes afterwards
pub struct Connection {
    api: Box<dyn MeteApi>,
    trail: Vec<ConnectionState>,
}

impl Connection {
    pub fn api(&self) -> &dyn MeteApi {
        self.api.as_ref()
    }

    pub fn api_version(&self) -> ApiVersion {
        self.api.api_version()
    }

    pub fn base_url(&self) -> &Url {
        self.api.base_url()
    }

    /// Current state, always `Confirmed`
    pub fn state(&self) -> ConnectionState {
        self.trail
            .last()
            .copied()
            .unwrap_or(ConnectionState::Unknown)
    }

    /// Every state the handshake went through
    pub fn trail(&self) -> &[ConnectionState] {
        &self.trail
    }
}

pub struct Connector {
    transport: Arc<dyn Transport>,
    diagnostics: Diagnostics,
    edges: Vec<UpgradeEdge>,
}

impl Connector {
    pub fn new(transport: Arc<dyn Transport>, diagnostics: Diagnostics) -> Self {
        Self {
            transport,
            diagnostics,
            edges: default_edges(),
        }
    }

    pub fn with_edges(mut self, edges: Vec<UpgradeEdge>) -> Self {
        self.edges = edges;
        self
    }

    fn session(&self, base_url: Url) -> Session {
        Session::new(Arc::clone(&self.transport), base_url)
    }

    /// Use a persisted (url, version) pair without probing
    ///
    /// Never detects or upgrades, so ordinary commands cost no extra request.
    pub fn from_settings(&self, settings: &ConnectionSettings) -> MeteResult<Connection> {
        let base_url = settings
            .base_url
            .as_deref()
            .ok_or_else(|| MeteError::config("No server configured. Run 'metecli setup <url>'."))?;
        let version = settings
            .api_version
            .ok_or_else(|| {
                MeteError::config(
                    "The configured connection doesn't have api_version set. Run 'metecli setup <url>'.",
                )
            })?;
        let url = normalize_base_url(base_url)?;

        tracing::debug!("Using configured API version '{}' at {}", version, url);
        Ok(Connection {
            api: adapter_for(version, self.session(url), self.diagnostics.clone()),
            trail: vec![ConnectionState::Confirmed(version)],
        })
    }

    /// Detect the version of a bare URL and upgrade it as far as possible
    ///
    /// When the upgrade changed the (url, version) pair and `store` is given,
    /// the new pair is saved through it.
    pub async fn establish(
        &self,
        base_url: &str,
        store: Option<&mut dyn SettingsStore>,
    ) -> MeteResult<Connection> {
        let mut trail = vec![ConnectionState::Unknown];
        let original = normalize_base_url(base_url)?;
        let detected = ApiVersion::detect(original.as_str());
        trail.push(ConnectionState::Detected(detected));

        let mut url = original.clone();
        let mut version = detected;
        let mut visited = vec![version];

        'search: loop {
            let candidates: Vec<UpgradeEdge> = self
                .edges
                .iter()
                .filter(|edge| edge.from == version && !visited.contains(&edge.to))
                .copied()
                .collect();
            for edge in candidates {
                trail.push(ConnectionState::Upgrading {
                    from: version,
                    to: edge.to,
                });
                self.diagnostics.info(format!(
                    "Trying to upgrade the API version from '{}' to '{}'...",
                    version, edge.to
                ));

                let candidate = match (edge.candidate)(&url) {
                    Ok(candidate) => candidate,
                    Err(err) => {
                        self.diagnostics.warn(err.to_string());
                        continue;
                    }
                };
                let probe = adapter_for(edge.to, self.session(candidate.clone()), self.diagnostics.clone());
                if probe.try_connect().await {
                    self.diagnostics
                        .info(format!("Upgraded to API version '{}' at {}", edge.to, candidate));
                    url = candidate;
                    version = edge.to;
                    visited.push(version);
                    continue 'search;
                }
                self.diagnostics.warn(format!(
                    "The server doesn't support API version '{}'. (Or the connection failed.)",
                    edge.to
                ));
            }
            break;
        }

        trail.push(ConnectionState::Confirmed(version));

        if version != detected || url != original {
            if let Some(store) = store {
                store.save_connection(url.as_str(), version)?;
            }
        }

        Ok(Connection {
            api: adapter_for(version, self.session(url), self.diagnostics.clone()),
            trail,
        })
    }
}
