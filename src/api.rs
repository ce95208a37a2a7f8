// API client module: the `GraphClient` seam the menu talks to, and the
// Gremlin-over-WebSocket implementation used against the real service.
//
// The dispatcher and reporter only ever see the trait, so tests can swap in
// a scripted client without a network.

pub mod connection;
pub mod graphson;
pub mod pool;
pub mod protocol;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use pool::{ConnectionPool, PoolSettings};

/// Service-specific diagnostics attached to every response.
pub type StatusAttributes = BTreeMap<String, Value>;

/// Records returned for one query, plus the status attributes of the final
/// response frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    records: Vec<Value>,
    status_attributes: StatusAttributes,
}

impl ResultSet {
    pub fn new(records: Vec<Value>, status_attributes: StatusAttributes) -> Self {
        ResultSet {
            records,
            status_attributes,
        }
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    pub fn status_attributes(&self) -> &StatusAttributes {
        &self.status_attributes
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// External graph service as seen by the menu.
#[async_trait]
pub trait GraphClient: Send + Sync {
    /// Submit a query string unmodified and wait for the complete result.
    async fn submit(&self, query: &str) -> Result<ResultSet>;

    /// Release any held connections.
    async fn close(&self);
}

/// SASL PLAIN credentials: the namespace path and the primary key.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Gremlin client backed by a pool of WebSocket connections.
pub struct GremlinClient {
    pool: ConnectionPool,
    credentials: Credentials,
}

impl GremlinClient {
    /// Connect to the endpoint described by `config`. One connection is
    /// opened eagerly; the rest are opened on demand.
    pub async fn connect(config: &Config, settings: PoolSettings) -> Result<Self> {
        let endpoint = config.endpoint();
        info!(%endpoint, pool_size = settings.pool_size, "Connecting to graph service");
        let pool = ConnectionPool::connect(endpoint, settings).await?;
        Ok(GremlinClient {
            pool,
            credentials: Credentials {
                username: config.namespace_path(),
                password: config.primary_key.clone(),
            },
        })
    }
}

#[async_trait]
impl GraphClient for GremlinClient {
    async fn submit(&self, query: &str) -> Result<ResultSet> {
        self.pool.execute(query, &self.credentials).await
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
