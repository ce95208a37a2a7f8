// Gremlin connection pool. bb8 owns checkout, validation and discard of
// broken connections; opening a connection retries with exponential backoff.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use bb8::{ManageConnection, Pool, PooledConnection, RunError};
use tracing::{debug, info, warn};

use super::connection::Connection;
use super::{Credentials, ResultSet};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Upper bound on open connections.
    pub pool_size: u32,
    /// Extra attempts after the first failed connect.
    pub reconnection_attempts: u32,
    /// Delay before the first retry; doubled on every further attempt.
    pub reconnection_base_delay: Duration,
    /// Idle connections older than this are pinged before reuse.
    pub keep_alive_interval: Duration,
    /// How long a keep-alive ping may wait for its pong.
    pub keep_alive_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        PoolSettings {
            pool_size: 30,
            reconnection_attempts: 3,
            reconnection_base_delay: Duration::from_millis(500),
            keep_alive_interval: Duration::from_secs(10),
            keep_alive_timeout: Duration::from_secs(5),
        }
    }
}

impl PoolSettings {
    /// Backoff schedule for reopening a connection: the base delay, doubled
    /// on every retry, no jitter. The attempt cap is applied by the caller.
    pub fn reconnect_policy(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.reconnection_base_delay)
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_interval(Duration::from_secs(60))
            .with_max_elapsed_time(None)
            .build()
    }
}

/// bb8 manager that opens, validates and retires Gremlin connections.
pub struct GremlinConnectionManager {
    endpoint: String,
    settings: PoolSettings,
}

impl GremlinConnectionManager {
    pub fn new(endpoint: String, settings: PoolSettings) -> Self {
        GremlinConnectionManager { endpoint, settings }
    }

    async fn open_with_retry(&self) -> Result<Connection> {
        let max_retries = self.settings.reconnection_attempts;
        let endpoint = self.endpoint.as_str();
        let mut attempt = 0u32;

        backoff::future::retry(self.settings.reconnect_policy(), || {
            let current = attempt;
            attempt += 1;
            async move {
                Connection::open(endpoint).await.map_err(|e| {
                    if current < max_retries {
                        warn!(error = %e, attempt = current + 1, "Connect failed, retrying");
                        backoff::Error::transient(e)
                    } else {
                        backoff::Error::permanent(e)
                    }
                })
            }
        })
        .await
    }
}

#[async_trait]
impl ManageConnection for GremlinConnectionManager {
    type Connection = Connection;
    type Error = Error;

    async fn connect(&self) -> Result<Connection> {
        self.open_with_retry().await
    }

    async fn is_valid(&self, conn: &mut Connection) -> Result<()> {
        if !conn.is_stale(self.settings.keep_alive_interval) {
            return Ok(());
        }
        debug!("Pinging idle connection before reuse");
        conn.ping(self.settings.keep_alive_timeout).await
    }

    fn has_broken(&self, conn: &mut Connection) -> bool {
        conn.is_broken()
    }
}

pub struct ConnectionPool {
    pool: Pool<GremlinConnectionManager>,
    closed: AtomicBool,
}

impl ConnectionPool {
    /// Create the pool and open the first connection right away so a bad
    /// endpoint is reported at startup.
    pub async fn connect(endpoint: String, settings: PoolSettings) -> Result<Self> {
        let max_size = settings.pool_size.max(1);
        let pool = Pool::builder()
            .max_size(max_size)
            .test_on_check_out(true)
            .retry_connection(false)
            .build(GremlinConnectionManager::new(endpoint, settings))
            .await?;

        let pool = ConnectionPool {
            pool,
            closed: AtomicBool::new(false),
        };
        drop(pool.checkout().await?);
        Ok(pool)
    }

    pub async fn execute(&self, query: &str, credentials: &Credentials) -> Result<ResultSet> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::connection("Connection pool is closed"));
        }

        let mut conn = self.checkout().await?;
        let outcome = conn.request(query, credentials).await;
        if conn.is_broken() {
            warn!("Discarding failed connection");
        }
        outcome
    }

    /// Close every idle connection and refuse further requests.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);

        let idle = self.pool.state().idle_connections;
        let mut held = Vec::new();
        for _ in 0..idle {
            match self.pool.get().await {
                Ok(conn) => held.push(conn),
                Err(_) => break,
            }
        }

        let count = held.len();
        for mut conn in held {
            conn.shutdown().await;
        }
        info!(count, "Closed Gremlin connections");
    }

    async fn checkout(&self) -> Result<PooledConnection<'_, GremlinConnectionManager>> {
        self.pool.get().await.map_err(|e| match e {
            RunError::User(err) => err,
            RunError::TimedOut => Error::connection("Timed out waiting for a pooled connection"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoff::backoff::Backoff;

    #[test]
    fn reconnect_policy_doubles_from_the_base_delay() {
        let mut policy = PoolSettings::default().reconnect_policy();
        assert_eq!(policy.next_backoff(), Some(Duration::from_millis(500)));
        assert_eq!(policy.next_backoff(), Some(Duration::from_millis(1000)));
        assert_eq!(policy.next_backoff(), Some(Duration::from_millis(2000)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_after_retries() {
        let settings = PoolSettings {
            reconnection_attempts: 2,
            reconnection_base_delay: Duration::from_millis(1),
            ..PoolSettings::default()
        };
        // Port 1 on loopback refuses connections.
        let err = ConnectionPool::connect("ws://127.0.0.1:1/".to_string(), settings)
            .await
            .err()
            .expect("connect should fail");
        assert!(matches!(err, Error::Connection(_)));
    }
}
