//! Redis primary store for OTP records
//!
//! Wraps a single multiplexed connection behind a connection supervisor.
//! Commands never wait for a reconnect: while no connection is cached they
//! answer immediately with the degraded result (`None`, `Failed`, `-1`) and
//! the OTP manager falls back to its in-process store. The supervisor
//! reconnects with bounded exponential backoff, and a periodic PING health check
//! restarts it while the store is degraded.

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client, ErrorKind, RedisError, RedisResult};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use sf_core::services::otp::{PrimaryStore, StorageBackendState, StoreClaim, StoreWrite};
use sf_shared::config::CacheConfig;

use crate::InfrastructureError;

/// Redis-backed primary store
///
/// Cheap to clone; clones share the connection, the supervisor and the
/// backend state.
#[derive(Clone)]
pub struct RedisPrimaryStore {
    inner: Arc<Supervisor>,
}

/// Connection owner shared with the background tasks
struct Supervisor {
    client: Client,
    connection: RwLock<Option<MultiplexedConnection>>,
    state: StorageBackendState,
    config: CacheConfig,
    /// Single-flight guard for reconnect runs
    reconnecting: AtomicBool,
}

impl RedisPrimaryStore {
    /// Create the store and run the first connection attempt
    ///
    /// Only a malformed URL is an error. An unreachable server leaves the
    /// store degraded; the health check keeps trying to reconnect.
    ///
    /// # Arguments
    /// * `config` - Cache configuration settings
    pub async fn connect(config: CacheConfig) -> Result<Self, InfrastructureError> {
        let store = Self::new(config)?;
        store.inner.reconnect().await;
        Ok(store)
    }

    /// Create the store without connecting; the status stays `Unknown`
    /// until [`RedisPrimaryStore::reconnect`] or the health check runs
    pub fn new(config: CacheConfig) -> Result<Self, InfrastructureError> {
        info!(
            url = %mask_url(&config.url),
            max_connect_attempts = config.max_connect_attempts,
            "Creating Redis primary store"
        );

        let client = Client::open(config.url.as_str()).map_err(|e| {
            error!("Failed to parse Redis URL: {}", e);
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;

        Ok(Self {
            inner: Arc::new(Supervisor {
                client,
                connection: RwLock::new(None),
                state: StorageBackendState::new(),
                config,
                reconnecting: AtomicBool::new(false),
            }),
        })
    }

    /// Run the connection supervisor now; returns whether a connection is cached
    pub async fn reconnect(&self) -> bool {
        self.inner.reconnect().await
    }

    /// Start the periodic health check for the lifetime of the process
    pub fn start_health_check(&self) -> JoinHandle<()> {
        let inner = self.inner.clone();
        let period = Duration::from_secs(inner.config.health_check_interval_seconds.max(1));

        tokio::spawn(async move {
            info!(
                interval_seconds = period.as_secs(),
                "Redis health check started"
            );

            let mut timer = tokio::time::interval(period);
            timer.tick().await;

            loop {
                timer.tick().await;
                inner.health_check().await;
            }
        })
    }

    /// Whether a connection is currently cached
    pub async fn is_connected(&self) -> bool {
        self.inner.connection.read().await.is_some()
    }

    /// Run one command against the cached connection
    ///
    /// `None` means the command could not run or failed; connection-class
    /// failures degrade the store and kick the supervisor.
    async fn run<T, F, Fut>(&self, op: &'static str, key: &str, command: F) -> Option<T>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let connection = self.inner.connection.read().await.clone();
        let Some(connection) = connection else {
            debug!(op, key, "No Redis connection, answering degraded");
            self.inner.state.mark_degraded("no redis connection");
            return None;
        };

        let limit = Duration::from_secs(self.inner.config.response_timeout.max(1));
        match timeout(limit, command(connection)).await {
            Ok(Ok(value)) => {
                self.inner.state.mark_available();
                Some(value)
            }
            Ok(Err(e)) if is_connection_error(&e) => {
                warn!(op, key, error = %e, "Redis command failed on the connection");
                self.connection_lost(&e.to_string()).await;
                None
            }
            Ok(Err(e)) => {
                error!(op, key, error = %e, "Redis command failed");
                None
            }
            Err(_) => {
                warn!(op, key, timeout_seconds = limit.as_secs(), "Redis command timed out");
                self.connection_lost("response timeout").await;
                None
            }
        }
    }

    async fn connection_lost(&self, reason: &str) {
        self.inner.connection.write().await.take();
        self.inner.state.mark_degraded(reason);

        if !self.inner.reconnecting.load(Ordering::Acquire) {
            let inner = self.inner.clone();
            tokio::spawn(async move {
                inner.reconnect().await;
            });
        }
    }
}

impl Supervisor {
    /// Connect with bounded exponential backoff; single-flight
    async fn reconnect(&self) -> bool {
        if self
            .reconnecting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Redis reconnect already in progress");
            return false;
        }

        let connected = self.connect_with_backoff().await;
        self.reconnecting.store(false, Ordering::Release);
        connected
    }

    async fn connect_with_backoff(&self) -> bool {
        let max_attempts = self.config.max_connect_attempts.max(1);

        for attempt in 1..=max_attempts {
            debug!(attempt, max_attempts, "Attempting to connect to Redis");

            match self.open_connection().await {
                Ok(connection) => {
                    *self.connection.write().await = Some(connection);
                    self.state.mark_available();
                    info!(
                        url = %mask_url(&self.config.url),
                        attempt,
                        "Connected to Redis"
                    );
                    return true;
                }
                Err(e) if attempt < max_attempts => {
                    let delay = self.config.backoff_delay_ms(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        retry_in_ms = delay,
                        error = %e,
                        "Failed to connect to Redis, retrying"
                    );
                    sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => {
                    self.state.mark_degraded(&e.to_string());
                    warn!(
                        attempts = max_attempts,
                        error = %e,
                        "Max Redis connection attempts reached, giving up until the next health check"
                    );
                }
            }
        }

        false
    }

    async fn open_connection(&self) -> Result<MultiplexedConnection, InfrastructureError> {
        let limit = Duration::from_secs(self.config.connection_timeout.max(1));
        match timeout(limit, self.client.get_multiplexed_async_connection()).await {
            Ok(result) => result.map_err(InfrastructureError::Cache),
            Err(_) => Err(InfrastructureError::Timeout(format!(
                "Redis connect exceeded {}s",
                limit.as_secs()
            ))),
        }
    }

    /// PING the cached connection; reconnect when it is missing or broken
    async fn health_check(&self) {
        let connection = self.connection.read().await.clone();

        let healthy = match connection {
            Some(mut connection) => {
                let limit = Duration::from_secs(self.config.response_timeout.max(1));
                let ping_cmd = redis::cmd("PING");
                let ping = ping_cmd.query_async::<_, String>(&mut connection);
                matches!(timeout(limit, ping).await, Ok(Ok(ref pong)) if pong == "PONG")
            }
            None => false,
        };

        if healthy {
            debug!("Redis health check passed");
            self.state.mark_available();
            return;
        }

        self.connection.write().await.take();
        self.state.mark_degraded("health check failed");
        self.reconnect().await;
    }
}

#[async_trait]
impl PrimaryStore for RedisPrimaryStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.run("GET", key, |mut conn| async move {
            conn.get::<_, Option<String>>(key).await
        })
        .await
        .flatten()
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl_seconds: u64) -> StoreWrite {
        let stored = self
            .run("SET", key, |mut conn| async move {
                redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .arg("EX")
                    .arg(ttl_seconds.max(1))
                    .query_async::<_, ()>(&mut conn)
                    .await
            })
            .await;

        match stored {
            Some(()) => StoreWrite::Stored,
            None => StoreWrite::Failed,
        }
    }

    async fn set_if_absent_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> StoreClaim {
        let reply = self
            .run("SET NX", key, |mut conn| async move {
                redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .arg("NX")
                    .arg("EX")
                    .arg(ttl_seconds.max(1))
                    .query_async::<_, Option<String>>(&mut conn)
                    .await
            })
            .await;

        match reply {
            Some(Some(_)) => StoreClaim::Claimed,
            Some(None) => StoreClaim::Occupied,
            None => StoreClaim::Failed,
        }
    }

    async fn ttl(&self, key: &str) -> i64 {
        let ttl = self
            .run("TTL", key, |mut conn| async move {
                conn.ttl::<_, i64>(key).await
            })
            .await;

        match ttl {
            Some(seconds) if seconds >= 0 => seconds,
            Some(-2) => -2,
            _ => -1,
        }
    }

    async fn delete(&self, key: &str) {
        let deleted = self
            .run("DEL", key, |mut conn| async move {
                conn.del::<_, u32>(key).await
            })
            .await;

        if deleted.is_none() {
            debug!(key, "Best-effort delete did not reach Redis");
        }
    }

    async fn increment_with_expiry(&self, key: &str, ttl_seconds: u64) -> Option<i64> {
        self.run("INCR", key, |mut conn| async move {
            let count: i64 = conn.incr(key, 1).await?;

            // Set expiry on the first increment only
            if count == 1 {
                redis::cmd("EXPIRE")
                    .arg(key)
                    .arg(ttl_seconds.max(1))
                    .query_async::<_, ()>(&mut conn)
                    .await?;
            }

            Ok(count)
        })
        .await
    }

    fn backend_state(&self) -> &StorageBackendState {
        &self.inner.state
    }
}

/// Whether a Redis error means the connection itself is unusable
pub(crate) fn is_connection_error(error: &RedisError) -> bool {
    error.is_io_error()
        || error.is_connection_dropped()
        || error.is_connection_refusal()
        || error.is_timeout()
        || matches!(error.kind(), ErrorKind::BusyLoadingError | ErrorKind::TryAgain)
}

/// Mask credentials in a Redis URL for logging
pub fn mask_url(url: &str) -> String {
    if let (Some(at_pos), Some(proto_end)) = (url.rfind('@'), url.find("://")) {
        if at_pos > proto_end {
            return format!("{}****{}", &url[..proto_end + 3], &url[at_pos..]);
        }
    }
    url.to_string()
}
