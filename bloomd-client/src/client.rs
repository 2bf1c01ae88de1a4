//! # Async Client API
//!
//! Purpose: Expose the bloomd operation set over a pooled, line-oriented
//! TCP connection.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: `BloomdClient` hides pooling, framing and parsing.
//! 2. **Blocking Core, Async Edge**: Each call runs acquire → send → receive
//!    on tokio's blocking pool and races it against the configured timeout.
//! 3. **Discard on Doubt**: A call that times out or is dropped by the caller
//!    never returns its connection to the pool.
//! 4. **Fail Fast**: Invalid arguments are rejected before any network I/O.
//!
//! ## Cancellation
//!
//! Dropping a call's future (for example under an outer
//! `tokio::time::timeout` or `select!`) stops the wait. The socket read or
//! write already in progress still runs to completion or to the socket
//! timeout (twice the call timeout), after which the connection is
//! discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use bloomd_common::{BloomFilter, VerboseBloomFilter, Verb};

use crate::command::{CommandEncoder, CreateParams};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::pool::{ConnectionPool, Dialer, PoolConfig, PoolStats, TcpDialer};
use crate::response;

/// Operations offered by a bloomd daemon.
#[async_trait]
pub trait BloomdApi: Send + Sync {
    /// Creates a filter with daemon defaults. An existing filter is not an error.
    async fn create(&self, name: &str) -> ClientResult<()>;

    /// Creates a filter; zero `capacity` / `probability` use daemon defaults.
    ///
    /// A positive probability without a positive capacity is rejected.
    async fn create_with_params(
        &self,
        name: &str,
        capacity: u64,
        probability: f64,
        in_memory: bool,
    ) -> ClientResult<()>;

    /// Adds a key. Returns true when the key was not present before.
    async fn set(&self, name: &str, key: &str) -> ClientResult<bool>;

    /// Tests a key.
    async fn check(&self, name: &str, key: &str) -> ClientResult<bool>;

    /// Adds several keys; results follow key order.
    async fn bulk(&self, name: &str, keys: &[&str]) -> ClientResult<Vec<bool>>;

    /// Tests several keys; results follow key order.
    async fn multi(&self, name: &str, keys: &[&str]) -> ClientResult<Vec<bool>>;

    async fn info(&self, name: &str) -> ClientResult<VerboseBloomFilter>;

    async fn list(&self) -> ClientResult<Vec<BloomFilter>>;

    /// Lists filters whose name starts with `prefix`.
    async fn list_prefix(&self, prefix: &str) -> ClientResult<Vec<BloomFilter>>;

    /// Permanently deletes a filter. A missing filter is not an error.
    async fn drop_filter(&self, name: &str) -> ClientResult<()>;

    /// Removes a closed filter from the daemon's management.
    async fn clear(&self, name: &str) -> ClientResult<()>;

    /// Unloads a filter from memory, keeping it on disk.
    async fn close(&self, name: &str) -> ClientResult<()>;

    /// Flushes every filter to disk.
    async fn flush(&self) -> ClientResult<()>;

    async fn flush_filter(&self, name: &str) -> ClientResult<()>;

    /// Liveness check, answered by a `list` round trip.
    async fn ping(&self) -> ClientResult<()>;

    /// Closes the pool. Later calls fail with `ClientError::PoolClosed`.
    fn shutdown(&self);
}

/// Pooled bloomd client.
///
/// Each call checks out one connection, executes one command, and returns
/// the connection to the pool.
pub struct BloomdClient {
    pool: ConnectionPool,
    encoder: CommandEncoder,
    config: ClientConfig,
}

impl BloomdClient {
    /// Creates a client with default configuration.
    pub fn connect(addr: impl Into<String>) -> ClientResult<Self> {
        let config = ClientConfig {
            addr: addr.into(),
            ..ClientConfig::default()
        };
        Self::with_config(config)
    }

    /// Creates a client over TCP. Dials the initial connections before
    /// returning.
    pub fn with_config(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let dialer = TcpDialer::new(
            config.addr.clone(),
            config.dial_timeout(),
            config.io_timeout(),
        );
        Self::with_dialer(config, Box::new(dialer))
    }

    /// Creates a client over a custom transport.
    pub fn with_dialer(config: ClientConfig, dialer: Box<dyn Dialer>) -> ClientResult<Self> {
        config.validate()?;
        let pool = ConnectionPool::new(
            PoolConfig {
                initial_connections: config.initial_connections,
                max_connections: config.max_connections,
            },
            dialer,
        )?;
        Ok(BloomdClient {
            pool,
            encoder: CommandEncoder::new(config.hash_keys),
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn is_shutdown(&self) -> bool {
        self.pool.is_closed()
    }

    /// Runs one command under the per-call deadline and returns the raw reply.
    async fn dispatch(&self, verb: Verb, line: String) -> ClientResult<String> {
        let pool = self.pool.clone();
        let timeout = self.config.timeout;
        let attempts = self.config.max_send_attempts;
        let guard = AbandonGuard::new();
        let abandoned = guard.flag();
        let started = Instant::now();

        let work = tokio::task::spawn_blocking(move || {
            let remaining = timeout.saturating_sub(started.elapsed());
            let mut conn = pool.acquire(remaining)?;
            // The caller stopped waiting while this call was queued.
            if abandoned.load(Ordering::Acquire) {
                return Err(ClientError::Timeout {
                    verb,
                    after: started.elapsed(),
                });
            }
            let response = conn.roundtrip(&line, attempts);
            if abandoned.load(Ordering::Acquire) {
                conn.mark_unusable();
            }
            response
        });

        let result = match tokio::time::timeout(timeout, work).await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => Err(ClientError::Task(err.to_string())),
            Err(_) => {
                warn!(%verb, ?timeout, "bloomd call timed out");
                return Err(ClientError::Timeout {
                    verb,
                    after: timeout,
                });
            }
        };
        guard.disarm();

        debug!(
            %verb,
            elapsed_us = started.elapsed().as_micros() as u64,
            ok = result.is_ok(),
            "bloomd call finished"
        );
        result
    }

    /// Sends a confirmation-style command and applies the verb's idempotency.
    async fn dispatch_for_confirmation(&self, verb: Verb, line: String) -> ClientResult<()> {
        let resp = self.dispatch(verb, line).await?;
        match verb {
            Verb::Drop => response::parse_drop_confirmation(&resp),
            Verb::Create => response::parse_create_confirmation(&resp),
            _ => response::parse_confirmation(verb, &resp),
        }
    }

    async fn dispatch_for_bool(&self, verb: Verb, name: &str, key: &str) -> ClientResult<bool> {
        let line = self.encoder.key_command(verb, name, key)?;
        let resp = self.dispatch(verb, line).await?;
        response::parse_bool(verb, &resp)
    }

    async fn dispatch_for_bool_list(
        &self,
        verb: Verb,
        name: &str,
        keys: &[&str],
    ) -> ClientResult<Vec<bool>> {
        let line = self.encoder.keys_command(verb, name, keys)?;
        let resp = self.dispatch(verb, line).await?;
        response::parse_bool_list(verb, keys.len(), &resp)
    }

    async fn list_filters(&self, prefix: Option<&str>) -> ClientResult<Vec<BloomFilter>> {
        let line = self.encoder.list(prefix)?;
        let resp = self.dispatch(Verb::List, line).await?;
        response::parse_filter_list(&resp)
    }
}

#[async_trait]
impl BloomdApi for BloomdClient {
    async fn create(&self, name: &str) -> ClientResult<()> {
        self.create_with_params(name, 0, 0.0, false).await
    }

    async fn create_with_params(
        &self,
        name: &str,
        capacity: u64,
        probability: f64,
        in_memory: bool,
    ) -> ClientResult<()> {
        let params = CreateParams {
            capacity,
            probability,
            in_memory,
        };
        let line = self.encoder.create(name, &params)?;
        self.dispatch_for_confirmation(Verb::Create, line).await
    }

    async fn set(&self, name: &str, key: &str) -> ClientResult<bool> {
        self.dispatch_for_bool(Verb::Set, name, key).await
    }

    async fn check(&self, name: &str, key: &str) -> ClientResult<bool> {
        self.dispatch_for_bool(Verb::Check, name, key).await
    }

    async fn bulk(&self, name: &str, keys: &[&str]) -> ClientResult<Vec<bool>> {
        self.dispatch_for_bool_list(Verb::Bulk, name, keys).await
    }

    async fn multi(&self, name: &str, keys: &[&str]) -> ClientResult<Vec<bool>> {
        self.dispatch_for_bool_list(Verb::Multi, name, keys).await
    }

    async fn info(&self, name: &str) -> ClientResult<VerboseBloomFilter> {
        let line = self.encoder.filter_command(Verb::Info, name)?;
        let resp = self.dispatch(Verb::Info, line).await?;
        response::parse_info(name, &resp)
    }

    async fn list(&self) -> ClientResult<Vec<BloomFilter>> {
        self.list_filters(None).await
    }

    async fn list_prefix(&self, prefix: &str) -> ClientResult<Vec<BloomFilter>> {
        self.list_filters(Some(prefix)).await
    }

    async fn drop_filter(&self, name: &str) -> ClientResult<()> {
        let line = self.encoder.filter_command(Verb::Drop, name)?;
        self.dispatch_for_confirmation(Verb::Drop, line).await
    }

    async fn clear(&self, name: &str) -> ClientResult<()> {
        let line = self.encoder.filter_command(Verb::Clear, name)?;
        self.dispatch_for_confirmation(Verb::Clear, line).await
    }

    async fn close(&self, name: &str) -> ClientResult<()> {
        let line = self.encoder.filter_command(Verb::Close, name)?;
        self.dispatch_for_confirmation(Verb::Close, line).await
    }

    async fn flush(&self) -> ClientResult<()> {
        let line = self.encoder.flush(None)?;
        self.dispatch_for_confirmation(Verb::Flush, line).await
    }

    async fn flush_filter(&self, name: &str) -> ClientResult<()> {
        let line = self.encoder.flush(Some(name))?;
        self.dispatch_for_confirmation(Verb::Flush, line).await
    }

    async fn ping(&self) -> ClientResult<()> {
        self.list_filters(None).await.map(|_| ())
    }

    fn shutdown(&self) {
        self.pool.shutdown();
    }
}

/// Flags a dispatch as abandoned unless disarmed after a completed reply.
struct AbandonGuard {
    flag: Arc<AtomicBool>,
    armed: bool,
}

impl AbandonGuard {
    fn new() -> Self {
        AbandonGuard {
            flag: Arc::new(AtomicBool::new(false)),
            armed: true,
        }
    }

    fn flag(&self) -> Arc<AtomicBool> {
        self.flag.clone()
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        if self.armed {
            self.flag.store(true, Ordering::Release);
        }
    }
}
