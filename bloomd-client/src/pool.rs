//! # Connection Pool
//!
//! Purpose: Reuse daemon connections across calls while bounding the number
//! of live sockets.
//!
//! ## Design Principles
//! 1. **Object Pool Pattern**: Keep a bounded set of reusable connections.
//! 2. **Minimal Locking**: Hold the mutex only while moving idle connections;
//!    dialing happens outside the lock on a reserved slot.
//! 3. **Blocking Checkout**: At capacity, `acquire` waits on a condition
//!    variable until a slot frees up or the wait elapses.
//! 4. **RAII Return**: `PooledConnection` goes back to the pool on drop, or
//!    is discarded when it was marked unusable.

use std::collections::VecDeque;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::transport::{Connection, Duplex};

/// Opens new byte streams to the daemon.
///
/// `TcpDialer` is the production implementation; tests plug in in-memory
/// streams.
pub trait Dialer: Send + Sync + 'static {
    fn dial(&self) -> ClientResult<Box<dyn Duplex>>;
}

/// Dials the daemon over TCP.
#[derive(Debug, Clone)]
pub struct TcpDialer {
    addr: String,
    connect_timeout: Duration,
    io_timeout: Duration,
}

impl TcpDialer {
    /// `io_timeout` bounds every blocking read and write on the socket.
    pub fn new(addr: impl Into<String>, connect_timeout: Duration, io_timeout: Duration) -> Self {
        TcpDialer {
            addr: addr.into(),
            connect_timeout,
            io_timeout,
        }
    }

    fn connect(&self) -> ClientResult<TcpStream> {
        let addrs = self
            .addr
            .to_socket_addrs()
            .map_err(|_| ClientError::InvalidAddress(self.addr.clone()))?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(err) => last_err = Some(err),
            }
        }
        match last_err {
            Some(err) => Err(ClientError::Io(err)),
            None => Err(ClientError::InvalidAddress(self.addr.clone())),
        }
    }
}

impl Dialer for TcpDialer {
    fn dial(&self) -> ClientResult<Box<dyn Duplex>> {
        let stream = self.connect()?;
        stream.set_read_timeout(Some(self.io_timeout))?;
        stream.set_write_timeout(Some(self.io_timeout))?;
        // Disable Nagle to keep request latency low for small payloads.
        stream.set_nodelay(true)?;
        Ok(Box::new(stream))
    }
}

/// Pool sizing.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Connections dialed up front.
    pub initial_connections: usize,
    /// Maximum live connections (idle + in use).
    pub max_connections: usize,
}

/// Point-in-time pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub idle: usize,
    pub live: usize,
    pub max: usize,
}

struct PoolState {
    idle: VecDeque<Connection>,
    live: usize,
    closed: bool,
}

struct PoolInner {
    dialer: Box<dyn Dialer>,
    max_connections: usize,
    state: Mutex<PoolState>,
    available: Condvar,
}

/// Connection pool handle.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Creates the pool and dials the initial connections.
    ///
    /// Fails if any initial connection cannot be established.
    pub fn new(config: PoolConfig, dialer: Box<dyn Dialer>) -> ClientResult<Self> {
        let warm = config.initial_connections.min(config.max_connections);
        let mut idle = VecDeque::with_capacity(config.max_connections);
        for _ in 0..warm {
            idle.push_back(Connection::new(dialer.dial()?));
        }
        info!(
            initial = warm,
            max = config.max_connections,
            "bloomd connection pool ready"
        );

        Ok(ConnectionPool {
            inner: Arc::new(PoolInner {
                dialer,
                max_connections: config.max_connections,
                state: Mutex::new(PoolState {
                    idle,
                    live: warm,
                    closed: false,
                }),
                available: Condvar::new(),
            }),
        })
    }

    /// Checks out a connection, waiting up to `wait` when at capacity.
    pub fn acquire(&self, wait: Duration) -> ClientResult<PooledConnection> {
        let deadline = Instant::now() + wait;
        let mut state = self.inner.state.lock();
        loop {
            if state.closed {
                return Err(ClientError::PoolClosed);
            }
            if let Some(conn) = state.idle.pop_front() {
                return Ok(PooledConnection::new(self.inner.clone(), conn));
            }
            if state.live < self.inner.max_connections {
                state.live += 1;
                drop(state);
                return self.dial_reserved();
            }
            if self.inner.available.wait_until(&mut state, deadline).timed_out() {
                return Err(ClientError::PoolExhausted {
                    max: self.inner.max_connections,
                });
            }
        }
    }

    /// Closes every idle connection and rejects further checkouts.
    ///
    /// Connections checked out at this point are closed when they come back.
    /// Calling this more than once is harmless.
    pub fn shutdown(&self) {
        let mut state = self.inner.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        let dropped = state.idle.len();
        state.idle.clear();
        state.live = state.live.saturating_sub(dropped);
        self.inner.available.notify_all();
        info!(closed = dropped, in_use = state.live, "bloomd connection pool shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.inner.state.lock();
        PoolStats {
            idle: state.idle.len(),
            live: state.live,
            max: self.inner.max_connections,
        }
    }

    fn dial_reserved(&self) -> ClientResult<PooledConnection> {
        match self.inner.dialer.dial() {
            Ok(stream) => {
                debug!("dialed new bloomd connection");
                Ok(PooledConnection::new(self.inner.clone(), Connection::new(stream)))
            }
            Err(err) => {
                self.inner.release_slot();
                Err(err)
            }
        }
    }
}

impl PoolInner {
    fn release_slot(&self) {
        let mut state = self.state.lock();
        state.live = state.live.saturating_sub(1);
        self.available.notify_one();
    }

    fn return_connection(&self, conn: Connection) {
        let mut state = self.state.lock();
        if state.closed {
            state.live = state.live.saturating_sub(1);
        } else {
            state.idle.push_back(conn);
        }
        self.available.notify_one();
    }
}

/// RAII wrapper returning a connection to the pool on drop.
pub struct PooledConnection {
    pool: Arc<PoolInner>,
    conn: Option<Connection>,
    valid: bool,
}

impl PooledConnection {
    fn new(pool: Arc<PoolInner>, conn: Connection) -> Self {
        PooledConnection {
            pool,
            conn: Some(conn),
            valid: true,
        }
    }

    /// Sends one command and reads its response.
    ///
    /// Any failure leaves the socket in an unknown state, so the connection
    /// is discarded instead of returned.
    pub fn roundtrip(&mut self, line: &str, max_attempts: usize) -> ClientResult<String> {
        let conn = match self.conn.as_mut() {
            Some(conn) => conn,
            None => return Err(ClientError::ConnectionClosed),
        };
        let response = conn.roundtrip(line, max_attempts);
        if response.is_err() {
            self.valid = false;
        }
        response
    }

    /// Discard this connection instead of returning it to the pool.
    pub fn mark_unusable(&mut self) {
        self.valid = false;
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => return,
        };

        if self.valid {
            self.pool.return_connection(conn);
        } else {
            warn!("discarding bloomd connection");
            drop(conn);
            self.pool.release_slot();
        }
    }
}
