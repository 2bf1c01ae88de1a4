//! # bloomd Client
//!
//! Purpose: Drive a remote bloomd daemon over its line-oriented TCP protocol,
//! with connection pooling, bounded write retry and per-call timeouts.
//!
//! ## Design Principles
//! 1. **Object Pool Pattern**: Reuse TCP connections to avoid repeated connects.
//! 2. **Protocol Clarity**: Encode commands and parse replies explicitly,
//!    one function per reply grammar.
//! 3. **Typed Failures**: Daemon status strings become distinct error kinds.
//! 4. **Bounded Everything**: Pool size, write attempts and call duration all
//!    have explicit limits.
//!
//! ## Quick Start
//!
//! ```ignore
//! use bloomd_client::{BloomdApi, BloomdClient};
//!
//! let client = BloomdClient::connect("127.0.0.1:8673")?;
//! client.create("users").await?;
//! client.set("users", "alice").await?;
//! assert!(client.check("users", "alice").await?);
//! ```

mod client;
mod command;
mod config;
mod error;
mod pool;
mod response;
mod transport;

pub use bloomd_common::{BloomFilter, VerboseBloomFilter, Verb};
pub use client::{BloomdApi, BloomdClient};
pub use command::hash_key;
pub use config::{
    ClientConfig, ClientConfigBuilder, DEFAULT_INITIAL_CONNECTIONS, DEFAULT_MAX_CONNECTIONS,
    DEFAULT_MAX_SEND_ATTEMPTS, DEFAULT_TIMEOUT,
};
pub use error::{ClientError, ClientResult};
pub use pool::{Dialer, PoolStats, TcpDialer};
pub use transport::Duplex;
