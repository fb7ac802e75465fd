//! Client for a TSDB server speaking the `api/v1` HTTP interface.
//!
//! ```no_run
//! use tsdb_client::{ClientConfig, QueryOptions, TsdbClient, WriteOptions};
//!
//! # async fn run() -> tsdb_client::Result<()> {
//! let client = TsdbClient::new(ClientConfig::new("localhost", 4080))?;
//! client.write("cpu.load", 0.75, &WriteOptions::default()).await?;
//! let points = client.query("cpu.load", &QueryOptions::default().limit(10)).await?;
//! println!("{} -> {}", client.count("cpu.load").await?, points);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;

pub use client::{Operation, TsdbClient};
pub use config::ClientConfig;
pub use error::{ErrorKind, Result, TsdbError};
pub use models::{Envelope, Order, Point, QueryOptions, WriteOptions};
