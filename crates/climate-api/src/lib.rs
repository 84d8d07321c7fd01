//! Climate Query Service
//!
//! Read-only HTTP API over a pre-populated SQLite weather-observation
//! dataset (`measurement` + `station` tables).

pub mod http_server;
pub mod store;
pub mod window;

pub use http_server::{create_router, run_http_server};
pub use store::{ClimateStore, StoreError};
