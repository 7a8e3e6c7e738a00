//! # HDO Tariffs - tariff window service with a daily file cache
//!
//! Serves electricity tariff time-windows (low/high tariff switching as
//! signalled by HDO ripple control) over HTTP. Windows are produced by an
//! external fetch process and cached on disk per command, day and horizon so
//! the slow process runs at most once per key and calendar day.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `tariff`: Tariff record parsing and timestamp normalization
//! - `fetcher`: External fetch process invocation
//! - `cache`: Day-bucketed file cache in front of the fetcher
//! - `web`: HTTP server and request handling

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod tariff;
pub mod web;

// Re-export commonly used types
pub use cache::{CacheKey, TariffCache};
pub use config::Config;
pub use error::{HdoError, Result};
pub use fetcher::{ProcessFetcher, TariffFetcher};
pub use tariff::{TariffRecord, UnixTariffRecord};
