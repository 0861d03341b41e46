//! Market data adapters. Implement MarketDataPort.
//!
//! Live Yahoo Finance source, built-in reference multiples, and a TTL cache decorator.

pub mod cache;
pub mod reference_adapter;
pub mod yahoo_adapter;

pub use cache::CachedMarketData;
pub use reference_adapter::ReferenceMarketData;
pub use yahoo_adapter::YahooMarketData;
