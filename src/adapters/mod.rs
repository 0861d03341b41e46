//! Infrastructure adapters. Implement ports.
//!
//! Market data over HTTP, CSV export, terminal UI. Map errors to DomainError.

pub mod export;
pub mod market_data;
pub mod ui;
