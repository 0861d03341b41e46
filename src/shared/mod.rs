//! Cross-cutting configuration shared by adapters and wiring.

pub mod config;
