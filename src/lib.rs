//! healthval: Healthcare startup valuation (DCF, comparables, VC method), hexagonal layout.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
