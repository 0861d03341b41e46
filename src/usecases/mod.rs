//! Application use cases. Orchestrate domain logic via ports.

pub mod comparables_service;
pub mod valuation_service;

pub use comparables_service::{ComparablesRun, ComparablesService};
pub use valuation_service::{ValuationRequest, ValuationResponse, ValuationService};
